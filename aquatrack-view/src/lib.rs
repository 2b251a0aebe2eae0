/*
 * aquatrack-view - view-state engine for the aquarium visit tracker
 *
 * SPDX-FileCopyrightText: 2025-2026 Steve Schoettler
 * SPDX-License-Identifier: Apache-2.0
 */
//! # Aquatrack view engine
//!
//! Turns the item collection fetched by [`aquatrack`] into something a user
//! interface can draw: a filtered, sorted, region-grouped list and a set of map
//! markers, plus the decision of whether the map viewport should re-fit.
//!
//! - [`state::ViewState`] - the single mutable view state (filters, sort, region collapse flags)
//! - [`pipeline::Pipeline`] - filter → sort → group, a pure function of items and the view query
//! - [`list::ListView`] - region sections and item cards
//! - [`map::MapView`] / [`map::MapSynchronizer`] - markers and viewport commands for a [`map::MapWidget`]
//! - [`render::render`] - state in, [`render::ViewModel`] out
//! - [`session::Session`] - owns the state and routes every change through a named handler
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aquatrack::prelude::*;
//! use aquatrack_view::prelude::*;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TrackerClient::with_config(ClientConfig::default().session_cookie("..."))?;
//! let mut session = Session::new(client, MarkerLayer::default(), MapConfig::default());
//!
//! let view = session.start().await?;
//! println!("{} / {} shown", view.counts.shown, view.counts.total);
//!
//! let view = session.set_category(CategoryFilter::Unvisited);
//! if let ListView::Grouped(sections) = &view.list {
//!     for section in sections {
//!         println!("{}", section.header.label);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
#![allow(clippy::missing_errors_doc)] // pedantic
#![allow(clippy::must_use_candidate)] // pedantic
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::uninlined_format_args)]

pub mod api;
pub mod collate;
pub mod error;
pub mod geography;
pub mod list;
pub mod map;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod state;

/// Prelude module - import the common types with `use aquatrack_view::prelude::*;`
pub mod prelude {
    pub use crate::{
        api::TrackerApi,
        collate::NameCollator,
        error::SessionError,
        geography::{DivisionRank, UNCLASSIFIED_REGION, division_rank, region_of},
        list::{CardAction, CardLink, ItemCard, ListView, NoteField, RegionHeader, RegionSection},
        map::{
            Bounds, ClusterOptions, MapConfig, MapSynchronizer, MapView, MapWidget, Marker,
            MarkerIcon, MarkerLayer, TileLayer, Viewport,
        },
        pipeline::{Grouping, Pipeline, PipelineOutput, RegionGroup},
        render::{Counts, ViewModel, render},
        session::Session,
        state::{CategoryFilter, FilterFingerprint, RegionStates, SortMode, ViewQuery, ViewState},
    };
}
