/*
 * aquatrack - aquarium visit tracker api client
 *
 * SPDX-FileCopyrightText: 2025-2026 Steve Schoettler
 * SPDX-License-Identifier: Apache-2.0
 */
//! # Aquatrack API Client
//!
//! A typed client for the aquarium visit tracker API.
//!
//! ## Features
//!
//! - item collection, statistics, and session endpoints
//! - visited / note mutations keyed by item id
//! - cookie-based session credentials
//! - http pipeline with logging, error mapping, and metrics
//! - parameter validation
//! - in-process mock server for tests (feature `mock`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aquatrack::prelude::*;
//! # async fn example() -> Result<(), TrackerError> {
//!
//! let config = ClientConfig::default().session_cookie("my-session-cookie");
//! let client = TrackerClient::with_config(config)?;
//!
//! let session = client.session().get().await?;
//! if !session.logged_in {
//!     println!("Not logged in.");
//!     return Ok(());
//! }
//!
//! let items = client.items().list().await?;
//! for item in &items {
//!     println!("{} {}", item.prefecture, item.name);
//! }
//!
//! let stats = client.stats().get().await?;
//! println!("{}", stats.progress().label());
//!
//! // Mark the first item visited, and attach a note
//! if let Some(first) = items.first() {
//!     client.item(&first.id).set_visited(true).await?;
//!     client.item(&first.id).set_note("混雑注意").await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API Structure
//!
//! Methods on `TrackerClient` return request builders that are executed with a
//! terminal method: `client.items().list()`, `client.item(id).set_visited(..)`,
//! `client.item(id).set_note(..)`, `client.stats().get()`, `client.session().get()`.
//!
#![allow(clippy::missing_errors_doc)] // pedantic
#![allow(clippy::missing_const_for_fn)] //  nursery function
#![allow(clippy::must_use_candidate)] // pedantic
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::needless_raw_strings)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unused_async)]

pub mod client;
pub mod error;
mod http_client;
pub mod items;
#[cfg(feature = "mock")]
#[doc(hidden)]
pub mod mock;
pub mod session;
pub mod stats;
pub mod validation;

#[cfg(feature = "mock")]
pub mod test_util;

/// Result type alias using `TrackerError` as the default error.
pub type Result<T, E = crate::error::TrackerError> = std::result::Result<T, E>;

/// Prelude module - import the common types with `use aquatrack::prelude::*;`
pub mod prelude {
    pub use super::AQUATRACK_DEFAULT_URL;
    pub use crate::error::*;
    pub use crate::{
        client::{ClientConfig, Health, TrackerClient},
        http_client::HttpMetricsSnapshot,
        items::{ItemId, LatLng, LocationItem, VisitRecord},
        session::SessionInfo,
        stats::{Progress, Stats},
        validation::ValidationLimits,
    };
}

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default API endpoint (local development server)
pub const AQUATRACK_DEFAULT_URL: &str = "http://127.0.0.1:8000";

pub(crate) mod config {
    /// Environment variable for default endpoint URL
    pub const AQUATRACK_URL_ENV: &str = "AQUATRACK_URL";

    /// Environment variable holding the session cookie value
    pub const AQUATRACK_SESSION_ENV: &str = "AQUATRACK_SESSION";

    /// Name of the server's session cookie
    pub const SESSION_COOKIE_NAME: &str = "session";

    /// Max length of a note in bytes
    pub const VALIDATION_NOTE_MAX_LEN: u64 = 10_000;

    /// Max length of an item id in bytes
    pub const VALIDATION_ID_MAX_LEN: u64 = 200;

    /// Max size of a json request body in bytes
    pub const VALIDATION_BODY_MAX_LEN: u64 = 64 * 1024;
}

// =============================================================================
// Macros
// =============================================================================

/// Assert helper that returns a TestError instead of panicking
#[doc(hidden)]
#[macro_export]
macro_rules! test_assert {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::test_util::TestError::Assertion {
                message: $msg.to_string(),
            });
        }
    };
}

/// Assert equality helper
#[doc(hidden)]
#[macro_export]
macro_rules! test_assert_eq {
    ($left:expr, $right:expr, $msg:expr) => {
        if $left != $right {
            return Err($crate::test_util::TestError::Assertion {
                message: format!("{}: expected {:?}, got {:?}", $msg, $right, $left),
            });
        }
    };
}
