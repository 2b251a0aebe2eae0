//! # View state
//!
//! [`ViewState`] holds everything the views are derived from: the last fetched
//! item collection, the [`ViewQuery`] (category filter, division filter, search
//! text, sort mode), the per-region collapse flags, and the filter fingerprint
//! of the previous render.
//!
//! A [`Session`](crate::session::Session) owns the only instance and changes it
//! through named handlers; everything else reads it.

use std::collections::{HashMap, HashSet};

use aquatrack::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which items to show, by visit state
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CategoryFilter {
    #[default]
    All,
    Visited,
    Unvisited,
    Starred,
}

impl CategoryFilter {
    pub fn matches(self, item: &LocationItem) -> bool {
        match self {
            Self::All => true,
            Self::Visited => item.visited,
            Self::Unvisited => !item.visited,
            Self::Starred => item.starred,
        }
    }
}

/// List order. `ByDivision` also groups the list into region sections.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum SortMode {
    #[serde(rename = "name")]
    #[strum(serialize = "name")]
    ByName,
    #[default]
    #[serde(rename = "division")]
    #[strum(serialize = "division")]
    ByDivision,
}

/// The user's filter and sort choices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    pub category: CategoryFilter,

    /// Only applied when sorting by division. Kept (not cleared) while
    /// sorting by name, so it takes effect again on switching back.
    pub division_filter: Option<String>,

    /// Case-insensitive substring, matched against name, prefecture, city and location text
    pub search: String,

    pub sort: SortMode,
}

/// Filter identity of a query: category, division filter, search text.
/// Sort mode and collapse flags are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FilterFingerprint(String);

impl FilterFingerprint {
    pub fn of(query: &ViewQuery) -> Self {
        Self(format!(
            "{}|{}|{}",
            query.category,
            query.division_filter.as_deref().unwrap_or_default(),
            query.search
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Collapse flag per region. A region is collapsed until the user expands it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegionStates(HashMap<String, bool>);

impl RegionStates {
    /// Returns the region's collapse flag, recording `true` (collapsed) the
    /// first time the region is seen. An existing flag is never overwritten.
    pub fn get_or_insert_default(&mut self, region: &str) -> bool {
        *self.0.entry(region.to_string()).or_insert(true)
    }

    /// Read-only lookup. Regions not seen yet are reported as collapsed.
    pub fn is_collapsed(&self, region: &str) -> bool {
        self.0.get(region).copied().unwrap_or(true)
    }

    /// Flips the region's flag and returns the new value
    pub fn toggle(&mut self, region: &str) -> bool {
        let collapsed = self.0.entry(region.to_string()).or_insert(true);
        *collapsed = !*collapsed;
        *collapsed
    }

    pub fn set_collapsed(&mut self, region: &str, collapsed: bool) {
        self.0.insert(region.to_string(), collapsed);
    }

    /// Regions with a recorded flag
    pub fn known(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(region, collapsed)| (region.as_str(), *collapsed))
    }
}

/// The session's view state.
///
/// Fields are crate-visible so that rendering can borrow the items, the query,
/// and the region flags independently.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub(crate) items: Vec<LocationItem>,
    pub(crate) query: ViewQuery,
    pub(crate) regions: RegionStates,
    pub(crate) last_fingerprint: Option<FilterFingerprint>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last fetched items, in server order
    pub fn items(&self) -> &[LocationItem] {
        &self.items
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn regions(&self) -> &RegionStates {
        &self.regions
    }

    pub fn last_fingerprint(&self) -> Option<&FilterFingerprint> {
        self.last_fingerprint.as_ref()
    }

    /// Replaces the item collection.
    ///
    /// A division filter naming a prefecture that no longer occurs in the
    /// collection is dropped.
    pub fn replace_items(&mut self, items: Vec<LocationItem>) {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(&item.id) {
                warn!(id = %item.id, "duplicate item id in collection");
            }
        }
        if let Some(division) = &self.query.division_filter
            && !items.iter().any(|item| &item.prefecture == division)
        {
            debug!(%division, "division filter no longer matches any item; cleared");
            self.query.division_filter = None;
        }
        self.items = items;
    }

    pub(crate) fn set_category(&mut self, category: CategoryFilter) {
        self.query.category = category;
    }

    /// Sets the division filter; an empty name clears it
    pub(crate) fn set_division_filter(&mut self, division: Option<String>) {
        self.query.division_filter = division.filter(|d| !d.is_empty());
    }

    /// Sets the search text, trimmed
    pub(crate) fn set_search(&mut self, search: &str) {
        self.query.search = search.trim().to_string();
    }

    /// Sets the sort mode. The division filter is left in place.
    pub(crate) fn set_sort(&mut self, sort: SortMode) {
        self.query.sort = sort;
    }

    /// Replaces the whole query, normalized like the single-field setters
    pub(crate) fn set_query(&mut self, query: ViewQuery) {
        let ViewQuery {
            category,
            division_filter,
            search,
            sort,
        } = query;
        self.set_category(category);
        self.set_division_filter(division_filter);
        self.set_search(&search);
        self.set_sort(sort);
    }

    pub(crate) fn regions_mut(&mut self) -> &mut RegionStates {
        &mut self.regions
    }

    /// Filter identity of the current query
    pub fn fingerprint(&self) -> FilterFingerprint {
        FilterFingerprint::of(&self.query)
    }

    /// Returns true if the filter identity changed since the previous call,
    /// and records the current one. The first call always returns true.
    pub(crate) fn take_refit(&mut self) -> bool {
        let current = self.fingerprint();
        let fit = self.last_fingerprint.as_ref() != Some(&current);
        self.last_fingerprint = Some(current);
        fit
    }
}
