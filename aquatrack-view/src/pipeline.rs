//! # Filter → sort → group
//!
//! [`Pipeline::run`] is a pure function of the item collection and the
//! [`ViewQuery`]. It produces the flat filtered sequence (used for the map) and,
//! when sorting by division, the same sequence partitioned into regions.
//!
//! 1. match: keep items whose composite text contains the search text (case-insensitive)
//! 2. filter: division filter (division sort only) and category filter
//! 3. sort: by name, or by prefecture rank then name; ties broken by id
//! 4. group: by region, in region order; empty regions are omitted

use std::{cmp::Ordering, collections::HashMap};

use aquatrack::prelude::*;
use serde::Serialize;

use crate::{
    collate::NameCollator,
    geography::{division_rank, region_of, regions},
    state::{SortMode, ViewQuery},
};

#[derive(Debug, Default)]
pub struct Pipeline {
    collator: NameCollator,
}

/// Items of one region, in list order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionGroup<'a> {
    pub region: &'static str,
    pub items: Vec<&'a LocationItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Grouping<'a> {
    /// Sorted by name: one sequence, no sections
    Flat,
    Regions(Vec<RegionGroup<'a>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput<'a> {
    /// Filtered and sorted items
    pub items: Vec<&'a LocationItem>,
    pub groups: Grouping<'a>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collator(collator: NameCollator) -> Self {
        Self { collator }
    }

    pub fn collator(&self) -> &NameCollator {
        &self.collator
    }

    pub fn run<'a>(&self, items: &'a [LocationItem], query: &ViewQuery) -> PipelineOutput<'a> {
        let needle = query.search.to_lowercase();
        let division = match query.sort {
            SortMode::ByDivision => query.division_filter.as_deref(),
            SortMode::ByName => None,
        };

        let mut selected: Vec<&LocationItem> = items
            .iter()
            .filter(|item| needle.is_empty() || search_text(item).contains(&needle))
            .filter(|item| division.is_none_or(|d| item.prefecture == d))
            .filter(|item| query.category.matches(item))
            .collect();

        selected.sort_by(|a, b| self.compare(query.sort, a, b));

        let groups = match query.sort {
            SortMode::ByName => Grouping::Flat,
            SortMode::ByDivision => Grouping::Regions(group_by_region(&selected)),
        };
        PipelineOutput {
            items: selected,
            groups,
        }
    }

    fn compare(&self, sort: SortMode, a: &LocationItem, b: &LocationItem) -> Ordering {
        let by_rank = match sort {
            SortMode::ByName => Ordering::Equal,
            SortMode::ByDivision => division_rank(&a.prefecture).cmp(&division_rank(&b.prefecture)),
        };
        by_rank
            .then_with(|| self.collator.compare(&a.name, &b.name))
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Distinct non-empty prefectures of `items`, in collation order
    pub fn division_options(&self, items: &[LocationItem]) -> Vec<String> {
        let mut options: Vec<String> = items
            .iter()
            .map(|item| item.prefecture.as_str())
            .filter(|division| !division.is_empty())
            .map(str::to_string)
            .collect();
        options.sort_by(|a, b| self.collator.compare(a, b));
        options.dedup();
        options
    }
}

/// Lowercased "name prefecture city location" text the search is matched against
pub fn search_text(item: &LocationItem) -> String {
    format!(
        "{} {} {} {}",
        item.name, item.prefecture, item.city, item.location_raw
    )
    .to_lowercase()
}

fn group_by_region<'a>(sorted: &[&'a LocationItem]) -> Vec<RegionGroup<'a>> {
    let mut buckets: HashMap<&'static str, Vec<&'a LocationItem>> = HashMap::new();
    for &item in sorted {
        buckets
            .entry(region_of(&item.prefecture))
            .or_default()
            .push(item);
    }
    regions()
        .filter_map(|region| {
            buckets
                .remove(region)
                .map(|items| RegionGroup { region, items })
        })
        .collect()
}
