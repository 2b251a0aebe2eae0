//! # Render
//!
//! [`render`] runs the pipeline over the current state and builds both views.
//! It is the only place the re-fit decision is taken and the only place new
//! region collapse flags are recorded.

use aquatrack::prelude::*;
use serde::Serialize;

use crate::{
    list::ListView,
    map::MapView,
    pipeline::Pipeline,
    state::{ViewQuery, ViewState},
};

/// Items shown after filtering, and items loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub shown: usize,
    pub total: usize,
}

/// Everything a user interface needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub list: ListView,
    pub map: MapView,
    pub progress: Option<Progress>,
    pub counts: Counts,
    /// "… でログイン中" while logged in
    pub session_label: Option<String>,
    #[serde(flatten)]
    pub query: ViewQuery,
}

/// Derives list and map views from the state.
///
/// `progress` and `session_label` are left empty; the session fills them in.
pub fn render(state: &mut ViewState, pipeline: &Pipeline) -> ViewModel {
    let fit = state.take_refit();
    let output = pipeline.run(&state.items, &state.query);
    let list = ListView::build(&output, &mut state.regions);
    let map = MapView::build(&output.items, fit);
    ViewModel {
        list,
        map,
        progress: None,
        counts: Counts {
            shown: output.items.len(),
            total: state.items.len(),
        },
        session_label: None,
        query: state.query.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        map::Viewport,
        state::{CategoryFilter, SortMode},
        test_items::{item, located},
    };

    fn loaded_state() -> ViewState {
        let mut state = ViewState::new();
        state.replace_items(vec![
            located(item(1, "おたる水族館", "北海道", false), 43.2298, 141.0203),
            located(item(2, "すみだ水族館", "東京都", true), 35.7101, 139.8107),
            located(item(3, "海遊館", "大阪府", false), 34.6545, 135.4290),
            item(4, "新江ノ島水族館", "神奈川県", true),
        ]);
        state
    }

    fn fits(view: &ViewModel) -> bool {
        matches!(view.map.viewport, Viewport::FitBounds { .. })
    }

    #[test]
    fn counts_and_markers() {
        let mut state = loaded_state();
        let pipeline = Pipeline::new();
        let view = render(&mut state, &pipeline);
        assert_eq!(view.counts, Counts { shown: 4, total: 4 });
        assert_eq!(view.map.markers.len(), 3, "item without coordinates has no marker");
        assert!(fits(&view), "first render fits");

        state.set_category(CategoryFilter::Visited);
        let view = render(&mut state, &pipeline);
        assert_eq!(view.counts, Counts { shown: 2, total: 4 });
        assert_eq!(view.map.markers.len(), 1);
        assert_eq!(view.query.category, CategoryFilter::Visited);
    }

    #[test]
    fn sort_and_collapse_changes_keep_viewport() {
        let mut state = loaded_state();
        let pipeline = Pipeline::new();
        assert!(fits(&render(&mut state, &pipeline)));

        state.set_sort(SortMode::ByName);
        let view = render(&mut state, &pipeline);
        assert!(!fits(&view));
        assert!(matches!(view.list, ListView::Flat(_)));

        state.set_sort(SortMode::ByDivision);
        state.regions_mut().toggle("関東");
        assert!(!fits(&render(&mut state, &pipeline)));

        state.set_search("すみだ");
        let view = render(&mut state, &pipeline);
        assert!(fits(&view));
        assert_eq!(view.map.markers.len(), 1);
    }

    #[test]
    fn render_records_new_regions_as_collapsed() {
        let mut state = loaded_state();
        render(&mut state, &Pipeline::new());
        let mut known: Vec<_> = state.regions().known().collect();
        known.sort();
        assert_eq!(known, vec![("北海道", true), ("近畿", true), ("関東", true)]);
    }

    #[test]
    fn serializes_query_inline() {
        let mut state = loaded_state();
        let view = render(&mut state, &Pipeline::new());
        let json = serde_json::to_value(&view).expect("serialize");
        assert_eq!(json["sort"], "division");
        assert_eq!(json["category"], "all");
        assert_eq!(json["counts"]["shown"], 4);
        assert_eq!(json["map"]["viewport"]["command"], "fit_bounds");
    }
}
