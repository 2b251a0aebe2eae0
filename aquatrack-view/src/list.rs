//! # List view
//!
//! Materializes pipeline output as cards. Sorting by division gives one
//! collapsible section per region with its visited/total count; sorting by name
//! gives a flat list of cards. Nothing is filtered or reordered here.

use aquatrack::prelude::*;
use serde::Serialize;

use crate::{
    pipeline::{Grouping, PipelineOutput},
    state::RegionStates,
};

pub const VISITED_STAMP: &str = "VISITED";
pub const MARK_VISITED_LABEL: &str = "行ったにする";
pub const UNMARK_VISITED_LABEL: &str = "行った✅（解除）";
pub const NOTE_PLACEHOLDER: &str = "メモ（例：混雑、推し、展示、感想）";
pub const LINK_LABEL: &str = "公式/紹介ページ";

const COLLAPSED_GLYPH: char = '▶';
const EXPANDED_GLYPH: char = '▼';

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListView {
    Grouped(Vec<RegionSection>),
    Flat(Vec<ItemCard>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSection {
    pub header: RegionHeader,
    /// Empty while the region is collapsed
    pub cards: Vec<ItemCard>,
}

/// Clickable section header; clicking toggles the region's collapse flag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionHeader {
    pub region: String,
    pub visited: usize,
    pub total: usize,
    pub collapsed: bool,
    pub glyph: char,
    /// e.g. "▶ 関東（1/3）"
    pub label: String,
}

/// Mutation wired to a card button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CardAction {
    /// Sets the item's visited flag to `visited`
    SetVisited {
        id: ItemId,
        visited: bool,
        label: String,
    },
}

/// Editable note; saving it issues a note update for `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteField {
    pub id: ItemId,
    pub text: String,
    pub placeholder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardLink {
    pub href: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCard {
    pub id: ItemId,
    pub title: String,
    /// "prefecture / city / location", empty parts left out
    pub meta: String,
    pub visited: bool,
    pub starred: bool,
    pub stamp: Option<String>,
    pub visit_action: CardAction,
    pub note: NoteField,
    pub link: Option<CardLink>,
}

impl ItemCard {
    pub fn new(item: &LocationItem) -> Self {
        let label = if item.visited {
            UNMARK_VISITED_LABEL
        } else {
            MARK_VISITED_LABEL
        };
        Self {
            id: item.id.clone(),
            title: item.name.clone(),
            meta: join_present(&[
                item.prefecture.as_str(),
                item.city.as_str(),
                item.location_raw.as_str(),
            ]),
            visited: item.visited,
            starred: item.starred,
            stamp: item.visited.then(|| VISITED_STAMP.to_string()),
            visit_action: CardAction::SetVisited {
                id: item.id.clone(),
                visited: !item.visited,
                label: label.to_string(),
            },
            note: NoteField {
                id: item.id.clone(),
                text: item.note.clone(),
                placeholder: NOTE_PLACEHOLDER.to_string(),
            },
            link: item.url.as_ref().map(|href| CardLink {
                href: href.clone(),
                label: LINK_LABEL.to_string(),
            }),
        }
    }
}

/// Joins the non-empty parts with " / "
pub(crate) fn join_present(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" / ")
}

impl ListView {
    /// Builds the list from pipeline output. Regions seen for the first time
    /// are recorded as collapsed.
    pub fn build(output: &PipelineOutput<'_>, regions: &mut RegionStates) -> Self {
        match &output.groups {
            Grouping::Flat => ListView::Flat(output.items.iter().map(|i| ItemCard::new(i)).collect()),
            Grouping::Regions(groups) => ListView::Grouped(
                groups
                    .iter()
                    .map(|group| {
                        let collapsed = regions.get_or_insert_default(group.region);
                        let visited = group.items.iter().filter(|item| item.visited).count();
                        let total = group.items.len();
                        let glyph = if collapsed {
                            COLLAPSED_GLYPH
                        } else {
                            EXPANDED_GLYPH
                        };
                        let cards = if collapsed {
                            Vec::new()
                        } else {
                            group.items.iter().map(|i| ItemCard::new(i)).collect()
                        };
                        RegionSection {
                            header: RegionHeader {
                                region: group.region.to_string(),
                                visited,
                                total,
                                collapsed,
                                glyph,
                                label: format!("{glyph} {}（{visited}/{total}）", group.region),
                            },
                            cards,
                        }
                    })
                    .collect(),
            ),
        }
    }

    /// Number of cards, over all sections
    pub fn card_count(&self) -> usize {
        match self {
            ListView::Flat(cards) => cards.len(),
            ListView::Grouped(sections) => sections.iter().map(|s| s.cards.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ListView::Flat(cards) => cards.is_empty(),
            ListView::Grouped(sections) => sections.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pipeline::Pipeline,
        state::{SortMode, ViewQuery},
        test_items::item,
    };

    fn fixture() -> Vec<LocationItem> {
        let mut sumida = item(2, "すみだ水族館", "東京都", true);
        sumida.city = "墨田区".into();
        sumida.location_raw = "東京都墨田区押上1-1-2".into();
        sumida.url = Some("https://www.sumida-aquarium.com/".into());
        sumida.note = "混雑注意".into();
        vec![
            item(1, "おたる水族館", "北海道", false),
            sumida,
            item(3, "アクアワールド茨城県大洗水族館", "茨城県", false),
            item(4, "海遊館", "大阪府", false),
        ]
    }

    fn division_query() -> ViewQuery {
        ViewQuery {
            sort: SortMode::ByDivision,
            ..Default::default()
        }
    }

    fn sections(view: &ListView) -> &[RegionSection] {
        match view {
            ListView::Grouped(sections) => sections,
            ListView::Flat(_) => panic!("expected grouped list"),
        }
    }

    #[test]
    fn card_text() {
        let items = fixture();
        let card = ItemCard::new(&items[1]);
        assert_eq!(card.meta, "東京都 / 墨田区 / 東京都墨田区押上1-1-2");
        assert_eq!(card.stamp.as_deref(), Some(VISITED_STAMP));
        assert_eq!(
            card.visit_action,
            CardAction::SetVisited {
                id: ItemId::from(2u64),
                visited: false,
                label: UNMARK_VISITED_LABEL.into(),
            }
        );
        assert_eq!(card.note.text, "混雑注意");
        assert_eq!(card.link.as_ref().map(|l| l.label.as_str()), Some(LINK_LABEL));

        let card = ItemCard::new(&items[0]);
        assert_eq!(card.meta, "北海道");
        assert_eq!(card.stamp, None);
        assert_eq!(card.link, None);
        let CardAction::SetVisited { visited, label, .. } = card.visit_action;
        assert!(visited);
        assert_eq!(label, MARK_VISITED_LABEL);
    }

    #[test]
    fn regions_start_collapsed() {
        let items = fixture();
        let output = Pipeline::new().run(&items, &division_query());
        let mut regions = RegionStates::default();
        let view = ListView::build(&output, &mut regions);

        let sections = sections(&view);
        assert_eq!(sections.len(), 3);
        let kanto = &sections[1];
        assert_eq!(kanto.header.region, "関東");
        assert!(kanto.header.collapsed);
        assert!(kanto.cards.is_empty());
        assert_eq!(kanto.header.label, "▶ 関東（1/2）");
        assert_eq!(view.card_count(), 0);
    }

    #[test]
    fn expanded_region_shows_cards() {
        let items = fixture();
        let output = Pipeline::new().run(&items, &division_query());
        let mut regions = RegionStates::default();
        regions.toggle("関東");
        let view = ListView::build(&output, &mut regions);

        let kanto = &sections(&view)[1];
        assert!(!kanto.header.collapsed);
        assert_eq!(kanto.header.glyph, '▼');
        assert_eq!(kanto.header.label, "▼ 関東（1/2）");
        let titles: Vec<_> = kanto.cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["アクアワールド茨城県大洗水族館", "すみだ水族館"]);
    }

    #[test]
    fn toggling_one_region_leaves_others_alone() {
        let items = fixture();
        let pipeline = Pipeline::new();
        let output = pipeline.run(&items, &division_query());
        let mut regions = RegionStates::default();
        for region in ["北海道", "関東", "近畿"] {
            regions.toggle(region);
        }
        let before = ListView::build(&output, &mut regions);
        regions.toggle("関東");
        let after = ListView::build(&output, &mut regions);

        let (before, after) = (sections(&before), sections(&after));
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after) {
            if b.header.region != "関東" {
                assert_eq!(b, a);
            }
        }
        assert!(after[1].cards.is_empty());
    }

    #[test]
    fn name_sort_is_flat_cards() {
        let items = fixture();
        let query = ViewQuery {
            sort: SortMode::ByName,
            ..Default::default()
        };
        let output = Pipeline::new().run(&items, &query);
        let mut regions = RegionStates::default();
        let view = ListView::build(&output, &mut regions);
        assert!(matches!(view, ListView::Flat(ref cards) if cards.len() == 4));
        assert_eq!(regions.known().count(), 0, "no region flags recorded");
    }

    #[test]
    fn empty_output_renders_nothing() {
        let items: Vec<LocationItem> = Vec::new();
        let output = Pipeline::new().run(&items, &division_query());
        let view = ListView::build(&output, &mut RegionStates::default());
        assert!(view.is_empty());
        assert_eq!(view.card_count(), 0);
    }
}
