//! Reference tables: prefecture order and prefecture → region mapping.
//!
//! Lookups are total. A prefecture that isn't in the table ranks after every
//! known one and belongs to [`UNCLASSIFIED_REGION`].

/// The 47 prefectures, north to south. Index is the sort rank.
#[rustfmt::skip]
pub const DIVISION_ORDER: [&str; 47] = [
    "北海道",
    "青森県", "岩手県", "宮城県", "秋田県", "山形県", "福島県",
    "茨城県", "栃木県", "群馬県", "埼玉県", "千葉県", "東京都", "神奈川県",
    "新潟県", "富山県", "石川県", "福井県", "山梨県", "長野県",
    "岐阜県", "静岡県", "愛知県", "三重県",
    "滋賀県", "京都府", "大阪府", "兵庫県", "奈良県", "和歌山県",
    "鳥取県", "島根県", "岡山県", "広島県", "山口県",
    "徳島県", "香川県", "愛媛県", "高知県",
    "福岡県", "佐賀県", "長崎県", "熊本県", "大分県", "宮崎県", "鹿児島県",
    "沖縄県",
];

/// Regions in display order (the unclassified region is emitted after these)
pub const REGION_ORDER: [&str; 8] = [
    "北海道", "東北", "関東", "中部", "近畿", "中国", "四国", "九州・沖縄",
];

/// Region for prefectures not in [`DIVISION_ORDER`]
pub const UNCLASSIFIED_REGION: &str = "その他";

/// Sort rank of a prefecture. `Unranked` compares greater than every `Known` rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DivisionRank {
    Known(usize),
    Unranked,
}

pub fn division_rank(division: &str) -> DivisionRank {
    DIVISION_ORDER
        .iter()
        .position(|known| *known == division)
        .map_or(DivisionRank::Unranked, DivisionRank::Known)
}

pub fn region_of(division: &str) -> &'static str {
    match division {
        "北海道" => "北海道",
        "青森県" | "岩手県" | "宮城県" | "秋田県" | "山形県" | "福島県" => "東北",
        "茨城県" | "栃木県" | "群馬県" | "埼玉県" | "千葉県" | "東京都" | "神奈川県" => "関東",
        "新潟県" | "富山県" | "石川県" | "福井県" | "山梨県" | "長野県" | "岐阜県" | "静岡県"
        | "愛知県" => "中部",
        "三重県" | "滋賀県" | "京都府" | "大阪府" | "兵庫県" | "奈良県" | "和歌山県" => "近畿",
        "鳥取県" | "島根県" | "岡山県" | "広島県" | "山口県" => "中国",
        "徳島県" | "香川県" | "愛媛県" | "高知県" => "四国",
        "福岡県" | "佐賀県" | "長崎県" | "熊本県" | "大分県" | "宮崎県" | "鹿児島県" | "沖縄県" => {
            "九州・沖縄"
        }
        _ => UNCLASSIFIED_REGION,
    }
}

/// All regions in display order, ending with [`UNCLASSIFIED_REGION`]
pub fn regions() -> impl Iterator<Item = &'static str> {
    REGION_ORDER
        .into_iter()
        .chain(std::iter::once(UNCLASSIFIED_REGION))
}

/// Position of a region in [`regions`]; unknown names sort last
pub fn region_rank(region: &str) -> usize {
    regions()
        .position(|known| known == region)
        .unwrap_or(REGION_ORDER.len() + 1)
}
