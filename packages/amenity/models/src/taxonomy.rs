//! Fixed amenity taxonomy: category → subtype → search keyword.
//!
//! Each [`Category`] owns an ordered list of [`TaxonomyEntry`] records. The
//! keyword of an entry is sent verbatim as the place search query. Several
//! subtypes intentionally share a keyword (every supermarket chain searches
//! for `supermarket`), so the reverse index is many-to-one and resolves
//! collisions by taking the entry inserted last, walking categories in
//! [`Category::ALL`] order and entries in table order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Top-level amenity groupings.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
pub enum Category {
    /// Schools, libraries, cram schools
    #[serde(rename = "教育")]
    #[strum(serialize = "教育")]
    Education,
    /// Convenience stores, supermarkets, markets, department stores
    #[serde(rename = "購物")]
    #[strum(serialize = "購物")]
    Shopping,
    /// Rail, bus, parking
    #[serde(rename = "交通運輸")]
    #[strum(serialize = "交通運輸")]
    Transportation,
    /// Hospitals, clinics, pharmacies
    #[serde(rename = "醫療保健")]
    #[strum(serialize = "醫療保健")]
    Healthcare,
    /// Restaurants, cafes, night markets
    #[serde(rename = "餐飲美食")]
    #[strum(serialize = "餐飲美食")]
    Dining,
    /// Banks, post offices, public safety, everyday errands
    #[serde(rename = "生活機能")]
    #[strum(serialize = "生活機能")]
    DailyServices,
    /// Parks, sports, culture
    #[serde(rename = "休閒娛樂")]
    #[strum(serialize = "休閒娛樂")]
    Leisure,
}

impl Category {
    /// All categories in display order.
    pub const ALL: &[Self] = &[
        Self::Education,
        Self::Shopping,
        Self::Transportation,
        Self::Healthcare,
        Self::Dining,
        Self::DailyServices,
        Self::Leisure,
    ];

    /// English label for logs and exports.
    #[must_use]
    pub const fn english_name(self) -> &'static str {
        match self {
            Self::Education => "Education",
            Self::Shopping => "Shopping",
            Self::Transportation => "Transportation",
            Self::Healthcare => "Healthcare",
            Self::Dining => "Dining",
            Self::DailyServices => "Daily services",
            Self::Leisure => "Leisure",
        }
    }

    /// Map marker / chart color as a hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Education => "#1f77b4",
            Self::Shopping => "#ff7f0e",
            Self::Transportation => "#2ca02c",
            Self::Healthcare => "#d62728",
            Self::Dining => "#9467bd",
            Self::DailyServices => "#8c564b",
            Self::Leisure => "#e377c2",
        }
    }
}

/// One searchable facility kind within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyEntry {
    /// Human-readable subtype, unique within its category.
    pub subtype: &'static str,
    /// Query string sent to the place search service.
    pub keyword: &'static str,
}

const fn entry(subtype: &'static str, keyword: &'static str) -> TaxonomyEntry {
    TaxonomyEntry { subtype, keyword }
}

const EDUCATION: &[TaxonomyEntry] = &[
    entry("幼兒園", "preschool"),
    entry("小學", "primary_school"),
    entry("中學", "secondary_school"),
    entry("大學", "university"),
    entry("圖書館", "library"),
    entry("補習班", "補習班"),
];

const SHOPPING: &[TaxonomyEntry] = &[
    entry("便利商店", "convenience_store"),
    entry("超市", "supermarket"),
    entry("全聯", "supermarket"),
    entry("家樂福", "supermarket"),
    entry("傳統市場", "傳統市場"),
    entry("百貨公司", "department_store"),
    entry("量販店", "量販店"),
    entry("書店", "book_store"),
];

const TRANSPORTATION: &[TaxonomyEntry] = &[
    entry("捷運站", "subway_station"),
    entry("公車站", "bus_station"),
    entry("火車站", "train_station"),
    entry("高鐵站", "高鐵站"),
    entry("停車場", "parking"),
    entry("加油站", "gas_station"),
    entry("YouBike", "YouBike"),
];

const HEALTHCARE: &[TaxonomyEntry] = &[
    entry("醫院", "hospital"),
    entry("診所", "診所"),
    entry("藥局", "pharmacy"),
    entry("牙醫", "dentist"),
    entry("動物醫院", "veterinary_care"),
];

const DINING: &[TaxonomyEntry] = &[
    entry("餐廳", "restaurant"),
    entry("咖啡廳", "cafe"),
    entry("麵包店", "bakery"),
    entry("早餐店", "早餐店"),
    entry("夜市", "夜市"),
];

const DAILY_SERVICES: &[TaxonomyEntry] = &[
    entry("銀行", "bank"),
    entry("郵局", "post_office"),
    entry("警察局", "police"),
    entry("消防隊", "fire_station"),
    entry("洗衣店", "laundry"),
    entry("超市", "supermarket"),
];

const LEISURE: &[TaxonomyEntry] = &[
    entry("公園", "park"),
    entry("健身房", "gym"),
    entry("運動中心", "運動中心"),
    entry("電影院", "movie_theater"),
    entry("博物館", "museum"),
    entry("美術館", "art_gallery"),
];

/// Read-only access to the static taxonomy table.
pub struct Taxonomy;

impl Taxonomy {
    /// Ordered `(subtype, keyword)` records for `category`.
    #[must_use]
    pub const fn entries(category: Category) -> &'static [TaxonomyEntry] {
        match category {
            Category::Education => EDUCATION,
            Category::Shopping => SHOPPING,
            Category::Transportation => TRANSPORTATION,
            Category::Healthcare => HEALTHCARE,
            Category::Dining => DINING,
            Category::DailyServices => DAILY_SERVICES,
            Category::Leisure => LEISURE,
        }
    }

    /// Subtype names for `category`, in table order.
    pub fn subtypes(category: Category) -> impl Iterator<Item = &'static str> {
        Self::entries(category).iter().map(|e| e.subtype)
    }

    /// Whether `subtype` exists under `category`.
    #[must_use]
    pub fn contains(category: Category, subtype: &str) -> bool {
        Self::entries(category).iter().any(|e| e.subtype == subtype)
    }

    /// Keyword for one subtype of `category`.
    #[must_use]
    pub fn keyword_for(category: Category, subtype: &str) -> Option<&'static str> {
        Self::entries(category)
            .iter()
            .find(|e| e.subtype == subtype)
            .map(|e| e.keyword)
    }

    /// Keyword → `(category, subtype)` index. Later entries overwrite
    /// earlier ones for shared keywords.
    #[must_use]
    pub fn reverse_index() -> BTreeMap<&'static str, (Category, &'static str)> {
        let mut index = BTreeMap::new();
        for &category in Category::ALL {
            for e in Self::entries(category) {
                index.insert(e.keyword, (category, e.subtype));
            }
        }
        index
    }

    /// Reverse lookup of a single keyword, with the same last-wins rule as
    /// [`Self::reverse_index`].
    #[must_use]
    pub fn lookup(keyword: &str) -> Option<(Category, &'static str)> {
        Category::ALL
            .iter()
            .flat_map(|&c| Self::entries(c).iter().map(move |e| (c, e)))
            .filter(|(_, e)| e.keyword == keyword)
            .last()
            .map(|(c, e)| (c, e.subtype))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use super::*;

    #[test]
    fn keywords_are_non_empty() {
        for &category in Category::ALL {
            for e in Taxonomy::entries(category) {
                assert!(!e.keyword.is_empty(), "{category}/{} has no keyword", e.subtype);
            }
        }
    }

    #[test]
    fn subtypes_unique_within_category() {
        for &category in Category::ALL {
            let mut seen = BTreeSet::new();
            for subtype in Taxonomy::subtypes(category) {
                assert!(seen.insert(subtype), "Duplicate subtype {subtype} in {category}");
            }
        }
    }

    #[test]
    fn shared_keyword_resolves_to_last_entry() {
        // "supermarket" is listed under 購物 three times and once more under
        // 生活機能, which comes later in Category::ALL.
        assert_eq!(
            Taxonomy::lookup("supermarket"),
            Some((Category::DailyServices, "超市"))
        );
        assert_eq!(
            Taxonomy::reverse_index().get("supermarket"),
            Some(&(Category::DailyServices, "超市"))
        );
    }

    #[test]
    fn reverse_index_agrees_with_lookup() {
        for (keyword, hit) in Taxonomy::reverse_index() {
            assert_eq!(Taxonomy::lookup(keyword), Some(hit));
        }
    }

    #[test]
    fn keyword_for_known_and_unknown() {
        assert_eq!(
            Taxonomy::keyword_for(Category::Shopping, "便利商店"),
            Some("convenience_store")
        );
        assert_eq!(Taxonomy::keyword_for(Category::Shopping, "小學"), None);
    }

    #[test]
    fn category_names_round_trip_through_strum_and_serde() {
        for &category in Category::ALL {
            let name = category.to_string();
            assert_eq!(Category::from_str(&name).unwrap(), category);
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{name}\""));
        }
    }
}
