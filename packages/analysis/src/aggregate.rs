//! Aggregation of per-house place lists.
//!
//! Every function here is a pure derivation from the place lists passed
//! in; nothing is carried between calls.

use std::collections::BTreeMap;

use house_map_amenity_models::{House, Place, Selection};
use house_map_analysis_models::{
    AnalysisResult, CategoryCount, FacilityRow, HouseFailure, HouseStats, RankedHouse,
};
use house_map_places::plan_tasks;

/// Number of subtypes kept in [`HouseStats::top_subtypes`].
pub const TOP_SUBTYPES: usize = 5;

/// One house's contribution to an analysis run.
#[derive(Debug, Clone)]
pub struct HouseRun {
    /// The geocoded house.
    pub house: House,
    /// Its accepted places, nearest first.
    pub places: Vec<Place>,
    /// Keywords whose search failed for this house.
    pub failed_keywords: Vec<String>,
}

/// Search parameters recorded alongside the results.
#[derive(Debug, Clone, Copy)]
pub struct RunParams<'a> {
    /// Run identifier.
    pub run_id: &'a str,
    /// Search radius in meters.
    pub radius_m: u32,
    /// Categories and subtypes searched.
    pub selection: &'a Selection,
    /// Free-text keyword searched after the selection.
    pub extra_keyword: Option<&'a str>,
}

/// Distance to the nearest place, or `None` for an empty list.
#[must_use]
pub fn nearest_distance(places: &[Place]) -> Option<u32> {
    places.iter().map(|p| p.distance_m).min()
}

/// Mean distance, or `None` for an empty list.
#[must_use]
pub fn average_distance(places: &[Place]) -> Option<f64> {
    if places.is_empty() {
        return None;
    }
    let total: u64 = places.iter().map(|p| u64::from(p.distance_m)).sum();
    #[allow(clippy::cast_precision_loss)]
    let average = total as f64 / places.len() as f64;
    Some(average)
}

/// Counts places by `key`, most first; ties keep first-seen order.
fn count_by<'a>(places: &'a [Place], key: impl Fn(&'a Place) -> &'a str) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for place in places {
        let name = key(place);
        if let Some(existing) = counts.iter_mut().find(|c| c.name == name) {
            existing.count += 1;
        } else {
            counts.push(CategoryCount {
                name: name.to_string(),
                count: 1,
            });
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Places per category key, most first.
#[must_use]
pub fn category_counts(places: &[Place]) -> Vec<CategoryCount> {
    count_by(places, |p| p.category.key())
}

/// Places per subtype, most first.
#[must_use]
pub fn subtype_counts(places: &[Place]) -> Vec<CategoryCount> {
    count_by(places, |p| p.subtype.as_str())
}

/// Statistics for one house.
#[must_use]
pub fn house_stats(label: &str, places: &[Place], top_n: usize) -> HouseStats {
    let mut top_subtypes = subtype_counts(places);
    top_subtypes.truncate(top_n);

    HouseStats {
        label: label.to_string(),
        facility_count: places.len(),
        nearest_m: nearest_distance(places),
        average_m: average_distance(places),
        by_category: category_counts(places),
        top_subtypes,
    }
}

/// Statistics for every house in `result`, in input order.
#[must_use]
pub fn result_stats(result: &AnalysisResult) -> Vec<HouseStats> {
    result
        .houses
        .iter()
        .map(|h| house_stats(&h.label, result.places_for(&h.label), TOP_SUBTYPES))
        .collect()
}

/// Number of places per house label.
#[must_use]
pub fn facility_counts(places: &BTreeMap<String, Vec<Place>>) -> BTreeMap<String, usize> {
    places
        .iter()
        .map(|(label, list)| (label.clone(), list.len()))
        .collect()
}

/// One row per (house, place): house-major in `houses` order, places in
/// their existing order.
#[must_use]
pub fn flat_table(houses: &[House], places: &BTreeMap<String, Vec<Place>>) -> Vec<FacilityRow> {
    houses
        .iter()
        .flat_map(|house| {
            places
                .get(&house.label)
                .into_iter()
                .flatten()
                .map(move |place| FacilityRow {
                    house: house.label.clone(),
                    category: place.category.key().to_string(),
                    subtype: place.subtype.clone(),
                    name: place.name.clone(),
                    distance_m: place.distance_m,
                    latitude: place.coordinate.latitude,
                    longitude: place.coordinate.longitude,
                    place_id: place.place_id.clone(),
                    address: place.address.clone(),
                })
        })
        .collect()
}

/// Ranks `(label, count)` pairs by descending count. Ties keep input order.
#[must_use]
pub fn rank_houses(counts: &[(String, usize)]) -> Vec<RankedHouse> {
    let mut ordered: Vec<&(String, usize)> = counts.iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1));
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (label, count))| RankedHouse {
            rank: i + 1,
            label: label.clone(),
            facility_count: *count,
        })
        .collect()
}

/// Ranks the houses of `result` by facility count.
#[must_use]
pub fn rank_result(result: &AnalysisResult) -> Vec<RankedHouse> {
    let counts: Vec<(String, usize)> = result
        .houses
        .iter()
        .map(|h| {
            (
                h.label.clone(),
                result.facility_counts.get(&h.label).copied().unwrap_or(0),
            )
        })
        .collect();
    rank_houses(&counts)
}

/// Builds a fresh [`AnalysisResult`] from per-house runs.
#[must_use]
pub fn aggregate(
    params: RunParams<'_>,
    runs: Vec<HouseRun>,
    failures: Vec<HouseFailure>,
) -> AnalysisResult {
    let mut houses = Vec::with_capacity(runs.len());
    let mut places = BTreeMap::new();
    let mut failed_keywords = BTreeMap::new();

    for run in runs {
        if !run.failed_keywords.is_empty() {
            failed_keywords.insert(run.house.label.clone(), run.failed_keywords);
        }
        places.insert(run.house.label.clone(), run.places);
        houses.push(run.house);
    }

    let facility_counts = facility_counts(&places);
    let table = flat_table(&houses, &places);

    AnalysisResult {
        run_id: params.run_id.to_string(),
        houses,
        places,
        facility_counts,
        radius_m: params.radius_m,
        categories: params.selection.categories(),
        keywords: plan_tasks(params.selection, params.extra_keyword)
            .into_iter()
            .map(|t| t.keyword)
            .collect(),
        failed_keywords,
        failures,
        table,
    }
}

#[cfg(test)]
mod tests {
    use house_map_amenity_models::{Category, CategoryTag, Coordinate};

    use super::*;

    fn place(id: &str, category: CategoryTag, subtype: &str, distance_m: u32) -> Place {
        Place {
            category,
            subtype: subtype.to_string(),
            keyword: subtype.to_string(),
            name: format!("place {id}"),
            coordinate: Coordinate::new(24.15, 120.67),
            distance_m,
            place_id: id.to_string(),
            address: None,
        }
    }

    fn house(label: &str) -> House {
        House {
            label: label.to_string(),
            title: format!("{label} listing"),
            address: format!("{label} address"),
            formatted_address: None,
            coordinate: Coordinate::new(24.15, 120.67),
        }
    }

    fn places_n(prefix: &str, n: u32) -> Vec<Place> {
        (0..n)
            .map(|i| {
                place(
                    &format!("{prefix}{i}"),
                    CategoryTag::Known(Category::Shopping),
                    "便利商店",
                    i * 10,
                )
            })
            .collect()
    }

    fn run(label: &str, places: Vec<Place>) -> HouseRun {
        HouseRun {
            house: house(label),
            places,
            failed_keywords: Vec::new(),
        }
    }

    #[test]
    fn empty_list_has_no_distance_stats() {
        assert_eq!(nearest_distance(&[]), None);
        assert_eq!(average_distance(&[]), None);
        let stats = house_stats("House A", &[], TOP_SUBTYPES);
        assert_eq!(stats.facility_count, 0);
        assert!(stats.by_category.is_empty());
    }

    #[test]
    fn distance_stats() {
        let places = vec![
            place("a", CategoryTag::Known(Category::Dining), "餐廳", 100),
            place("b", CategoryTag::Known(Category::Dining), "餐廳", 200),
            place("c", CategoryTag::Uncategorized, "寵物店", 450),
        ];
        assert_eq!(nearest_distance(&places), Some(100));
        assert!((average_distance(&places).unwrap() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn counts_sort_descending_with_first_seen_ties() {
        let places = vec![
            place("1", CategoryTag::Known(Category::Education), "小學", 10),
            place("2", CategoryTag::Known(Category::Dining), "餐廳", 20),
            place("3", CategoryTag::Known(Category::Dining), "咖啡廳", 30),
            place("4", CategoryTag::Uncategorized, "寵物店", 40),
            place("5", CategoryTag::Known(Category::Education), "幼兒園", 50),
        ];
        let by_category = category_counts(&places);
        let names: Vec<&str> = by_category.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["教育", "餐飲美食", "其他"]);
        assert_eq!(by_category[0].count, 2);

        let stats = house_stats("House A", &places, 2);
        let top: Vec<&str> = stats.top_subtypes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(top, vec!["小學", "餐廳"]);
    }

    #[test]
    fn two_house_comparison_scenario() {
        let selection = Selection::whole_categories(&[Category::Shopping]);
        let params = RunParams {
            run_id: "run",
            radius_m: 1000,
            selection: &selection,
            extra_keyword: None,
        };
        let result = aggregate(
            params,
            vec![run("House B", places_n("b", 15)), run("House A", places_n("a", 40))],
            Vec::new(),
        );

        assert_eq!(result.facility_counts["House A"], 40);
        assert_eq!(result.facility_counts["House B"], 15);

        let ranking = rank_result(&result);
        assert_eq!(ranking[0].label, "House A");
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[1].label, "House B");
    }

    #[test]
    fn counts_and_table_stay_consistent() {
        let selection = Selection::new();
        let params = RunParams {
            run_id: "run",
            radius_m: 500,
            selection: &selection,
            extra_keyword: Some("寵物店"),
        };
        let result = aggregate(
            params,
            vec![
                run("House A", places_n("a", 3)),
                run("House B", Vec::new()),
                run("House C", places_n("c", 2)),
            ],
            Vec::new(),
        );

        for h in &result.houses {
            assert_eq!(result.facility_counts[&h.label], result.places_for(&h.label).len());
        }
        assert_eq!(result.table.len(), result.total_places());
        assert_eq!(result.keywords, vec!["寵物店".to_string()]);

        let labels: Vec<&str> = result.table.iter().map(|r| r.house.as_str()).collect();
        assert_eq!(
            labels,
            vec!["House A", "House A", "House A", "House C", "House C"]
        );
    }

    #[test]
    fn ranking_ties_keep_input_order() {
        let ranking = rank_houses(&[
            ("House A".to_string(), 5),
            ("House B".to_string(), 9),
            ("House C".to_string(), 5),
        ]);
        let labels: Vec<&str> = ranking.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["House B", "House A", "House C"]);
        assert_eq!(ranking[2].rank, 3);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let selection = Selection::whole_categories(&[Category::Dining]);
        let params = RunParams {
            run_id: "run",
            radius_m: 800,
            selection: &selection,
            extra_keyword: None,
        };
        let runs = vec![run("House A", places_n("a", 4))];
        let first = aggregate(params, runs.clone(), Vec::new());
        let second = aggregate(params, runs, Vec::new());
        assert_eq!(first, second);
        assert_eq!(result_stats(&first), result_stats(&second));
    }
}
