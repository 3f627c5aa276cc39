//! Facility query engine.
//!
//! Given an origin, a category [`Selection`], a radius and an optional
//! free-text keyword, the engine:
//!
//! 1. flattens the selection into an ordered keyword task list, with the
//!    extra keyword last;
//! 2. runs one [`PlaceSearch`] per task, sequentially, keeping at least
//!    the throttle between consecutive searches issued by the same engine
//!    (the upstream rate limit is shared, so one engine can serve several
//!    origins and searches are never issued concurrently);
//! 3. drops rows whose haversine distance from the origin exceeds the
//!    radius, since the service treats the radius as a bias only;
//! 4. drops rows whose place id was already accepted, so the first task
//!    to produce a place decides its category and subtype;
//! 5. sorts what is left by ascending distance.
//!
//! A failing keyword is logged and recorded in the report as
//! [`KeywordStatus::Failed`]; the remaining keywords still run.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use house_map_amenity_models::{CategoryTag, Coordinate, Place, Selection, Taxonomy, haversine};
use thiserror::Error;
use tokio::time::Instant;

use crate::progress::{NullProgress, ProgressCallback};
use crate::{PlaceSearch, RawPlace, SearchRequest};

/// Minimum delay between consecutive keyword searches.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(300);

/// Errors that abort a whole query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The origin is not a usable WGS84 coordinate.
    #[error("Invalid origin coordinate: {origin:?}")]
    InvalidOrigin {
        /// The rejected origin.
        origin: Coordinate,
    },
}

/// Parameters of one facility query.
#[derive(Debug, Clone)]
pub struct FacilityQuery {
    /// Search center, normally a geocoded house.
    pub origin: Coordinate,
    /// Categories and subtypes to search.
    pub selection: Selection,
    /// Maximum accepted distance in meters.
    pub radius_m: u32,
    /// Free-text keyword searched after the selection.
    pub extra_keyword: Option<String>,
}

/// One planned search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTask {
    /// Query string.
    pub keyword: String,
    /// Category assigned to places this task accepts.
    pub category: CategoryTag,
    /// Subtype assigned to places this task accepts.
    pub subtype: String,
}

/// What happened to one keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordStatus {
    /// The search returned; counts describe how its rows were handled.
    Searched {
        /// Rows returned by the service.
        returned: usize,
        /// Rows accepted into the result.
        accepted: usize,
        /// Rows beyond the radius.
        out_of_range: usize,
        /// Rows whose place id had already been accepted.
        duplicates: usize,
    },
    /// The search failed and counted as zero results.
    Failed {
        /// Error description.
        reason: String,
    },
}

/// Per-keyword record in a [`FacilityReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordOutcome {
    /// The keyword searched.
    pub keyword: String,
    /// How it went.
    pub status: KeywordStatus,
}

impl KeywordOutcome {
    /// Whether the search failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.status, KeywordStatus::Failed { .. })
    }
}

/// Result of [`FacilityQueryEngine::run`].
#[derive(Debug, Clone, Default)]
pub struct FacilityReport {
    /// Accepted places, nearest first.
    pub places: Vec<Place>,
    /// One entry per task, in task order.
    pub outcomes: Vec<KeywordOutcome>,
}

impl FacilityReport {
    /// Keywords whose search failed.
    #[must_use]
    pub fn failed_keywords(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failed())
            .map(|o| o.keyword.as_str())
            .collect()
    }
}

/// Flattens a selection into the ordered task list.
///
/// Every selected subtype yields one task carrying its own category and
/// subtype; repeated keywords are searched again. A non-blank extra keyword
/// is appended last and tagged with the first selected category that lists
/// it (by keyword or subtype name), or [`CategoryTag::Uncategorized`].
#[must_use]
pub fn plan_tasks(selection: &Selection, extra_keyword: Option<&str>) -> Vec<KeywordTask> {
    let mut tasks = Vec::new();

    for entry in selection.entries() {
        for subtype in &entry.subtypes {
            let Some(keyword) = Taxonomy::keyword_for(entry.category, subtype) else {
                continue;
            };
            tasks.push(KeywordTask {
                keyword: keyword.to_string(),
                category: CategoryTag::Known(entry.category),
                subtype: subtype.clone(),
            });
        }
    }

    if let Some(extra) = extra_keyword.map(str::trim).filter(|k| !k.is_empty()) {
        tasks.push(tag_extra_keyword(selection, extra));
    }

    tasks
}

fn tag_extra_keyword(selection: &Selection, keyword: &str) -> KeywordTask {
    for entry in selection.entries() {
        for subtype in &entry.subtypes {
            let matches = subtype == keyword
                || Taxonomy::keyword_for(entry.category, subtype) == Some(keyword);
            if matches {
                return KeywordTask {
                    keyword: keyword.to_string(),
                    category: CategoryTag::Known(entry.category),
                    subtype: subtype.clone(),
                };
            }
        }
    }

    KeywordTask {
        keyword: keyword.to_string(),
        category: CategoryTag::Uncategorized,
        subtype: keyword.to_string(),
    }
}

/// Runs keyword searches and merges the results per origin.
///
/// The throttle spans every [`run`](Self::run) on the same engine, so
/// reusing one engine across houses also spaces the last search of one
/// house from the first search of the next.
pub struct FacilityQueryEngine<'a> {
    search: &'a dyn PlaceSearch,
    throttle: Duration,
    last_search: Mutex<Option<Instant>>,
}

impl<'a> FacilityQueryEngine<'a> {
    /// Creates an engine with [`DEFAULT_THROTTLE`].
    #[must_use]
    pub fn new(search: &'a dyn PlaceSearch) -> Self {
        Self {
            search,
            throttle: DEFAULT_THROTTLE,
            last_search: Mutex::new(None),
        }
    }

    /// Sets the delay between consecutive searches.
    #[must_use]
    pub const fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Runs every planned search and returns the merged places.
    ///
    /// Individual keyword failures never fail the query. An empty task
    /// list returns an empty report without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOrigin`] if the origin is not a valid
    /// coordinate; nothing is searched in that case.
    pub async fn run(&self, query: &FacilityQuery) -> Result<FacilityReport, QueryError> {
        self.run_with_progress(query, &NullProgress).await
    }

    /// Same as [`run`](Self::run), reporting each search to `progress`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOrigin`] if the origin is not a valid
    /// coordinate.
    pub async fn run_with_progress(
        &self,
        query: &FacilityQuery,
        progress: &dyn ProgressCallback,
    ) -> Result<FacilityReport, QueryError> {
        if !query.origin.is_valid() {
            return Err(QueryError::InvalidOrigin {
                origin: query.origin,
            });
        }

        let tasks = plan_tasks(&query.selection, query.extra_keyword.as_deref());
        if tasks.is_empty() {
            log::info!("No keywords selected; skipping place search");
            return Ok(FacilityReport::default());
        }

        progress.set_total(tasks.len() as u64);

        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut report = FacilityReport::default();

        for task in &tasks {
            self.wait_for_turn().await;

            progress
                .set_message(format!("{} ({})", task.subtype, task.category));

            let request = SearchRequest {
                keyword: &task.keyword,
                origin: query.origin,
                radius_m: query.radius_m,
            };

            let status = match self.search.search(&request).await {
                Ok(rows) => accept_rows(query, task, rows, &mut seen, &mut report.places),
                Err(e) => {
                    log::warn!("Place search for '{}' failed: {e}", task.keyword);
                    KeywordStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            report.outcomes.push(KeywordOutcome {
                keyword: task.keyword.clone(),
                status,
            });
            progress.inc(1);
        }

        report.places.sort_by_key(|p| p.distance_m);

        progress.finish(format!(
            "{} places within {}m",
            report.places.len(),
            query.radius_m
        ));

        Ok(report)
    }

    /// Sleeps until the throttle has passed since the previous search, then
    /// stamps the current one.
    async fn wait_for_turn(&self) {
        if self.throttle.is_zero() {
            return;
        }

        let previous = *self
            .last_search
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = previous {
            tokio::time::sleep_until(previous + self.throttle).await;
        }

        *self
            .last_search
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }
}

/// Whether a computed distance is inside the search radius.
///
/// Compares the unrounded distance, inclusive of the radius itself. NaN
/// compares false and is rejected.
fn within_radius(distance: f64, radius_m: u32) -> bool {
    distance <= f64::from(radius_m)
}

/// Filters one keyword's rows into `places`.
fn accept_rows(
    query: &FacilityQuery,
    task: &KeywordTask,
    rows: Vec<RawPlace>,
    seen: &mut BTreeSet<String>,
    places: &mut Vec<Place>,
) -> KeywordStatus {
    let returned = rows.len();
    let mut accepted = 0;
    let mut out_of_range = 0;
    let mut duplicates = 0;

    for row in rows {
        let distance = haversine(query.origin, row.coordinate);

        if !within_radius(distance, query.radius_m) {
            log::debug!(
                "Dropping {} ({}): {distance:.0}m is beyond {}m",
                row.name,
                row.place_id,
                query.radius_m
            );
            out_of_range += 1;
            continue;
        }

        if !seen.insert(row.place_id.clone()) {
            log::debug!(
                "Dropping {} ({}): already found by an earlier keyword",
                row.name,
                row.place_id
            );
            duplicates += 1;
            continue;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let distance_m = distance as u32;

        places.push(Place {
            category: task.category,
            subtype: task.subtype.clone(),
            keyword: task.keyword.clone(),
            name: row.name,
            coordinate: row.coordinate,
            distance_m,
            place_id: row.place_id,
            address: row.address,
        });
        accepted += 1;
    }

    KeywordStatus::Searched {
        returned,
        accepted,
        out_of_range,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use house_map_amenity_models::Category;

    use super::*;
    use crate::SearchError;

    const CITY_HALL: Coordinate = Coordinate::new(24.1477, 120.6736);

    /// Meters per degree of latitude at the configured Earth radius.
    const M_PER_DEG: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

    fn north_of(origin: Coordinate, meters: f64) -> Coordinate {
        Coordinate::new(origin.latitude + meters / M_PER_DEG, origin.longitude)
    }

    fn raw(id: &str, meters: f64) -> RawPlace {
        RawPlace {
            place_id: id.to_string(),
            name: format!("place {id}"),
            coordinate: north_of(CITY_HALL, meters),
            address: None,
        }
    }

    /// Canned responses per keyword; records every keyword searched.
    #[derive(Default)]
    struct FakeSearch {
        responses: BTreeMap<String, Result<Vec<RawPlace>, String>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSearch {
        fn with(mut self, keyword: &str, rows: Vec<RawPlace>) -> Self {
            self.responses.insert(keyword.to_string(), Ok(rows));
            self
        }

        fn failing(mut self, keyword: &str) -> Self {
            self.responses
                .insert(keyword.to_string(), Err("boom".to_string()));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl PlaceSearch for FakeSearch {
        async fn search(
            &self,
            request: &SearchRequest<'_>,
        ) -> Result<Vec<RawPlace>, SearchError> {
            self.calls.lock().unwrap().push(request.keyword.to_string());
            match self.responses.get(request.keyword) {
                Some(Ok(rows)) => Ok(rows.clone()),
                Some(Err(message)) => Err(SearchError::Parse {
                    message: message.clone(),
                }),
                None => Ok(Vec::new()),
            }
        }
    }

    fn selection(picks: &[(Category, &[&str])]) -> Selection {
        let mut selection = Selection::new();
        for (category, subtypes) in picks {
            selection.add(*category, subtypes.iter());
        }
        selection
    }

    fn query(selection: Selection, radius_m: u32, extra: Option<&str>) -> FacilityQuery {
        FacilityQuery {
            origin: CITY_HALL,
            selection,
            radius_m,
            extra_keyword: extra.map(String::from),
        }
    }

    #[test]
    fn plans_tasks_in_selection_order_with_extra_last() {
        let sel = selection(&[
            (Category::Transportation, &["捷運站"]),
            (Category::Shopping, &["便利商店", "全聯"]),
        ]);
        let tasks = plan_tasks(&sel, Some("  寵物店 "));
        let keywords: Vec<&str> = tasks.iter().map(|t| t.keyword.as_str()).collect();
        assert_eq!(
            keywords,
            vec!["subway_station", "convenience_store", "supermarket", "寵物店"]
        );
        assert_eq!(tasks[2].subtype, "全聯");
        assert_eq!(tasks[3].category, CategoryTag::Uncategorized);
    }

    #[test]
    fn extra_keyword_matching_a_selected_subtype_is_tagged() {
        let sel = selection(&[
            (Category::Education, &["小學"]),
            (Category::Shopping, &["超市"]),
        ]);
        let by_keyword = plan_tasks(&sel, Some("supermarket"));
        assert_eq!(
            by_keyword.last().unwrap().category,
            CategoryTag::Known(Category::Shopping)
        );
        let by_name = plan_tasks(&sel, Some("小學"));
        assert_eq!(
            by_name.last().unwrap().category,
            CategoryTag::Known(Category::Education)
        );
        assert_eq!(by_name.last().unwrap().subtype, "小學");
    }

    #[test]
    fn blank_extra_keyword_is_ignored() {
        let sel = selection(&[(Category::Dining, &["餐廳"])]);
        assert_eq!(plan_tasks(&sel, Some("   ")).len(), 1);
    }

    #[tokio::test]
    async fn empty_selection_makes_no_calls() {
        let search = FakeSearch::default();
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::ZERO);
        let report = engine
            .run(&query(Selection::new(), 500, None))
            .await
            .unwrap();
        assert!(report.places.is_empty());
        assert!(report.outcomes.is_empty());
        assert!(search.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_origin_fails_before_searching() {
        let search = FakeSearch::default();
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::ZERO);
        let mut q = query(selection(&[(Category::Dining, &["餐廳"])]), 500, None);
        q.origin = Coordinate::new(f64::NAN, 120.0);
        assert!(matches!(
            engine.run(&q).await,
            Err(QueryError::InvalidOrigin { .. })
        ));
        assert!(search.calls().is_empty());
    }

    #[tokio::test]
    async fn city_hall_convenience_store_scenario() {
        // Supermarkets are searched first and claim "a" and "b".
        let supermarkets = vec![raw("a", 120.0), raw("b", 260.0)];

        // 12 convenience store rows: 3 beyond 500m, 2 already seen.
        let mut stores = vec![raw("far1", 650.0), raw("far2", 800.0), raw("far3", 1200.0)];
        stores.push(raw("a", 120.0));
        stores.push(raw("b", 260.0));
        for i in 0..7 {
            stores.push(raw(&format!("s{i}"), 40.0 + 60.0 * f64::from(i)));
        }
        assert_eq!(stores.len(), 12);

        let search = FakeSearch::default()
            .with("supermarket", supermarkets)
            .with("convenience_store", stores);
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::ZERO);

        let sel = selection(&[(Category::Shopping, &["超市", "便利商店"])]);
        let report = engine.run(&query(sel, 500, None)).await.unwrap();

        assert_eq!(report.places.len(), 2 + 7);
        assert!(report.places.iter().all(|p| p.distance_m <= 500));

        let ids: BTreeSet<&str> = report.places.iter().map(|p| p.place_id.as_str()).collect();
        assert_eq!(ids.len(), report.places.len());

        assert_eq!(
            report.outcomes[1].status,
            KeywordStatus::Searched {
                returned: 12,
                accepted: 7,
                out_of_range: 3,
                duplicates: 2,
            }
        );
    }

    #[tokio::test]
    async fn first_keyword_decides_category() {
        let search = FakeSearch::default()
            .with("park", vec![raw("shared", 100.0)])
            .with("gym", vec![raw("shared", 100.0), raw("gym-only", 200.0)]);
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::ZERO);

        let sel = selection(&[(Category::Leisure, &["公園", "健身房"])]);
        let report = engine.run(&query(sel, 1000, None)).await.unwrap();

        let shared = report
            .places
            .iter()
            .find(|p| p.place_id == "shared")
            .unwrap();
        assert_eq!(shared.subtype, "公園");
        assert_eq!(shared.keyword, "park");
    }

    #[tokio::test]
    async fn failed_keyword_does_not_stop_the_loop() {
        let search = FakeSearch::default()
            .failing("hospital")
            .with("pharmacy", vec![raw("rx", 300.0)]);
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::ZERO);

        let sel = selection(&[(Category::Healthcare, &["醫院", "藥局"])]);
        let report = engine.run(&query(sel, 500, None)).await.unwrap();

        assert_eq!(search.calls(), vec!["hospital", "pharmacy"]);
        assert_eq!(report.failed_keywords(), vec!["hospital"]);
        assert_eq!(report.places.len(), 1);
        assert_eq!(report.places[0].place_id, "rx");
    }

    #[tokio::test]
    async fn results_are_sorted_by_distance() {
        let search = FakeSearch::default()
            .with("restaurant", vec![raw("r-far", 450.0), raw("r-near", 50.0)])
            .with("cafe", vec![raw("c-mid", 200.0)]);
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::ZERO);

        let sel = selection(&[(Category::Dining, &["餐廳", "咖啡廳"])]);
        let report = engine.run(&query(sel, 500, None)).await.unwrap();

        let order: Vec<&str> = report.places.iter().map(|p| p.place_id.as_str()).collect();
        assert_eq!(order, vec!["r-near", "c-mid", "r-far"]);
        assert!(
            report
                .places
                .windows(2)
                .all(|w| w[0].distance_m <= w[1].distance_m)
        );
    }

    #[tokio::test]
    async fn uncategorized_extra_keyword_is_tagged_as_sentinel() {
        let search = FakeSearch::default().with("寵物店", vec![raw("pet", 90.0)]);
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::ZERO);

        let report = engine
            .run(&query(Selection::new(), 500, Some("寵物店")))
            .await
            .unwrap();

        assert_eq!(report.places.len(), 1);
        assert_eq!(report.places[0].category, CategoryTag::Uncategorized);
        assert_eq!(report.places[0].subtype, "寵物店");
    }

    #[test]
    fn radius_is_inclusive_and_unrounded() {
        assert!(within_radius(500.0, 500));
        assert!(within_radius(499.99, 500));
        assert!(!within_radius(500.4, 500));
        assert!(!within_radius(f64::NAN, 500));
        assert!(!within_radius(f64::INFINITY, 500));
    }

    #[tokio::test]
    async fn rows_just_past_the_radius_are_dropped_before_truncation() {
        let search = FakeSearch::default().with(
            "park",
            vec![raw("inside", 499.7), raw("outside", 500.4)],
        );
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::ZERO);

        let sel = selection(&[(Category::Leisure, &["公園"])]);
        let report = engine.run(&query(sel, 500, None)).await.unwrap();

        assert_eq!(report.places.len(), 1);
        assert_eq!(report.places[0].place_id, "inside");
        assert_eq!(report.places[0].distance_m, 499);
        assert_eq!(
            report.outcomes[0].status,
            KeywordStatus::Searched {
                returned: 2,
                accepted: 1,
                out_of_range: 1,
                duplicates: 0,
            }
        );
    }

    #[tokio::test]
    async fn rows_with_unusable_coordinates_are_dropped() {
        let mut broken = raw("broken", 10.0);
        broken.coordinate = Coordinate::new(f64::NAN, 120.0);
        let search = FakeSearch::default().with("park", vec![broken, raw("ok", 10.0)]);
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::ZERO);

        let sel = selection(&[(Category::Leisure, &["公園"])]);
        let report = engine.run(&query(sel, 50_000, None)).await.unwrap();

        let ids: Vec<&str> = report.places.iter().map(|p| p.place_id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_carries_across_runs() {
        let search = FakeSearch::default();
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::from_millis(300));
        let sel = selection(&[(Category::Dining, &["餐廳"])]);

        let start = tokio::time::Instant::now();
        engine.run(&query(sel.clone(), 500, None)).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(300));

        engine.run(&query(sel, 500, None)).await.unwrap();
        assert_eq!(search.calls().len(), 2);
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn searches_are_throttled() {
        let search = FakeSearch::default();
        let engine = FacilityQueryEngine::new(&search).with_throttle(Duration::from_millis(300));

        let sel = selection(&[(Category::Dining, &["餐廳", "咖啡廳", "麵包店"])]);
        let start = tokio::time::Instant::now();
        engine.run(&query(sel, 500, None)).await.unwrap();

        assert_eq!(search.calls().len(), 3);
        assert!(start.elapsed() >= Duration::from_millis(600));
    }
}
