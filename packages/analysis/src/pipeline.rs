//! Analysis pipeline: geocode → search → aggregate.
//!
//! An [`AnalysisContext`] carries everything one run needs (service
//! backends, selection, radius, throttle, progress sinks) and produces a
//! brand new [`AnalysisResult`] each time [`AnalysisContext::run`] is
//! called. Houses are processed one at a time; a house whose address
//! cannot be geocoded is recorded as a [`HouseFailure`] and skipped
//! without affecting the others.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use house_map_amenity_models::{House, Selection};
use house_map_analysis_models::{AnalysisResult, HouseFailure, HouseInput};
use house_map_geocoder::Geocoder;
use house_map_places::engine::DEFAULT_THROTTLE;
use house_map_places::progress::{ProgressCallback, null_progress};
use house_map_places::{FacilityQuery, FacilityQueryEngine, PlaceSearch};

use crate::AnalysisError;
use crate::aggregate::{HouseRun, RunParams, aggregate};

/// Builds a progress sink for the house with the given label.
pub type ProgressFactory<'a> = Box<dyn Fn(&str) -> Arc<dyn ProgressCallback> + Send + Sync + 'a>;

/// Inputs and collaborators for one analysis run.
pub struct AnalysisContext<'a> {
    run_id: String,
    geocoder: &'a dyn Geocoder,
    search: &'a dyn PlaceSearch,
    selection: Selection,
    radius_m: u32,
    extra_keyword: Option<String>,
    throttle: Duration,
    progress: ProgressFactory<'a>,
}

impl<'a> AnalysisContext<'a> {
    /// Creates a context with a fresh run id, [`DEFAULT_THROTTLE`] and no
    /// progress output.
    #[must_use]
    pub fn new(
        geocoder: &'a dyn Geocoder,
        search: &'a dyn PlaceSearch,
        selection: Selection,
        radius_m: u32,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            geocoder,
            search,
            selection,
            radius_m,
            extra_keyword: None,
            throttle: DEFAULT_THROTTLE,
            progress: Box::new(|_: &str| null_progress()),
        }
    }

    /// Adds a free-text keyword searched after the selection.
    #[must_use]
    pub fn with_extra_keyword(mut self, keyword: Option<String>) -> Self {
        self.extra_keyword = keyword;
        self
    }

    /// Sets the delay between consecutive keyword searches.
    #[must_use]
    pub const fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Sets the per-house progress sink factory.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFactory<'a>) -> Self {
        self.progress = progress;
        self
    }

    /// Identifier of this run.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Runs the analysis for `inputs`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NoHouses`] for an empty input list and
    /// [`AnalysisError::DuplicateLabel`] if two inputs share a label.
    /// Per-house geocoding and per-keyword search failures do not fail the
    /// run; they are reported inside the result.
    pub async fn run(&self, inputs: &[HouseInput]) -> Result<AnalysisResult, AnalysisError> {
        if inputs.is_empty() {
            return Err(AnalysisError::NoHouses);
        }

        let mut labels = BTreeSet::new();
        for input in inputs {
            if !labels.insert(input.label.as_str()) {
                return Err(AnalysisError::DuplicateLabel {
                    label: input.label.clone(),
                });
            }
        }

        log::info!(
            "Analysis {}: {} house(s), radius {}m",
            self.run_id,
            inputs.len(),
            self.radius_m
        );

        // One engine per run so the throttle also spans house boundaries.
        let engine = FacilityQueryEngine::new(self.search).with_throttle(self.throttle);

        let mut runs = Vec::new();
        let mut failures = Vec::new();

        for input in inputs {
            match self.run_house(&engine, input).await {
                Ok(run) => runs.push(run),
                Err(reason) => {
                    log::warn!("{}: {reason}", input.label);
                    failures.push(HouseFailure {
                        label: input.label.clone(),
                        address: input.address.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(aggregate(
            RunParams {
                run_id: &self.run_id,
                radius_m: self.radius_m,
                selection: &self.selection,
                extra_keyword: self.extra_keyword.as_deref(),
            },
            runs,
            failures,
        ))
    }

    async fn run_house(
        &self,
        engine: &FacilityQueryEngine<'_>,
        input: &HouseInput,
    ) -> Result<HouseRun, String> {
        let geocoded = self
            .geocoder
            .geocode(&input.address)
            .await
            .map_err(|e| format!("Could not locate '{}': {e}", input.address))?;

        let house = House {
            label: input.label.clone(),
            title: input.title.clone(),
            address: input.address.clone(),
            formatted_address: geocoded.formatted_address,
            coordinate: geocoded.coordinate,
        };

        let progress = (self.progress)(&input.label);
        let query = FacilityQuery {
            origin: house.coordinate,
            selection: self.selection.clone(),
            radius_m: self.radius_m,
            extra_keyword: self.extra_keyword.clone(),
        };
        let report = engine
            .run_with_progress(&query, progress.as_ref())
            .await
            .map_err(|e| e.to_string())?;

        let failed_keywords: Vec<String> = report
            .failed_keywords()
            .into_iter()
            .map(String::from)
            .collect();

        log::info!(
            "{}: {} places within {}m ({} keyword(s) failed)",
            house.label,
            report.places.len(),
            self.radius_m,
            failed_keywords.len()
        );

        Ok(HouseRun {
            house,
            places: report.places,
            failed_keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use house_map_amenity_models::{Category, Coordinate};
    use house_map_geocoder::{GeocodeError, GeocodedAddress};
    use house_map_places::{RawPlace, SearchError, SearchRequest};

    use super::*;

    struct FakeGeocoder {
        known: BTreeMap<String, Coordinate>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        fn new(known: &[(&str, Coordinate)]) -> Self {
            Self {
                known: known
                    .iter()
                    .map(|(a, c)| ((*a).to_string(), *c))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
            self.calls.lock().unwrap().push(address.to_string());
            self.known
                .get(address)
                .map(|c| GeocodedAddress {
                    coordinate: *c,
                    formatted_address: Some(format!("{address}, Taiwan")),
                })
                .ok_or_else(|| GeocodeError::Status {
                    status: "ZERO_RESULTS".to_string(),
                    message: None,
                })
        }
    }

    /// Returns one place per call, placed right at the origin.
    #[derive(Default)]
    struct EchoSearch {
        calls: Mutex<Vec<(String, Coordinate)>>,
    }

    #[async_trait::async_trait]
    impl PlaceSearch for EchoSearch {
        async fn search(
            &self,
            request: &SearchRequest<'_>,
        ) -> Result<Vec<RawPlace>, SearchError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((request.keyword.to_string(), request.origin));
            Ok(vec![RawPlace {
                place_id: format!("{}-{}", request.origin, calls.len()),
                name: request.keyword.to_string(),
                coordinate: request.origin,
                address: None,
            }])
        }
    }

    const A: Coordinate = Coordinate::new(24.1477, 120.6736);
    const B: Coordinate = Coordinate::new(24.1618, 120.6469);

    fn input(label: &str, address: &str) -> HouseInput {
        HouseInput {
            label: label.to_string(),
            title: label.to_string(),
            address: address.to_string(),
        }
    }

    fn shopping() -> Selection {
        let mut selection = Selection::new();
        selection.add(Category::Shopping, ["便利商店", "超市"]);
        selection
    }

    #[tokio::test]
    async fn geocode_failure_skips_only_that_house() {
        let geocoder = FakeGeocoder::new(&[("addr a", A), ("addr b", B)]);
        let search = EchoSearch::default();
        let ctx = AnalysisContext::new(&geocoder, &search, shopping(), 500)
            .with_throttle(Duration::ZERO);

        let result = ctx
            .run(&[
                input("House A", "addr a"),
                input("House X", "nowhere"),
                input("House B", "addr b"),
            ])
            .await
            .unwrap();

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].label, "House X");
        assert!(result.failures[0].reason.contains("ZERO_RESULTS"));

        let labels: Vec<&str> = result.houses.iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, vec!["House A", "House B"]);
        assert!(!result.facility_counts.contains_key("House X"));

        // Two keywords for each of the two located houses; none at "nowhere".
        let calls = search.calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|(_, origin)| *origin == A || *origin == B));
    }

    #[tokio::test]
    async fn houses_run_sequentially_in_input_order() {
        let geocoder = FakeGeocoder::new(&[("addr a", A), ("addr b", B)]);
        let search = EchoSearch::default();
        let ctx = AnalysisContext::new(&geocoder, &search, shopping(), 500)
            .with_throttle(Duration::ZERO);

        let result = ctx
            .run(&[input("House B", "addr b"), input("House A", "addr a")])
            .await
            .unwrap();

        let origins: Vec<Coordinate> = search.calls.lock().unwrap().iter().map(|c| c.1).collect();
        assert_eq!(origins, vec![B, B, A, A]);
        assert_eq!(*geocoder.calls.lock().unwrap(), vec!["addr b", "addr a"]);
        assert_eq!(result.facility_counts["House A"], 2);
        assert_eq!(result.table.len(), 4);
        assert_eq!(result.keywords, vec!["convenience_store", "supermarket"]);
    }

    #[tokio::test]
    async fn houses_keep_the_geocoded_address() {
        let geocoder = FakeGeocoder::new(&[("addr a", A)]);
        let search = EchoSearch::default();
        let ctx = AnalysisContext::new(&geocoder, &search, shopping(), 500)
            .with_throttle(Duration::ZERO);

        let result = ctx.run(&[input("House A", "addr a")]).await.unwrap();

        let house = &result.houses[0];
        assert_eq!(house.address, "addr a");
        assert_eq!(house.formatted_address.as_deref(), Some("addr a, Taiwan"));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_spans_house_boundaries() {
        let geocoder = FakeGeocoder::new(&[("addr a", A), ("addr b", B)]);
        let search = EchoSearch::default();
        let mut selection = Selection::new();
        selection.add(Category::Shopping, ["便利商店"]);
        let ctx = AnalysisContext::new(&geocoder, &search, selection, 500)
            .with_throttle(Duration::from_millis(300));

        let start = tokio::time::Instant::now();
        ctx.run(&[input("House A", "addr a"), input("House B", "addr b")])
            .await
            .unwrap();

        // One keyword per house; the second house still waits its turn.
        assert_eq!(search.calls.lock().unwrap().len(), 2);
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn empty_selection_geocodes_but_never_searches() {
        let geocoder = FakeGeocoder::new(&[("addr a", A)]);
        let search = EchoSearch::default();
        let ctx = AnalysisContext::new(&geocoder, &search, Selection::new(), 500)
            .with_throttle(Duration::ZERO);

        let result = ctx.run(&[input("House A", "addr a")]).await.unwrap();

        assert!(search.calls.lock().unwrap().is_empty());
        assert_eq!(result.facility_counts["House A"], 0);
        assert!(result.table.is_empty());
    }

    #[tokio::test]
    async fn rejects_empty_and_duplicate_inputs() {
        let geocoder = FakeGeocoder::new(&[]);
        let search = EchoSearch::default();
        let ctx = AnalysisContext::new(&geocoder, &search, shopping(), 500);

        assert!(matches!(ctx.run(&[]).await, Err(AnalysisError::NoHouses)));
        assert!(matches!(
            ctx.run(&[input("House A", "x"), input("House A", "y")]).await,
            Err(AnalysisError::DuplicateLabel { .. })
        ));
        assert!(geocoder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn each_run_builds_a_fresh_result() {
        let geocoder = FakeGeocoder::new(&[("addr a", A)]);
        let search = EchoSearch::default();
        let ctx = AnalysisContext::new(&geocoder, &search, shopping(), 500)
            .with_throttle(Duration::ZERO);

        let first = ctx.run(&[input("House A", "addr a")]).await.unwrap();
        let second = ctx.run(&[input("House A", "addr a")]).await.unwrap();

        assert_eq!(first.facility_counts, second.facility_counts);
        assert_eq!(first.table.len(), second.table.len());
        assert_eq!(first.run_id, ctx.run_id());
    }
}
