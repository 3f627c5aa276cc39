//! Google Places Text Search client.
//!
//! Issues one request per keyword with the origin as `location` and the
//! radius as a bias. `next_page_token` is ignored, so at most one page
//! (20 rows) comes back per keyword. Rows lacking a place id or location
//! are skipped.
//!
//! See <https://developers.google.com/maps/documentation/places/web-service/search-text>

use std::time::Duration;

use house_map_amenity_models::{ApiKey, Coordinate, credential::MAPS_API_KEY_ENV};

use crate::service_registry::{PlacesService, default_service};
use crate::{PlaceSearch, RawPlace, SearchError, SearchRequest};

/// Place search backed by the Google Places Text Search API.
pub struct GooglePlacesClient {
    client: reqwest::Client,
    api_key: ApiKey,
    service: PlacesService,
}

impl GooglePlacesClient {
    /// Creates a client for `service` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: ApiKey, service: PlacesService) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(service.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            service,
        })
    }

    /// Creates a client with the embedded service config and the key in
    /// `GOOGLE_MAPS_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Credential`] if the key is missing or
    /// malformed; no request is made in that case.
    pub fn from_env() -> Result<Self, SearchError> {
        let api_key = ApiKey::from_env(MAPS_API_KEY_ENV)?;
        Self::new(api_key, default_service())
    }

    /// The configured inter-request throttle.
    #[must_use]
    pub const fn throttle(&self) -> Duration {
        self.service.throttle()
    }
}

#[async_trait::async_trait]
impl PlaceSearch for GooglePlacesClient {
    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawPlace>, SearchError> {
        let location = format!(
            "{},{}",
            request.origin.latitude, request.origin.longitude
        );
        let radius = request.radius_m.to_string();

        let resp = self
            .client
            .get(&self.service.base_url)
            .query(&[
                ("query", request.keyword),
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("language", self.service.language.as_str()),
                ("key", self.api_key.expose()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SearchError::Status {
                status: resp.status().to_string(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Text Search JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Vec<RawPlace>, SearchError> {
    let status = body["status"].as_str().ok_or_else(|| SearchError::Parse {
        message: "Place search response missing 'status'".to_string(),
    })?;

    match status {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(Vec::new()),
        other => {
            return Err(SearchError::Status {
                status: other.to_string(),
            });
        }
    }

    let results = body["results"]
        .as_array()
        .ok_or_else(|| SearchError::Parse {
            message: "Place search response missing 'results' array".to_string(),
        })?;

    Ok(results.iter().filter_map(parse_row).collect())
}

fn parse_row(row: &serde_json::Value) -> Option<RawPlace> {
    let place_id = row["place_id"].as_str().filter(|s| !s.is_empty());
    let location = &row["geometry"]["location"];
    let (Some(place_id), Some(lat), Some(lng)) = (
        place_id,
        location["lat"].as_f64(),
        location["lng"].as_f64(),
    ) else {
        log::debug!("Skipping place row without id or location: {row}");
        return None;
    };

    let address = row["formatted_address"]
        .as_str()
        .or_else(|| row["vicinity"].as_str())
        .map(String::from);

    Some(RawPlace {
        place_id: place_id.to_string(),
        name: row["name"].as_str().unwrap_or_default().to_string(),
        coordinate: Coordinate::new(lat, lng),
        address,
    })
}
