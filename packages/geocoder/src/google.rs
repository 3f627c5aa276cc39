//! Google Geocoding API client.
//!
//! Sends one request per address and uses only the first result. Any
//! status other than `OK` (including `ZERO_RESULTS`) is a failure; there
//! is no retry and no caching.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use std::time::Duration;

use house_map_amenity_models::{ApiKey, Coordinate, credential::MAPS_API_KEY_ENV};

use crate::service_registry::{GeocodingService, default_service};
use crate::{GeocodeError, GeocodedAddress, Geocoder};

/// Geocoder backed by the Google Geocoding API.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: ApiKey,
    service: GeocodingService,
}

impl GoogleGeocoder {
    /// Creates a geocoder for `service` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: ApiKey, service: GeocodingService) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(service.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            service,
        })
    }

    /// Creates a geocoder with the embedded service config and the key in
    /// `GOOGLE_MAPS_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Credential`] if the key is missing or
    /// malformed; no request is made in that case.
    pub fn from_env() -> Result<Self, GeocodeError> {
        let api_key = ApiKey::from_env(MAPS_API_KEY_ENV)?;
        Self::new(api_key, default_service())
    }
}

#[async_trait::async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        let mut params = vec![
            ("address", address),
            ("language", self.service.language.as_str()),
            ("key", self.api_key.expose()),
        ];
        if let Some(region) = &self.service.region {
            params.push(("region", region.as_str()));
        }

        let resp = self
            .client
            .get(&self.service.base_url)
            .query(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                status: resp.status().to_string(),
                message: None,
            });
        }

        let body: serde_json::Value = resp.json().await?;
        let result = parse_response(&body)?;
        log::debug!("Geocoded '{address}' to {}", result.coordinate);
        Ok(result)
    }
}

/// Parses a Geocoding API JSON response.
fn parse_response(body: &serde_json::Value) -> Result<GeocodedAddress, GeocodeError> {
    let status = body["status"].as_str().ok_or_else(|| GeocodeError::Parse {
        message: "Geocoding response missing 'status'".to_string(),
    })?;

    if status != "OK" {
        return Err(GeocodeError::Status {
            status: status.to_string(),
            message: body["error_message"].as_str().map(String::from),
        });
    }

    let first = body["results"]
        .as_array()
        .and_then(|results| results.first())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Geocoding response has status OK but no results".to_string(),
        })?;

    let location = &first["geometry"]["location"];

    let lat = location["lat"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing geometry.location.lat in geocoding response".to_string(),
    })?;
    let lng = location["lng"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "Missing geometry.location.lng in geocoding response".to_string(),
    })?;

    Ok(GeocodedAddress {
        coordinate: Coordinate::new(lat, lng),
        formatted_address: first["formatted_address"].as_str().map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result() {
        let body = serde_json::json!({
            "status": "OK",
            "results": [
                {
                    "formatted_address": "407台灣台中市西屯區台灣大道三段99號",
                    "geometry": { "location": { "lat": 24.1618, "lng": 120.6469 } }
                },
                {
                    "formatted_address": "somewhere else",
                    "geometry": { "location": { "lat": 0.0, "lng": 0.0 } }
                }
            ]
        });
        let result = parse_response(&body).unwrap();
        assert!((result.coordinate.latitude - 24.1618).abs() < 1e-6);
        assert!((result.coordinate.longitude - 120.6469).abs() < 1e-6);
        assert_eq!(
            result.formatted_address.as_deref(),
            Some("407台灣台中市西屯區台灣大道三段99號")
        );
    }

    #[test]
    fn zero_results_is_a_failure() {
        let body = serde_json::json!({ "status": "ZERO_RESULTS", "results": [] });
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Status { ref status, .. } if status == "ZERO_RESULTS"));
    }

    #[test]
    fn denied_status_carries_error_message() {
        let body = serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        });
        match parse_response(&body).unwrap_err() {
            GeocodeError::Status { status, message } => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message.as_deref(), Some("The provided API key is invalid."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_location_is_parse_error() {
        let body = serde_json::json!({
            "status": "OK",
            "results": [{ "geometry": {} }]
        });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn from_env_without_key_fails_before_any_request() {
        // Safety: test-only; no other test in this crate reads this var.
        unsafe {
            std::env::remove_var(MAPS_API_KEY_ENV);
        }
        assert!(matches!(
            GoogleGeocoder::from_env(),
            Err(GeocodeError::Credential(_))
        ));
    }
}
