//! Google Geocoding API client.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use livability_score_models::Coordinates;
use serde::Deserialize;

use crate::{GeocodeError, Geocoder};

/// Default Geocoding API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Geocoder backed by the Google Geocoding API.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    /// Creates a client against the public endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Points the client at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl Geocoder for GoogleGeocoder {
    async fn resolve(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        log::debug!("Geocoding '{query}'");

        let body: serde_json::Value = self
            .client
            .get(&self.base_url)
            .query(&[("address", query), ("key", self.api_key.as_str())])
            .send()
            .await?
            .json()
            .await?;

        parse_response(&body)
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Parses a Geocoding API response body.
///
/// `OK` yields the first result's location and `ZERO_RESULTS` yields
/// `None`; any other status is an error.
fn parse_response(body: &serde_json::Value) -> Result<Option<Coordinates>, GeocodeError> {
    let response =
        GeocodeResponse::deserialize(body).map_err(|e| GeocodeError::Parse {
            message: format!("Unexpected geocoding response: {e}"),
        })?;

    match response.status.as_str() {
        "OK" => Ok(response
            .results
            .first()
            .map(|r| Coordinates::new(r.geometry.location.lat, r.geometry.location.lng))),
        "ZERO_RESULTS" => Ok(None),
        _ => Err(GeocodeError::Status {
            status: response.status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result() {
        let body = serde_json::json!({
            "status": "OK",
            "results": [
                {"geometry": {"location": {"lat": 13.0827, "lng": 80.2707}}},
                {"geometry": {"location": {"lat": 1.0, "lng": 2.0}}}
            ]
        });
        let coords = parse_response(&body).unwrap().unwrap();
        assert!((coords.latitude - 13.0827).abs() < 1e-9);
        assert!((coords.longitude - 80.2707).abs() < 1e-9);
    }

    #[test]
    fn zero_results_is_none() {
        let body = serde_json::json!({"status": "ZERO_RESULTS", "results": []});
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn denied_request_is_an_error() {
        let body = serde_json::json!({"status": "REQUEST_DENIED", "error_message": "bad key"});
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Status { status }) if status == "REQUEST_DENIED"
        ));
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        let body = serde_json::json!([1, 2, 3]);
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }
}
