//! Google Places Nearby Search client.
//!
//! See <https://developers.google.com/maps/documentation/places/web-service/search-nearby>

use livability_score_models::Coordinates;
use serde::Deserialize;

use crate::{PlacesError, PlacesSearch};

/// Default Nearby Search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Facility search backed by the Google Places API.
///
/// Only the first page of results is read, so at most 20 facilities are
/// returned per search.
pub struct GooglePlaces {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GooglePlaces {
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
impl PlacesSearch for GooglePlaces {
    async fn search(
        &self,
        center: Coordinates,
        category: &str,
        radius_m: f64,
    ) -> Result<Vec<Coordinates>, PlacesError> {
        let location = format!("{},{}", center.latitude, center.longitude);
        let radius = format!("{radius_m}");

        log::debug!("Searching for '{category}' within {radius}m of {location}");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("type", category),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlacesError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

#[derive(Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Deserialize)]
struct Place {
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

/// Extracts result locations.
///
/// `OK` and `ZERO_RESULTS` yield the listed results (a missing `results`
/// array means none); any other status is an error.
fn parse_response(body: &serde_json::Value) -> Result<Vec<Coordinates>, PlacesError> {
    let response = NearbyResponse::deserialize(body).map_err(|e| PlacesError::Parse {
        message: format!("Unexpected places response: {e}"),
    })?;

    if !matches!(response.status.as_str(), "OK" | "ZERO_RESULTS") {
        return Err(PlacesError::ApiStatus {
            status: response.status,
            message: response.error_message.unwrap_or_default(),
        });
    }

    Ok(response
        .results
        .into_iter()
        .map(|p| Coordinates::new(p.geometry.location.lat, p.geometry.location.lng))
        .collect())
}
