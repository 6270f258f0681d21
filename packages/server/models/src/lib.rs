#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the livability server.
//!
//! Kept separate from the scoring types so the HTTP contract can evolve
//! independently.

use livability_score_models::{AggregateScore, Coordinates};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Body of `POST /api/predict`, as form fields or JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictRequest {
    /// District name for the crime score.
    pub crime_district: String,
    /// District name for the disaster safety rating.
    pub disaster_district: String,
    /// Pincode for the development-proximity score.
    pub pincode: String,
    /// Area name for the house price growth score.
    pub city: String,
    /// Latitude for the amenity proximity score.
    pub lat: f64,
    /// Longitude for the amenity proximity score.
    pub lng: f64,
}

impl PredictRequest {
    /// Location for the amenity proximity score.
    #[must_use]
    pub const fn location(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Response of `POST /api/predict`.
///
/// Carries the score fields of [`AggregateScore`] but not its map file
/// path, which is local to the server; clients use `map_url` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPrediction {
    /// Crime component.
    pub crime_score: f64,
    /// Disaster safety rating. Reported but not averaged.
    pub safety_rating: f64,
    /// Development-proximity component.
    pub price_score: f64,
    /// House growth component.
    pub growth_score: f64,
    /// Amenity proximity component.
    pub proximity_score: f64,
    /// Historical price per square foot.
    pub original_price_per_sqft: f64,
    /// Projected price per square foot.
    pub future_price_per_sqft: f64,
    /// Mean of the four averaged components.
    pub final_score: f64,
    /// URL the published map is served at, if one was produced.
    pub map_url: Option<String>,
}

impl ApiPrediction {
    /// Builds the response for `score`, exposing the map only as `map_url`.
    #[must_use]
    pub const fn new(score: &AggregateScore, map_url: Option<String>) -> Self {
        Self {
            crime_score: score.crime_score,
            safety_rating: score.safety_rating,
            price_score: score.price_score,
            growth_score: score.growth_score,
            proximity_score: score.proximity_score,
            original_price_per_sqft: score.original_price_per_sqft,
            future_price_per_sqft: score.future_price_per_sqft,
            final_score: score.final_score,
            map_url,
        }
    }
}

/// Error body returned for rejected requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable description.
    pub error: String,
}
