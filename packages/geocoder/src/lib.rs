#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for livability scoring.
//!
//! Resolves free-form place queries (Indian pincodes in practice) to WGS84
//! coordinates behind the [`Geocoder`] trait. The shipped implementation is
//! [`google::GoogleGeocoder`], which calls the Google Geocoding API.

pub mod google;

use std::collections::HashMap;

use livability_score_models::Coordinates;
use thiserror::Error;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service rejected the request.
    #[error("Geocoding service returned status {status}")]
    Status {
        /// Status string reported by the service.
        status: String,
    },
}

/// Resolves a place query to coordinates.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Looks up `query`, returning `Ok(None)` when the service has no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn resolve(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// Fixed lookup table, for offline runs and tests.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, Coordinates>,
}

impl StaticGeocoder {
    /// Creates a geocoder answering from `entries`.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (String, Coordinates)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl Geocoder for StaticGeocoder {
    async fn resolve(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        Ok(self.entries.get(query.trim()).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_geocoder_matches_trimmed_queries() {
        let geocoder = StaticGeocoder::new([(
            "600001".to_string(),
            Coordinates::new(13.0827, 80.2707),
        )]);
        let hit = geocoder.resolve(" 600001 ").await.unwrap().unwrap();
        assert!((hit.latitude - 13.0827).abs() < 1e-12);
        assert!(geocoder.resolve("000000").await.unwrap().is_none());
    }
}
