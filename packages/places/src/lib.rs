#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Nearby facility search.
//!
//! [`PlacesSearch`] returns the locations of facilities of one category
//! within a radius of a point. [`google::GooglePlaces`] implements it with
//! the Google Places Nearby Search API; [`StaticPlaces`] answers from a
//! fixed table.

pub mod google;

use std::collections::HashMap;

use livability_score_models::Coordinates;
use thiserror::Error;

/// Errors from facility searches.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status code.
    #[error("API request failed with status code {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },

    /// The service answered with an error status in the response body.
    #[error("Places API returned {status}: {message}")]
    ApiStatus {
        /// Status field of the response, e.g. `REQUEST_DENIED`.
        status: String,
        /// Accompanying `error_message`, if any.
        message: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Finds facilities of a category near a point.
#[async_trait::async_trait]
pub trait PlacesSearch: Send + Sync {
    /// Returns the location of every `category` facility within `radius_m`
    /// metres of `center`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the search cannot be completed.
    async fn search(
        &self,
        center: Coordinates,
        category: &str,
        radius_m: f64,
    ) -> Result<Vec<Coordinates>, PlacesError>;
}

/// Answers every search for a category with the same fixed locations,
/// ignoring the center and radius.
#[derive(Debug, Default)]
pub struct StaticPlaces {
    by_category: HashMap<String, Vec<Coordinates>>,
}

impl StaticPlaces {
    /// Creates a search over `entries`. Unlisted categories have no
    /// facilities.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (String, Vec<Coordinates>)>) -> Self {
        Self {
            by_category: entries.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl PlacesSearch for StaticPlaces {
    async fn search(
        &self,
        _center: Coordinates,
        category: &str,
        _radius_m: f64,
    ) -> Result<Vec<Coordinates>, PlacesError> {
        Ok(self.by_category.get(category).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_places_returns_listed_category_only() {
        let places = StaticPlaces::new([(
            "hospital".to_string(),
            vec![Coordinates::new(13.0, 80.0)],
        )]);
        let center = Coordinates::new(13.0, 80.0);
        assert_eq!(places.search(center, "hospital", 500.0).await.unwrap().len(), 1);
        assert!(places.search(center, "airport", 500.0).await.unwrap().is_empty());
    }
}
