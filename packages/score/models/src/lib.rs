#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the livability scoring pipeline.
//!
//! Every scorer returns a [`ScoreResult`]: either its component-specific
//! output or a [`ScoreError`] drawn from a small fixed taxonomy. Errors are
//! plain data here; nothing in the pipeline lets a raw fault escape a
//! component boundary.

pub mod progress;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Number of future periods every disaster forecast contains.
pub const FORECAST_HORIZON: usize = 10;

/// Neutral value substituted for any component that failed.
pub const FALLBACK_SCORE: f64 = 0.0;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within WGS84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Structured failure returned by a scorer instead of a score.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreError {
    /// The identifier is absent from the reference data.
    #[error("{message}")]
    NotFound {
        /// Human-readable reason.
        message: String,
        /// Known identifiers, when the scorer can enumerate them.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        available: Vec<String>,
    },

    /// Every relevant feature for the identifier is zero or missing.
    #[error("{message}")]
    InsufficientData {
        /// Human-readable reason.
        message: String,
    },

    /// A geocoding or places call failed or returned a non-success status.
    #[error("{message}: {detail}")]
    ExternalService {
        /// Human-readable reason.
        message: String,
        /// Underlying fault description.
        detail: String,
    },

    /// A numeric step could not be completed.
    #[error("{message}")]
    Computation {
        /// Human-readable reason.
        message: String,
    },
}

impl ScoreError {
    /// Shorthand for a [`ScoreError::NotFound`] without a list of
    /// alternatives.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            available: Vec::new(),
        }
    }

    /// Shorthand for [`ScoreError::InsufficientData`].
    #[must_use]
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }

    /// Shorthand for [`ScoreError::ExternalService`].
    #[must_use]
    pub fn external(message: impl Into<String>, detail: impl ToString) -> Self {
        Self::ExternalService {
            message: message.into(),
            detail: detail.to_string(),
        }
    }
}

/// Outcome of a single scoring component.
pub type ScoreResult<T> = Result<T, ScoreError>;

/// The scoring components that feed the aggregate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoreComponent {
    /// Historical crime severity.
    Crime,
    /// Disaster-risk safety rating.
    Disaster,
    /// Nearby development-project impact.
    PriceProximity,
    /// Projected house price growth.
    HouseGrowth,
    /// Amenity proximity.
    Proximity,
}

/// Disaster categories tracked by the disaster reference tables.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "PascalCase")]
pub enum DisasterCategory {
    /// All disasters combined.
    Total,
    /// Earthquakes.
    Earthquakes,
    /// Floods.
    Floods,
    /// Cyclones.
    Cyclones,
}

impl DisasterCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Total, Self::Earthquakes, Self::Floods, Self::Cyclones]
    }

    /// Flat safety-rating penalty applied when a district has any recorded
    /// event of this category.
    #[must_use]
    pub const fn presence_penalty(self) -> f64 {
        match self {
            Self::Total => 0.0,
            Self::Floods => 10.0,
            Self::Cyclones => 9.0,
            Self::Earthquakes => 7.0,
        }
    }
}

/// A fixed-horizon sequence of predicted counts.
///
/// The variant records which path produced the values so callers and
/// tests can tell a fitted model apart from the historical-mean fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "values", rename_all = "snake_case")]
pub enum Forecast {
    /// The time-series model fitted and produced these values.
    Fitted(Vec<u32>),
    /// History was too short or the fit failed; values are the mean.
    MeanFallback(Vec<u32>),
}

impl Forecast {
    /// Returns the predicted values regardless of how they were produced.
    #[must_use]
    pub fn values(&self) -> &[u32] {
        match self {
            Self::Fitted(values) | Self::MeanFallback(values) => values,
        }
    }

    /// Whether the historical-mean fallback produced this forecast.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::MeanFallback(_))
    }
}

/// Output of the crime scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeScore {
    /// District the score was computed for.
    pub district: String,
    /// Weighted incident score, rounded to 2 decimals.
    pub crime_score: f64,
}

/// Output of the disaster scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterOutlook {
    /// District the rating was computed for.
    pub district: String,
    /// Safety rating in `[1, 100]`, rounded to 2 decimals.
    pub safety_rating: f64,
    /// Forecast per disaster category.
    pub predictions: BTreeMap<DisasterCategory, Forecast>,
}

/// Output of the house price growth scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthScore {
    /// Area name as it appears in the sales data.
    pub city: String,
    /// Projected percentage price change, rounded to an integer.
    pub growth_score: i64,
    /// Historical mean price divided by mean interior area.
    pub original_price_per_sqft: f64,
    /// Projected mean price divided by mean interior area.
    pub future_price_per_sqft: f64,
}

/// Output of the development-proximity price scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceScore {
    /// Distance-decayed development impact in `[0, 100]`.
    pub price_score: f64,
    /// Names of projects that contributed to the score.
    pub nearby: Vec<String>,
    /// Rendered map artifact, when rendering succeeded.
    pub map_file: Option<PathBuf>,
}

/// Output of the amenity proximity scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityScore {
    /// Weighted amenity score in `[0, 100]`.
    pub proximity_score: u8,
}

/// Combined result handed back to the request layer.
///
/// Every component field is always numeric; failed components carry
/// [`FALLBACK_SCORE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateScore {
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
    /// Historical price per square foot from the growth scorer.
    pub original_price_per_sqft: f64,
    /// Projected price per square foot from the growth scorer.
    pub future_price_per_sqft: f64,
    /// Mean of the four averaged components.
    pub final_score: f64,
    /// Published map artifact, if one was produced.
    pub map_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_bounds() {
        assert!(Coordinates::new(13.08, 80.27).is_valid());
        assert!(Coordinates::new(-90.0, 180.0).is_valid());
        assert!(!Coordinates::new(90.5, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -181.0).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn score_error_serializes_with_kind_tag() {
        let err = ScoreError::not_found("district not found");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["message"], "district not found");
        assert!(json.get("available").is_none());
    }

    #[test]
    fn external_error_display_includes_detail() {
        let err = ScoreError::external("proximity calculation failed", "HTTP 500");
        assert_eq!(err.to_string(), "proximity calculation failed: HTTP 500");
    }

    #[test]
    fn disaster_category_names_match_table_labels() {
        let names: Vec<String> = DisasterCategory::all()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, ["Total", "Earthquakes", "Floods", "Cyclones"]);
        assert_eq!(
            "Floods".parse::<DisasterCategory>().unwrap(),
            DisasterCategory::Floods
        );
    }

    #[test]
    fn forecast_values_ignore_variant() {
        let fitted = Forecast::Fitted(vec![1, 2]);
        let fallback = Forecast::MeanFallback(vec![1, 2]);
        assert_eq!(fitted.values(), fallback.values());
        assert!(!fitted.is_fallback());
        assert!(fallback.is_fallback());
    }
}
