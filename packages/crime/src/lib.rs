#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District crime severity scoring.
//!
//! Each district row carries incident counts for a handful of accident
//! categories. The score is a fixed weighted sum of those counts, scaled
//! against a nominal maximum of [`MAX_WEIGHTED_SCORE`] so realistic data
//! lands in roughly `0..=100`.

use livability_dataset::{Row, Table};
use livability_score_models::{CrimeScore, ScoreError, ScoreResult};

/// Column holding the district name.
pub const DISTRICT_COLUMN: &str = "District";

/// Weighted sum that maps to a score of 100.
pub const MAX_WEIGHTED_SCORE: f64 = 1000.0;

/// Incident features that contribute to the crime score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrimeFeature {
    /// Deaths due to negligence relating to road accidents.
    RoadAccidentDeaths,
    /// Hit and run incidents.
    HitAndRun,
    /// All other accidents.
    OtherAccidents,
}

impl CrimeFeature {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::RoadAccidentDeaths, Self::HitAndRun, Self::OtherAccidents]
    }

    /// Source column name in the crime dataset.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::RoadAccidentDeaths => "Death due to negligence relating to road accidents - I",
            Self::HitAndRun => "Hit and Run - I",
            Self::OtherAccidents => "Other Accidents - I",
        }
    }

    /// Contribution weight. Weights sum to 1.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::RoadAccidentDeaths => 0.5,
            Self::HitAndRun => 0.3,
            Self::OtherAccidents => 0.2,
        }
    }

    /// Reads this feature from a row; missing or invalid cells count as 0.
    fn value(self, row: &Row<'_>) -> f64 {
        row.numeric(self.column()).unwrap_or(0.0)
    }
}

/// Scores districts against an immutable crime incident table.
pub struct CrimeScorer<'a> {
    table: &'a Table,
}

impl<'a> CrimeScorer<'a> {
    /// Creates a scorer over a loaded crime table.
    #[must_use]
    pub const fn new(table: &'a Table) -> Self {
        Self { table }
    }

    /// Scores a district by exact name.
    ///
    /// # Errors
    ///
    /// * [`ScoreError::NotFound`] if no row matches the district.
    /// * [`ScoreError::InsufficientData`] if every feature is zero or missing.
    pub fn score(&self, district: &str) -> ScoreResult<CrimeScore> {
        let row = self
            .table
            .find_row(DISTRICT_COLUMN, district)
            .ok_or_else(|| ScoreError::not_found("district not found"))?;

        let values: Vec<(CrimeFeature, f64)> = CrimeFeature::all()
            .iter()
            .map(|&f| (f, f.value(&row)))
            .collect();

        if values.iter().map(|(_, v)| v).sum::<f64>() == 0.0 {
            log::debug!("District '{district}' has no usable crime counts");
            return Err(ScoreError::insufficient_data("insufficient data"));
        }

        let weighted: f64 = values.iter().map(|(f, v)| v * f.weight()).sum();
        let crime_score = round_to(weighted / MAX_WEIGHTED_SCORE * 100.0, 2);

        Ok(CrimeScore {
            district: district.to_owned(),
            crime_score,
        })
    }

    /// Every district name in table order.
    #[must_use]
    pub fn districts(&self) -> Vec<String> {
        self.table
            .rows()
            .filter_map(|row| row.get_non_empty(DISTRICT_COLUMN).map(str::to_owned))
            .collect()
    }
}

/// Rounds half away from zero to `places` decimal places.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
