#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! District disaster safety rating and count forecasting.
//!
//! Four reference tables share one layout: a `Year` column followed by one
//! column per district. The aggregate table's first row holds each
//! district's total disaster count; the category tables (earthquakes,
//! floods, cyclones) record yearly events, and a district "has" a category
//! when any year is non-missing.
//!
//! [`DisasterIndex::build`] precomputes totals, occurrence counts and a
//! [`FORECAST_HORIZON`]-step forecast per district and category once at
//! start-up. [`DisasterScorer`] then answers requests from that index.

pub mod arima;
pub mod forecast;

use std::collections::BTreeMap;

use livability_dataset::{DatasetError, Table};
use livability_score_models::{
    DisasterCategory, DisasterOutlook, FORECAST_HORIZON, Forecast, ScoreError, ScoreResult,
};

use crate::forecast::{ForecastModel, forecast_series};

/// Row-index column shared by every disaster table.
pub const YEAR_COLUMN: &str = "Year";

/// Lowest and highest safety rating.
pub const RATING_RANGE: (f64, f64) = (1.0, 100.0);

/// The four disaster reference tables.
#[derive(Debug, Clone, Default)]
pub struct DisasterTables {
    /// All disasters combined; first row holds per-district totals.
    pub all: Table,
    /// Yearly earthquake records.
    pub earthquakes: Table,
    /// Yearly flood records.
    pub floods: Table,
    /// Yearly cyclone records.
    pub cyclones: Table,
}

impl DisasterTables {
    /// Returns the table holding a category's records.
    #[must_use]
    pub const fn table(&self, category: DisasterCategory) -> &Table {
        match category {
            DisasterCategory::Total => &self.all,
            DisasterCategory::Earthquakes => &self.earthquakes,
            DisasterCategory::Floods => &self.floods,
            DisasterCategory::Cyclones => &self.cyclones,
        }
    }
}

/// Precomputed figures for one district.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictDisasters {
    /// Total disaster count from the aggregate table.
    pub total: f64,
    /// Years with a recorded event, per category (excluding `Total`).
    pub occurrences: BTreeMap<DisasterCategory, usize>,
    /// Forecast per category.
    pub predictions: BTreeMap<DisasterCategory, Forecast>,
}

/// Immutable per-district disaster figures built once at start-up.
#[derive(Debug, Clone, Default)]
pub struct DisasterIndex {
    districts: BTreeMap<String, DistrictDisasters>,
    order: Vec<String>,
    max_total: f64,
}

/// District columns of a yearly disaster table, in column order.
#[must_use]
pub fn district_names(table: &Table) -> Vec<String> {
    table
        .headers()
        .iter()
        .filter(|h| h.as_str() != YEAR_COLUMN && !h.is_empty())
        .cloned()
        .collect()
}

impl DisasterIndex {
    /// Builds the index, fitting a forecast for every district and category.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingColumn`] if the aggregate table has no
    /// `Year` column.
    pub fn build(tables: &DisasterTables, model: &dyn ForecastModel) -> Result<Self, DatasetError> {
        tables.all.require_column(YEAR_COLUMN)?;

        let order = district_names(&tables.all);

        let mut districts = BTreeMap::new();
        let mut fallbacks = 0usize;

        for district in &order {
            let total = tables
                .all
                .rows()
                .next()
                .and_then(|row| row.numeric(district))
                .unwrap_or(0.0);

            let occurrences = DisasterCategory::all()
                .iter()
                .filter(|&&c| c != DisasterCategory::Total)
                .map(|&c| (c, occurrence_count(tables.table(c), district)))
                .collect();

            let predictions: BTreeMap<DisasterCategory, Forecast> = DisasterCategory::all()
                .iter()
                .map(|&c| {
                    let series = yearly_series(tables.table(c), district);
                    (c, forecast_series(model, &series, FORECAST_HORIZON))
                })
                .collect();

            fallbacks += predictions.values().filter(|f| f.is_fallback()).count();

            districts.insert(
                district.clone(),
                DistrictDisasters {
                    total,
                    occurrences,
                    predictions,
                },
            );
        }

        let max_total = districts
            .values()
            .map(|d| d.total)
            .fold(0.0_f64, f64::max);

        log::info!(
            "Built disaster index for {} districts ({fallbacks} forecasts used the mean fallback)",
            districts.len()
        );

        Ok(Self {
            districts,
            order,
            max_total,
        })
    }

    /// Figures for one district, by exact name.
    #[must_use]
    pub fn get(&self, district: &str) -> Option<&DistrictDisasters> {
        self.districts.get(district)
    }

    /// District names in table column order.
    #[must_use]
    pub fn districts(&self) -> &[String] {
        &self.order
    }

    /// Largest district total across the table.
    #[must_use]
    pub const fn max_total(&self) -> f64 {
        self.max_total
    }
}

/// Non-missing cells in a district's column; 0 if the column is absent.
fn occurrence_count(table: &Table, district: &str) -> usize {
    table
        .numeric_column(district)
        .map_or(0, |col| col.iter().flatten().count())
}

/// A district's yearly values in row order, with missing years as 0.
fn yearly_series(table: &Table, district: &str) -> Vec<f64> {
    table
        .numeric_column(district)
        .map(|col| col.into_iter().map(|v| v.unwrap_or(0.0)).collect())
        .unwrap_or_default()
}

/// Inverted, penalty-adjusted disaster frequency score in `[1, 100]`.
#[must_use]
pub fn safety_rating(district: &DistrictDisasters, max_total: f64) -> f64 {
    let base = if max_total > 0.0 {
        100.0 - district.total / max_total * 100.0
    } else {
        100.0
    };

    let penalty: f64 = district
        .occurrences
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(category, _)| category.presence_penalty())
        .sum();

    let rating = (base - penalty).clamp(RATING_RANGE.0, RATING_RANGE.1);
    (rating * 100.0).round() / 100.0
}

/// Answers safety-rating requests from a prebuilt [`DisasterIndex`].
pub struct DisasterScorer<'a> {
    index: &'a DisasterIndex,
}

impl<'a> DisasterScorer<'a> {
    /// Creates a scorer over a built index.
    #[must_use]
    pub const fn new(index: &'a DisasterIndex) -> Self {
        Self { index }
    }

    /// Returns the safety rating and forecasts for a district.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::NotFound`] if the district is not a column of
    /// the aggregate table.
    pub fn score(&self, district: &str) -> ScoreResult<DisasterOutlook> {
        let figures = self
            .index
            .get(district)
            .ok_or_else(|| ScoreError::not_found("district not found"))?;

        Ok(DisasterOutlook {
            district: district.to_owned(),
            safety_rating: safety_rating(figures, self.index.max_total()),
            predictions: figures.predictions.clone(),
        })
    }
}
