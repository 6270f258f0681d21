#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area price growth projection.
//!
//! A [`PriceModel`] is trained once at start-up from historical sales: a
//! random forest predicting sale price from structural features and year
//! offsets. [`GrowthScorer`] then projects an area's sales
//! [`PROJECTION_YEARS`] into the future by extrapolating each structural
//! feature along its historical linear trend, and reports the projected
//! percentage price change.

pub mod forest;
pub mod sales;
pub mod vocabulary;

use std::sync::Arc;

use livability_dataset::DatasetError;
use livability_score_models::progress::ProgressCallback;
use livability_score_models::{GrowthScore, ScoreError, ScoreResult};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::forest::{ForestParams, RandomForest, r_squared};
use crate::sales::{Feature, SaleRecord, SalesData};

/// How far ahead prices are projected.
pub const PROJECTION_YEARS: f64 = 10.0;

/// Share of sales held out to measure model fit.
pub const HOLDOUT_FRACTION: f64 = 0.2;

/// Errors from preparing sales data or training the price model.
#[derive(Debug, Error)]
pub enum HouseError {
    /// The sales table could not be read.
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// No usable sales rows remained after preparation.
    #[error("No usable sales rows to train on")]
    NoTrainingData,
}

/// Trained price model together with the data it was trained on.
pub struct PriceModel {
    data: SalesData,
    forest: RandomForest,
    holdout_r2: Option<f64>,
}

impl PriceModel {
    /// Trains the forest on a seeded train/holdout split of `data` and
    /// records the holdout R².
    #[must_use]
    pub fn train(
        data: SalesData,
        params: &ForestParams,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Self {
        let (train, holdout) = split_indices(data.records().len(), params.seed);

        let x: Vec<Vec<f64>> = train
            .iter()
            .map(|&i| data.records()[i].features.to_vec())
            .collect();
        let y: Vec<f64> = train.iter().map(|&i| data.records()[i].price).collect();

        let forest = RandomForest::fit(&x, &y, params, progress);

        let actual: Vec<f64> = holdout.iter().map(|&i| data.records()[i].price).collect();
        let predicted: Vec<f64> = holdout
            .iter()
            .map(|&i| forest.predict(&data.records()[i].features))
            .collect();
        let holdout_r2 = r_squared(&actual, &predicted);

        match holdout_r2 {
            Some(r2) => log::info!(
                "Price model trained on {} sales; holdout R² = {r2:.4} over {} sales",
                train.len(),
                holdout.len()
            ),
            None => log::info!(
                "Price model trained on {} sales; holdout too small to evaluate",
                train.len()
            ),
        }

        Self {
            data,
            forest,
            holdout_r2,
        }
    }

    /// Prepared sales data.
    #[must_use]
    pub const fn data(&self) -> &SalesData {
        &self.data
    }

    /// R² on the held-out sales, if it could be computed.
    #[must_use]
    pub const fn holdout_r2(&self) -> Option<f64> {
        self.holdout_r2
    }

    /// Predicts the sale price for one feature vector.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.forest.predict(features)
    }
}

/// Shuffles `0..n` with a seeded generator and splits off the holdout.
///
/// Datasets too small to leave both sides non-empty train on everything.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn split_indices(n: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let n_holdout = (n as f64 * HOLDOUT_FRACTION).ceil() as usize;
    if n_holdout == 0 || n_holdout >= n {
        return (indices, Vec::new());
    }

    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = indices.split_off(n_holdout);
    (train, indices)
}

/// Projects area price growth with a trained [`PriceModel`].
pub struct GrowthScorer<'a> {
    model: &'a PriceModel,
}

impl<'a> GrowthScorer<'a> {
    /// Creates a scorer over a trained model.
    #[must_use]
    pub const fn new(model: &'a PriceModel) -> Self {
        Self { model }
    }

    /// Known area names.
    #[must_use]
    pub fn cities(&self) -> &[String] {
        self.model.data().areas().classes()
    }

    /// Projects the growth score for an area.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::NotFound`] listing the known areas if `city`
    /// (after trimming) is not one of them.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn score(&self, city: &str) -> ScoreResult<GrowthScore> {
        let city = city.trim();
        let areas = self.model.data().areas();
        if areas.encode(city).is_none() {
            return Err(ScoreError::NotFound {
                message: "city not found".to_string(),
                available: areas.classes().to_vec(),
            });
        }

        let rows: Vec<&SaleRecord> = self
            .model
            .data()
            .records()
            .iter()
            .filter(|r| r.area == city)
            .collect();

        let projected = project(&rows);
        let future_prices: Vec<f64> = projected.iter().map(|f| self.model.predict(f)).collect();

        let future_price_mean = mean(&future_prices);
        let historical_price_mean = mean(&rows.iter().map(|r| r.price).collect::<Vec<_>>());
        let sqft = mean(
            &rows
                .iter()
                .map(|r| r.get(Feature::IntSqft))
                .collect::<Vec<_>>(),
        );

        let growth_score = if historical_price_mean == 0.0 {
            log::warn!("Area '{city}' has a zero mean sale price; reporting no growth");
            0
        } else {
            ((future_price_mean - historical_price_mean) / historical_price_mean * 100.0).round()
                as i64
        };

        let (original_price_per_sqft, future_price_per_sqft) = if sqft > 0.0 {
            (historical_price_mean / sqft, future_price_mean / sqft)
        } else {
            (0.0, 0.0)
        };

        Ok(GrowthScore {
            city: city.to_owned(),
            growth_score,
            original_price_per_sqft,
            future_price_per_sqft,
        })
    }
}

/// Linear growth per year-since-sale of one feature across an area's
/// sales, from the first row to the last.
fn growth_rate(rows: &[&SaleRecord], feature: Feature) -> f64 {
    // Fewer than two rows: no trend.
    let [first, .., last] = rows else {
        return 0.0;
    };
    let span = last.get(Feature::YearsSinceSale) - first.get(Feature::YearsSinceSale);
    if span == 0.0 {
        return 0.0;
    }
    (last.get(feature) - first.get(feature)) / span
}

/// Feature vectors for each sale, moved [`PROJECTION_YEARS`] ahead.
fn project(rows: &[&SaleRecord]) -> Vec<[f64; sales::FEATURE_COUNT]> {
    let rates: Vec<(Feature, f64)> = Feature::trended()
        .iter()
        .map(|&f| (f, growth_rate(rows, f)))
        .collect();

    rows.iter()
        .map(|r| {
            let mut features = r.features;
            for &(feature, rate) in &rates {
                features[feature.index()] += rate * PROJECTION_YEARS;
            }
            features[Feature::YearsSinceSale.index()] += PROJECTION_YEARS;
            features[Feature::YearsSinceBuild.index()] += PROJECTION_YEARS;
            features
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
