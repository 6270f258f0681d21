//! Fit-or-mean forecasting of yearly disaster counts.
//!
//! [`forecast_series`] asks a [`ForecastModel`] for a forecast and falls
//! back to the historical mean when the history is too short or the model
//! declines. The outcome is recorded in the [`Forecast`] variant.

use livability_score_models::Forecast;

/// Series with this many points or fewer skip model fitting entirely.
pub const MIN_HISTORY_EXCLUSIVE: usize = 3;

/// A univariate time-series model that can fit and extrapolate a series.
pub trait ForecastModel: Send + Sync {
    /// Fits the model to `series` and predicts `horizon` future values.
    ///
    /// Returns `None` when the fit fails for any reason.
    fn fit_forecast(&self, series: &[f64], horizon: usize) -> Option<Vec<f64>>;
}

/// Forecasts `horizon` non-negative integer counts for `series`.
///
/// Always returns exactly `horizon` values.
#[must_use]
pub fn forecast_series(model: &dyn ForecastModel, series: &[f64], horizon: usize) -> Forecast {
    if series.len() > MIN_HISTORY_EXCLUSIVE
        && let Some(values) = model.fit_forecast(series, horizon)
        && values.len() == horizon
        && values.iter().all(|v| v.is_finite())
    {
        return Forecast::Fitted(values.into_iter().map(to_count).collect());
    }

    Forecast::MeanFallback(vec![to_count(mean(series)); horizon])
}

/// Arithmetic mean, 0 for an empty series.
#[allow(clippy::cast_precision_loss)]
fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        0.0
    } else {
        series.iter().sum::<f64>() / series.len() as f64
    }
}

/// Rounds to the nearest integer and clips at zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
