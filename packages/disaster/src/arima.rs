//! ARIMA(1,1,1) fitted by conditional sum of squares.
//!
//! The series is differenced once and an ARMA(1,1) without constant is
//! fitted to the differences:
//!
//! ```text
//! y[t] = phi * y[t-1] + e[t] + theta * e[t-1]
//! ```
//!
//! `phi` and `theta` are chosen by a coarse-to-fine grid search over the
//! open interval `(-1, 1)`, minimising the residual sum of squares with
//! the pre-sample residual set to zero.

use crate::forecast::ForecastModel;

/// Largest absolute coefficient considered. Keeps the fit stationary and
/// invertible.
const COEFFICIENT_BOUND: f64 = 0.99;

/// Minimum differenced observations needed to estimate two coefficients.
const MIN_DIFFERENCES: usize = 3;

/// Grid search ARIMA(1,1,1) estimator.
#[derive(Debug, Clone, Copy)]
pub struct Arima111 {
    coarse_step: f64,
    fine_step: f64,
}

impl Default for Arima111 {
    fn default() -> Self {
        Self {
            coarse_step: 0.05,
            fine_step: 0.005,
        }
    }
}

/// Estimated coefficients and the state needed to extrapolate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arima111Fit {
    /// Autoregressive coefficient.
    pub phi: f64,
    /// Moving-average coefficient.
    pub theta: f64,
    /// Residual sum of squares at the optimum.
    pub sse: f64,
    last_level: f64,
    last_difference: f64,
    last_residual: f64,
}

impl Arima111 {
    /// Fits the model, returning `None` if the series is too short or the
    /// objective is not finite anywhere on the grid.
    #[must_use]
    pub fn fit(&self, series: &[f64]) -> Option<Arima111Fit> {
        let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
        if diffs.len() < MIN_DIFFERENCES || diffs.iter().any(|d| !d.is_finite()) {
            return None;
        }

        let coarse = grid(-COEFFICIENT_BOUND, COEFFICIENT_BOUND, self.coarse_step);
        let (phi, theta, _) = best_on_grid(&diffs, &coarse, &coarse)?;

        let phis = grid(
            (phi - self.coarse_step).max(-COEFFICIENT_BOUND),
            (phi + self.coarse_step).min(COEFFICIENT_BOUND),
            self.fine_step,
        );
        let thetas = grid(
            (theta - self.coarse_step).max(-COEFFICIENT_BOUND),
            (theta + self.coarse_step).min(COEFFICIENT_BOUND),
            self.fine_step,
        );
        let (phi, theta, sse) = best_on_grid(&diffs, &phis, &thetas)?;

        let (_, last_residual) = conditional_sse(&diffs, phi, theta);

        Some(Arima111Fit {
            phi,
            theta,
            sse,
            last_level: *series.last()?,
            last_difference: *diffs.last()?,
            last_residual,
        })
    }
}

impl Arima111Fit {
    /// Extrapolates `horizon` future levels.
    #[must_use]
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let mut level = self.last_level;
        let mut diff = self.phi.mul_add(self.last_difference, self.theta * self.last_residual);
        let mut out = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            level += diff;
            out.push(level);
            diff *= self.phi;
        }

        out
    }
}

impl ForecastModel for Arima111 {
    fn fit_forecast(&self, series: &[f64], horizon: usize) -> Option<Vec<f64>> {
        let fit = self.fit(series)?;
        let values = fit.forecast(horizon);
        values.iter().all(|v| v.is_finite()).then_some(values)
    }
}

/// Residual sum of squares and final residual for given coefficients.
fn conditional_sse(diffs: &[f64], phi: f64, theta: f64) -> (f64, f64) {
    let mut prev_residual = 0.0;
    let mut sse = 0.0;

    for w in diffs.windows(2) {
        let predicted = phi.mul_add(w[0], theta * prev_residual);
        let residual = w[1] - predicted;
        sse += residual * residual;
        prev_residual = residual;
    }

    (sse, prev_residual)
}

fn best_on_grid(diffs: &[f64], phis: &[f64], thetas: &[f64]) -> Option<(f64, f64, f64)> {
    let mut best: Option<(f64, f64, f64)> = None;

    for &phi in phis {
        for &theta in thetas {
            let (sse, _) = conditional_sse(diffs, phi, theta);
            if !sse.is_finite() {
                continue;
            }
            match best {
                Some((_, _, best_sse)) if best_sse <= sse => {}
                _ => best = Some((phi, theta, sse)),
            }
        }
    }

    best
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn grid(from: f64, to: f64, step: f64) -> Vec<f64> {
    let n = ((to - from) / step).floor().max(0.0) as usize;
    (0..=n).map(|i| (i as f64).mul_add(step, from)).collect()
}
