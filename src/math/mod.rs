// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics: closed-form least squares and regression scores.

#[cfg(test)]
mod tests;

use nalgebra::{DMatrix, DVector};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A centred column whose norm is below this fraction of the norm of the raw
/// column is constant.
const CONSTANT_TOLERANCE: f64 = 1e-10;

#[derive(Error, Debug)]
pub enum LeastSquaresError {
    #[error("Cannot fit a linear model with zero rows")]
    NoRows,

    #[error("The feature matrix has {rows} rows, but the target has {targets} values")]
    ShapeMismatch { rows: usize, targets: usize },

    #[error("Couldn't solve the least-squares problem: {0}")]
    Solve(&'static str),
}

/// An ordinary-least-squares linear model with an intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// One coefficient per feature column.
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearFit {
    /// Fit `y = X β + c`. The fit is done on centred data, so the intercept
    /// never needs a column of ones.
    ///
    /// Each centred column is scaled to unit norm before the SVD solve, so
    /// features in very different units (e.g. ohms and days) are treated
    /// alike. Constant features get a zero coefficient, and collinear
    /// features get the minimum-norm solution in the scaled space.
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<LinearFit, LeastSquaresError> {
        let (num_rows, num_features) = x.dim();
        if num_rows != y.len() {
            return Err(LeastSquaresError::ShapeMismatch {
                rows: num_rows,
                targets: y.len(),
            });
        }
        if num_rows == 0 {
            return Err(LeastSquaresError::NoRows);
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or(LeastSquaresError::NoRows)?;
        let y_mean = y.sum() / num_rows as f64;
        if num_features == 0 {
            return Ok(LinearFit {
                coefficients: vec![],
                intercept: y_mean,
            });
        }

        let centred = &x - &x_mean;
        // Zero for constant columns.
        let column_norms: Vec<f64> = centred
            .columns()
            .into_iter()
            .zip(x.columns())
            .map(|(c, raw)| {
                let norm = c.dot(&c).sqrt();
                if norm > CONSTANT_TOLERANCE * raw.dot(&raw).sqrt() {
                    norm
                } else {
                    0.0
                }
            })
            .collect();

        let design = DMatrix::from_fn(num_rows, num_features, |r, c| {
            let norm = column_norms[c];
            if norm > 0.0 {
                centred[[r, c]] / norm
            } else {
                0.0
            }
        });
        let target = DVector::from_iterator(num_rows, y.iter().map(|&v| v - y_mean));

        let svd = design.svd(true, true);
        let eps = svd.singular_values.max() * num_rows.max(num_features) as f64 * f64::EPSILON;
        let scaled_solution = svd.solve(&target, eps).map_err(LeastSquaresError::Solve)?;

        let coefficients: Array1<f64> = scaled_solution
            .iter()
            .zip(&column_norms)
            .map(|(&b, &norm)| if norm > 0.0 { b / norm } else { 0.0 })
            .collect();
        let intercept = y_mean - coefficients.dot(&x_mean);
        Ok(LinearFit {
            coefficients: coefficients.to_vec(),
            intercept,
        })
    }

    pub fn num_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Predict with this model. The caller must ensure that the number of
    /// columns of `x` matches the number of coefficients.
    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        let coefficients = ArrayView1::from(self.coefficients.as_slice());
        x.dot(&coefficients) + self.intercept
    }
}

/// The coefficient of determination. When the actual values have no variance,
/// a perfect prediction scores 1 and anything else scores 0. Fewer than two
/// values give NaN.
pub fn r2_score(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> f64 {
    if actual.len() < 2 {
        return f64::NAN;
    }
    let n = actual.len() as f64;
    let mean = actual.sum() / n;
    let ss_res = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>();
    let ss_tot = actual.iter().map(|a| (a - mean).powi(2)).sum::<f64>();
    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Root mean squared error.
pub fn rmse(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> f64 {
    let mse = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    mse.sqrt()
}

/// Mean bias error; the mean of predicted minus actual. Positive values mean
/// over-prediction.
pub fn mean_bias_error(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> f64 {
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| p - a)
        .sum::<f64>()
        / actual.len() as f64
}

/// Round to a number of decimal places (half away from zero).
pub fn round_dp(x: f64, decimal_places: i32) -> f64 {
    let factor = 10_f64.powi(decimal_places);
    (x * factor).round() / factor
}

/// The median of some values. NaNs must be removed beforehand. Even-length
/// inputs give the mean of the two middle values.
pub(crate) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// The arithmetic mean of some values. NaNs must be removed beforehand.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
