// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::array;

use super::*;

#[test]
fn test_fit_exact_line() {
    let x = array![[1.0], [2.0], [3.0], [4.0]];
    let y = array![3.0, 5.0, 7.0, 9.0];
    let fit = LinearFit::fit(x.view(), y.view()).unwrap();
    assert_eq!(fit.num_features(), 1);
    assert_abs_diff_eq!(fit.coefficients[0], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.intercept, 1.0, epsilon = 1e-12);

    let predicted = fit.predict(array![[10.0], [-1.0]].view());
    assert_abs_diff_eq!(predicted, array![21.0, -1.0], epsilon = 1e-10);
}

#[test]
fn test_fit_two_features() {
    // y = 0.5 a - 3 b + 2
    let x = array![
        [1.0, 0.0],
        [2.0, 1.0],
        [3.0, 5.0],
        [4.0, 2.0],
        [8.0, -1.0],
    ];
    let y = x.map_axis(Axis(1), |r| 0.5 * r[0] - 3.0 * r[1] + 2.0);
    let fit = LinearFit::fit(x.view(), y.view()).unwrap();
    assert_abs_diff_eq!(fit.coefficients[0], 0.5, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.coefficients[1], -3.0, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.intercept, 2.0, epsilon = 1e-10);
}

#[test]
fn test_fit_constant_feature_gets_zero_coefficient() {
    let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
    let y = array![2.0, 4.0, 6.0];
    let fit = LinearFit::fit(x.view(), y.view()).unwrap();
    assert_abs_diff_eq!(fit.coefficients[0], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.coefficients[1], 0.0);
    assert_abs_diff_eq!(fit.intercept, 0.0, epsilon = 1e-12);
}

#[test]
fn test_fit_features_on_very_different_scales() {
    // A MOx resistance in ohms next to elapsed days.
    let frac = |v: f64| v - v.floor();
    let x = Array2::from_shape_fn((200, 2), |(i, j)| {
        let i = i as f64;
        match j {
            0 => 1e6 + 4e6 * frac(i * 0.618_033_988_7),
            _ => 2.0 * frac(i * 0.754_877_666_2 + 0.1),
        }
    });
    let y = x.map_axis(Axis(1), |r| 1e-3 * r[0] + 50.0 * r[1] + 7.0);
    let fit = LinearFit::fit(x.view(), y.view()).unwrap();
    assert_abs_diff_eq!(fit.coefficients[0], 1e-3, epsilon = 1e-12);
    assert_abs_diff_eq!(fit.coefficients[1], 50.0, epsilon = 1e-6);
    assert_abs_diff_eq!(fit.intercept, 7.0, epsilon = 1e-5);

    // The same with the columns swapped.
    let swapped = x.slice(s![.., ..;-1]).to_owned();
    let fit = LinearFit::fit(swapped.view(), y.view()).unwrap();
    assert_abs_diff_eq!(fit.coefficients[0], 50.0, epsilon = 1e-6);
    assert_abs_diff_eq!(fit.coefficients[1], 1e-3, epsilon = 1e-12);
}

#[test]
fn test_fit_duplicated_feature_shares_the_coefficient() {
    let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [5.0, 5.0]];
    let y = array![4.0, 7.0, 10.0, 16.0];
    let fit = LinearFit::fit(x.view(), y.view()).unwrap();
    assert_abs_diff_eq!(fit.coefficients[0], 1.5, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.coefficients[1], 1.5, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.intercept, 1.0, epsilon = 1e-10);
}

#[test]
fn test_fit_rejects_bad_input() {
    let x = Array2::<f64>::zeros((0, 1));
    let y = Array1::<f64>::zeros(0);
    assert!(matches!(
        LinearFit::fit(x.view(), y.view()),
        Err(LeastSquaresError::NoRows)
    ));

    let x = Array2::<f64>::zeros((3, 1));
    let y = Array1::<f64>::zeros(2);
    assert!(matches!(
        LinearFit::fit(x.view(), y.view()),
        Err(LeastSquaresError::ShapeMismatch {
            rows: 3,
            targets: 2
        })
    ));
}

#[test]
fn test_fit_is_deterministic() {
    let x = Array2::from_shape_fn((50, 2), |(i, j)| ((i * 7 + j * 3) % 11) as f64 * 0.37);
    let y = Array1::from_shape_fn(50, |i| (i as f64).sin() * 4.0 + 1.0);
    let first = LinearFit::fit(x.view(), y.view()).unwrap();
    let second = LinearFit::fit(x.view(), y.view()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_r2_score() {
    let actual = array![1.0, 2.0, 3.0];
    assert_abs_diff_eq!(r2_score(actual.view(), actual.view()), 1.0);
    // Predicting the mean scores zero.
    let predicted = array![2.0, 2.0, 2.0];
    assert_abs_diff_eq!(r2_score(actual.view(), predicted.view()), 0.0);
    let predicted = array![1.0, 2.0, 4.0];
    assert_abs_diff_eq!(r2_score(actual.view(), predicted.view()), 0.5);

    // No variance in the actual values.
    let actual = array![5.0, 5.0];
    assert_abs_diff_eq!(r2_score(actual.view(), actual.view()), 1.0);
    assert_abs_diff_eq!(r2_score(actual.view(), array![5.0, 6.0].view()), 0.0);

    // Not defined for fewer than two values.
    assert!(r2_score(array![5.0].view(), array![5.0].view()).is_nan());
    assert!(r2_score(array![5.0].view(), array![4.0].view()).is_nan());
}

#[test]
fn test_rmse_and_mbe() {
    let actual = array![1.0, 2.0, 3.0, 4.0];
    let predicted = array![2.0, 2.0, 2.0, 6.0];
    // Squared errors: 1, 0, 1, 4.
    assert_abs_diff_eq!(rmse(actual.view(), predicted.view()), 1.5_f64.sqrt());
    // Errors: 1, 0, -1, 2.
    assert_abs_diff_eq!(mean_bias_error(actual.view(), predicted.view()), 0.5);
    assert_abs_diff_eq!(mean_bias_error(predicted.view(), actual.view()), -0.5);
}

#[test]
fn test_round_dp() {
    assert_abs_diff_eq!(round_dp(0.123456, 2), 0.12);
    assert_abs_diff_eq!(round_dp(0.987, 2), 0.99);
    assert_abs_diff_eq!(round_dp(-0.456, 2), -0.46);
    assert_abs_diff_eq!(round_dp(1.0, 2), 1.0);
}

#[test]
fn test_median_and_mean() {
    assert_eq!(median(&mut []), None);
    assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
    assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
    assert_eq!(mean(&[]), None);
    assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
}
