//! Savitzky-Golay shape-preserving smoothing.
//!
//! Every sample is replaced by the value at the window center of a least-squares polynomial
//! of degree `poly_order` fitted to the `window_length` samples around it. For interior
//! samples the fit reduces to a convolution with fixed weights, computed once from the
//! pseudo-inverse of the window's Vandermonde matrix. The first and last `window_length / 2`
//! samples, which lack a full centered window, are taken from a single polynomial fitted to
//! the first (respectively last) `window_length` samples and evaluated at their positions.
//!
//! # Example
//!
//! ```rust
//! use squiggle_algos::filters::savgol::{savgol_filter, SmoothingConfig};
//!
//! let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0];
//! let smoothed = savgol_filter(&data, &SmoothingConfig::new(5, 2)).unwrap();
//! assert_eq!(smoothed.len(), data.len());
//! ```

use nalgebra::{DMatrix, DVector, DVectorView};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError, Stage};

/// Parameters of the shape-preserving smoother.
///
/// * `window_length` - number of samples in each local fit. Must be odd, greater than
///   `poly_order` and no longer than the signal.
/// * `poly_order` - degree of the local polynomial.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothingConfig {
    pub window_length: usize,
    pub poly_order: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_length: 51,
            poly_order: 3,
        }
    }
}

impl SmoothingConfig {
    pub fn new(window_length: usize, poly_order: usize) -> Self {
        Self {
            window_length,
            poly_order,
        }
    }

    /// Checks the window against the polynomial order only.
    fn validate_shape(&self) -> Result<()> {
        if self.window_length % 2 == 0 {
            return Err(SignalError::invalid(
                Stage::ShapePreserving,
                "window_length",
                format!("window length must be odd, got {}", self.window_length),
            ));
        }
        if self.window_length <= self.poly_order {
            return Err(SignalError::invalid(
                Stage::ShapePreserving,
                "window_length",
                format!(
                    "window length {} must exceed the polynomial order {}",
                    self.window_length, self.poly_order
                ),
            ));
        }
        Ok(())
    }

    /// Checks the config against a signal of `signal_len` samples.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `window_length` is even (zero included), not greater than
    /// `poly_order`, or longer than the signal.
    pub fn validate(&self, signal_len: usize) -> Result<()> {
        self.validate_shape()?;
        if self.window_length > signal_len {
            return Err(SignalError::invalid(
                Stage::ShapePreserving,
                "window_length",
                format!(
                    "window length {} exceeds the signal length {}",
                    self.window_length, signal_len
                ),
            ));
        }
        Ok(())
    }
}

/// Computes the convolution weights that yield the smoothed value at a window center.
///
/// Window positions are scaled to `[-1, 1]` before building the Vandermonde matrix, which
/// leaves the fitted center value unchanged but keeps high polynomial orders well
/// conditioned.
///
/// # Errors
///
/// Returns `InvalidParameter` if `window_length` is even or not greater than `poly_order`.
pub fn savgol_coefficients(window_length: usize, poly_order: usize) -> Result<DVector<f64>> {
    SmoothingConfig::new(window_length, poly_order).validate_shape()?;
    let half = window_length / 2;
    let scale = half.max(1) as f64;
    let vandermonde = DMatrix::from_fn(window_length, poly_order + 1, |row, col| {
        ((row as f64 - half as f64) / scale).powi(col as i32)
    });
    let pinv = vandermonde
        .pseudo_inverse(f64::EPSILON)
        .map_err(|e| SignalError::invalid(Stage::ShapePreserving, "poly_order", e))?;
    Ok(pinv.row(0).transpose())
}

/// Fits a polynomial of degree `poly_order` to `window` over positions scaled to `[0, 1]`.
fn fit_polynomial(window: &[f64], poly_order: usize) -> Result<DVector<f64>> {
    let span = (window.len() - 1).max(1) as f64;
    let design = DMatrix::from_fn(window.len(), poly_order + 1, |row, col| {
        (row as f64 / span).powi(col as i32)
    });
    let fit = lstsq::lstsq(&design, &DVectorView::from(window).into(), f64::EPSILON)
        .map_err(|e| SignalError::invalid(Stage::ShapePreserving, "poly_order", e))?;
    Ok(fit.solution)
}

fn evaluate(coefficients: &DVector<f64>, position: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * position + c)
}

/// Smooths `signal` with a Savitzky-Golay filter.
///
/// # Arguments
///
/// * `signal` - the samples to smooth.
/// * `config` - window length and polynomial order.
///
/// # Returns
///
/// A vector of the same length as `signal`.
///
/// # Errors
///
/// Returns `InvalidParameter` if the config fails [`SmoothingConfig::validate`] for this
/// signal.
pub fn savgol_filter(signal: &[f64], config: &SmoothingConfig) -> Result<Vec<f64>> {
    config.validate(signal.len())?;
    let window_length = config.window_length;
    let half = window_length / 2;
    let n = signal.len();
    let coefficients = savgol_coefficients(window_length, config.poly_order)?;

    let interior: Vec<f64> = signal
        .par_windows(window_length)
        .map(|window| DVectorView::from(window).dot(&coefficients))
        .collect();

    let mut smoothed = Vec::with_capacity(n);
    if half > 0 {
        let span = (window_length - 1) as f64;
        let head = fit_polynomial(&signal[..window_length], config.poly_order)?;
        smoothed.extend((0..half).map(|t| evaluate(&head, t as f64 / span)));
        smoothed.extend(interior);
        let tail = fit_polynomial(&signal[n - window_length..], config.poly_order)?;
        smoothed.extend(
            (window_length - half..window_length).map(|t| evaluate(&tail, t as f64 / span)),
        );
    } else {
        smoothed.extend(interior);
    }
    Ok(smoothed)
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};

    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64], tolerance: f64) {
        assert_eq!(actual.len(), expected.len());
        for (idx, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!(
                (a - e).abs() < tolerance,
                "sample {}: expected {}, got {}",
                idx,
                e,
                a
            );
        }
    }

    #[test]
    fn test_default_config() {
        let config = SmoothingConfig::default();
        assert_eq!(config.window_length, 51);
        assert_eq!(config.poly_order, 3);
    }

    #[test]
    fn test_even_window_rejected() {
        let result = savgol_filter(&[1.0; 20], &SmoothingConfig::new(4, 2));
        assert!(matches!(
            result,
            Err(SignalError::InvalidParameter {
                stage: Stage::ShapePreserving,
                parameter: "window_length",
                ..
            })
        ));
        assert!(SmoothingConfig::new(0, 0).validate(20).is_err());
    }

    #[test]
    fn test_window_not_above_poly_order_rejected() {
        let result = savgol_filter(&[1.0; 20], &SmoothingConfig::new(3, 3));
        assert!(matches!(result, Err(SignalError::InvalidParameter { .. })));
        assert!(savgol_coefficients(5, 7).is_err());
    }

    #[test]
    fn test_window_longer_than_signal_rejected() {
        let signal: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let result = savgol_filter(&signal, &SmoothingConfig::new(250, 3));
        assert!(matches!(
            result,
            Err(SignalError::InvalidParameter {
                parameter: "window_length",
                ..
            })
        ));
    }

    #[test]
    fn test_coefficients_quadratic_five_point() {
        let coefficients = savgol_coefficients(5, 2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|c| c / 35.0);
        assert_close(coefficients.as_slice(), &expected, 1e-12);
    }

    #[test]
    fn test_coefficients_sum_to_one() {
        for (window, order) in [(5, 0), (11, 3), (51, 3), (21, 6)] {
            let coefficients = savgol_coefficients(window, order).unwrap();
            assert!((coefficients.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_known_output() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        let smoothed = savgol_filter(&data, &SmoothingConfig::new(5, 2)).unwrap();
        let expected = [
            1.0,
            2.0,
            3.0,
            4.171428571428572,
            4.657142857142857,
            4.171428571428572,
            3.0,
            2.0,
            1.0,
        ];
        assert_close(&smoothed, &expected, 1e-9);
    }

    #[test]
    fn test_linear_ramp_is_unchanged() {
        let ramp: Vec<f64> = (0..120).map(|i| 75.0 + 0.35 * i as f64).collect();
        for poly_order in 1..=4 {
            let smoothed = savgol_filter(&ramp, &SmoothingConfig::new(21, poly_order)).unwrap();
            assert_close(&smoothed, &ramp, 1e-8);
        }
    }

    #[test]
    fn test_quadratic_preserved_at_edges() {
        let signal: Vec<f64> = (0..40)
            .map(|i| {
                let x = i as f64;
                0.02 * x * x - 0.5 * x + 3.0
            })
            .collect();
        let smoothed = savgol_filter(&signal, &SmoothingConfig::new(9, 2)).unwrap();
        assert_close(&smoothed, &signal, 1e-8);
    }

    #[test]
    fn test_length_is_preserved() {
        let signal: Vec<f64> = (0..73).map(|i| (i as f64 * 0.3).cos()).collect();
        for window in [1, 3, 51, 73] {
            let smoothed = savgol_filter(&signal, &SmoothingConfig::new(window, 0)).unwrap();
            assert_eq!(smoothed.len(), signal.len());
        }
    }

    #[test]
    fn test_unit_window_is_identity() {
        let signal = [3.0, -1.0, 4.0, 1.0, -5.0];
        let smoothed = savgol_filter(&signal, &SmoothingConfig::new(1, 0)).unwrap();
        assert_close(&smoothed, &signal, 1e-12);
    }

    #[test]
    fn test_reduces_noise() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let signal: Vec<f64> = (0..500)
            .map(|_| 100.0 + rng.gen_range(-5.0..5.0))
            .collect();
        let smoothed = savgol_filter(&signal, &SmoothingConfig::default()).unwrap();
        let spread = |s: &[f64]| DVectorView::from(s).variance();
        assert!(spread(&smoothed) < spread(&signal) * 0.5);
    }
}
