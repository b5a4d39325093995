//! Local signal volatility.
//!
//! Computes a centered rolling sample standard deviation that exposes regions of high local
//! variability in a (raw or smoothed) current trace. Positions without a complete window are
//! reported as `None` rather than as a made-up number.
//!
//! # Example
//!
//! ```rust
//! use squiggle_algos::analysis::volatility::{rolling_std, VolatilityConfig};
//!
//! let signal = [1.0, 2.0, 1.0, 2.0, 1.0];
//! let volatility = rolling_std(&signal, &VolatilityConfig::new(3)).unwrap();
//! assert_eq!(volatility[0], None);
//! assert!(volatility[2].is_some());
//! assert_eq!(volatility[4], None);
//! ```

use nalgebra::DVectorView;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError, Stage};

/// Window size of the rolling statistic.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolatilityConfig {
    pub window_size: usize,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self { window_size: 50 }
    }
}

impl VolatilityConfig {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// The wider window used when volatility is the only derived feature.
    pub fn single_feature() -> Self {
        Self { window_size: 100 }
    }

    /// Checks the window against a signal of `signal_len` samples.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `window_size` is zero or larger than the signal.
    pub fn validate(&self, signal_len: usize) -> Result<()> {
        if self.window_size < 1 {
            return Err(SignalError::invalid(
                Stage::Volatility,
                "window_size",
                "window size must be at least 1",
            ));
        }
        if self.window_size > signal_len {
            return Err(SignalError::invalid(
                Stage::Volatility,
                "window_size",
                format!(
                    "window size {} exceeds the signal length {}",
                    self.window_size, signal_len
                ),
            ));
        }
        Ok(())
    }
}

/// Bessel-corrected standard deviation; undefined for fewer than two samples.
fn sample_std(window: &[f64]) -> Option<f64> {
    if window.len() < 2 {
        return None;
    }
    let data = DVectorView::from(window);
    let mean = data.sum() / window.len() as f64;
    let squared_deviation = data.add_scalar(-mean).norm_squared();
    Some((squared_deviation / (window.len() - 1) as f64).sqrt())
}

/// Computes a centered rolling sample standard deviation over `signal`.
///
/// The window for position `i` is labelled at its middle: an odd window spans
/// `w / 2` samples on each side, an even window spans `w / 2` samples before `i` and
/// `w / 2 - 1` after it. An even window therefore leaves `w / 2` leading `None` entries
/// but only `w / 2 - 1` trailing ones, not `w / 2` at both ends.
///
/// # Arguments
///
/// * `signal` - samples to analyse.
/// * `config` - rolling window size.
///
/// # Returns
///
/// A vector of the same length as `signal`. Entries are `None` where the window would
/// extend past either end of the signal, and everywhere when `window_size` is 1 because the
/// sample standard deviation of a single value is undefined.
///
/// # Errors
///
/// Returns `InvalidParameter` if the config fails [`VolatilityConfig::validate`].
pub fn rolling_std(signal: &[f64], config: &VolatilityConfig) -> Result<Vec<Option<f64>>> {
    config.validate(signal.len())?;
    let fwd_window = (config.window_size - 1) / 2;
    let back_window = config.window_size - 1 - fwd_window;

    Ok(signal
        .par_iter()
        .enumerate()
        .map(|(idx, _)| {
            if idx < back_window || idx + fwd_window >= signal.len() {
                None
            } else {
                sample_std(&signal[idx - back_window..=idx + fwd_window])
            }
        })
        .collect())
}
