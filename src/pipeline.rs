//! Signal conditioning pipeline.
//!
//! Takes one read, keeps a prefix of it for analysis and derives three aligned views of
//! that prefix: a zero-phase low-pass version, a Savitzky-Golay smoothed version and the
//! local volatility. The three transforms are independent of each other and all read the
//! same subset; the result is handed back as a [`ConditionedSignal`] for whatever
//! presentation layer consumes it.
//!
//! # Example
//!
//! ```rust
//! use squiggle_algos::pipeline::{Pipeline, PipelineConfig, SubsetPolicy};
//! use squiggle_algos::source::{MemorySource, Read};
//!
//! let samples: Vec<f64> = (0..400).map(|i| 90.0 + (i as f64 / 7.0).sin()).collect();
//! let mut source = MemorySource::single("demo", Read::new("read-1", samples));
//!
//! let config = PipelineConfig {
//!     subset: SubsetPolicy::Full,
//!     ..PipelineConfig::default()
//! };
//! let conditioned = Pipeline::new(config).unwrap().run(&mut source).unwrap();
//! assert_eq!(conditioned.subset_len, 400);
//! assert_eq!(conditioned.low_pass.len(), 400);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::analysis::volatility::{rolling_std, VolatilityConfig};
use crate::error::{Result, SignalError, Stage};
use crate::filters::butterworth::{low_pass, FilterConfig};
use crate::filters::savgol::{savgol_filter, SmoothingConfig};
use crate::source::{first_read, Read, SignalSource};

/// How much of a read is kept for analysis. Always a prefix.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubsetPolicy {
    /// Keep `round(len * fraction)` samples, rounding halves to even. `fraction` in (0, 1].
    Fraction(f64),
    /// Keep at most this many samples.
    Count(usize),
    /// Keep the whole read.
    Full,
}

impl Default for SubsetPolicy {
    fn default() -> Self {
        SubsetPolicy::Fraction(0.25)
    }
}

impl SubsetPolicy {
    fn validate(&self) -> Result<()> {
        match *self {
            SubsetPolicy::Fraction(fraction) if !(fraction > 0.0 && fraction <= 1.0) => {
                Err(SignalError::invalid(
                    Stage::Subset,
                    "fraction",
                    format!("subset fraction must lie in (0, 1], got {}", fraction),
                ))
            }
            SubsetPolicy::Count(0) => Err(SignalError::invalid(
                Stage::Subset,
                "count",
                "subset count must be at least 1",
            )),
            _ => Ok(()),
        }
    }

    /// Number of samples kept from a read of `total` samples.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a fraction outside (0, 1] or a zero count.
    pub fn select_len(&self, total: usize) -> Result<usize> {
        self.validate()?;
        Ok(match *self {
            SubsetPolicy::Fraction(fraction) => {
                ((total as f64 * fraction).round_ties_even() as usize).min(total)
            }
            SubsetPolicy::Count(count) => count.min(total),
            SubsetPolicy::Full => total,
        })
    }
}

/// Which array the volatility estimator runs on.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VolatilityInput {
    /// The raw subset.
    #[default]
    Raw,
    /// The low-pass output.
    LowPass,
    /// The Savitzky-Golay output.
    ShapePreserving,
}

/// Every parameter of a pipeline run.
///
/// `smoothing.window_length` is the requested upper bound of the Savitzky-Golay window;
/// the window actually used is derived per read by [`clamp_window_length`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineConfig {
    pub subset: SubsetPolicy,
    pub low_pass: FilterConfig,
    pub smoothing: SmoothingConfig,
    pub volatility: VolatilityConfig,
    pub volatility_input: VolatilityInput,
}

impl PipelineConfig {
    /// Checks every invariant that does not depend on the signal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` naming the offending stage and parameter.
    pub fn validate(&self) -> Result<()> {
        self.subset.validate()?;
        self.low_pass.validate()?;
        if self.smoothing.window_length <= self.smoothing.poly_order {
            return Err(SignalError::invalid(
                Stage::ShapePreserving,
                "window_length",
                format!(
                    "requested window length {} must exceed the polynomial order {}",
                    self.smoothing.window_length, self.smoothing.poly_order
                ),
            ));
        }
        if self.volatility.window_size < 1 {
            return Err(SignalError::invalid(
                Stage::Volatility,
                "window_size",
                "window size must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Output bundle of a pipeline run. All arrays are aligned with `raw`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionedSignal {
    pub source_id: String,
    pub read_id: String,
    /// Length of the whole read.
    pub total_len: usize,
    /// Length of the analysed prefix.
    pub subset_len: usize,
    /// Savitzky-Golay window actually used after clamping.
    pub smoothing_window: usize,
    pub raw: Vec<f64>,
    pub low_pass: Vec<f64>,
    pub shape_preserving: Vec<f64>,
    /// `None` where no full window exists or the deviation is undefined.
    pub volatility: Vec<Option<f64>>,
}

/// Clamps a requested Savitzky-Golay window to an odd value strictly below `subset_len`.
///
/// The bound is `subset_len - 1` for an even subset and `subset_len - 2` for an odd one,
/// and an even request is decremented to the odd value below it.
///
/// # Errors
///
/// Returns `InsufficientData` if no odd window fits, i.e. the subset has fewer than three
/// samples, and `InvalidParameter` for a zero request.
pub fn clamp_window_length(requested: usize, subset_len: usize) -> Result<usize> {
    if requested == 0 {
        return Err(SignalError::invalid(
            Stage::ShapePreserving,
            "window_length",
            "requested window length must be at least 1",
        ));
    }
    if subset_len < 3 {
        return Err(SignalError::InsufficientData {
            stage: Stage::Subset,
            required: 3,
            actual: subset_len,
        });
    }
    let bound = if subset_len % 2 == 0 {
        subset_len - 1
    } else {
        subset_len - 2
    };
    let window = requested.min(bound);
    Ok(if window % 2 == 0 { window - 1 } else { window })
}

/// Runs the conditioning transforms with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if [`PipelineConfig::validate`] fails.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Conditions the first read of `source`.
    ///
    /// # Errors
    ///
    /// * `EmptySource` if the source has no reads; no transform runs in that case.
    /// * `NoSignalData` if the first read has no samples.
    /// * Any error of [`Pipeline::condition`].
    pub fn run<S: SignalSource + ?Sized>(&self, source: &mut S) -> Result<ConditionedSignal> {
        let read = first_read(source)?;
        self.condition(&source.identifier(), &read)
    }

    /// Conditions a single read.
    ///
    /// # Errors
    ///
    /// * `NoSignalData` if the read has no samples.
    /// * `InsufficientData` if the selected subset is too short for a transform.
    /// * `InvalidParameter` if a transform rejects its configuration for this subset.
    pub fn condition(&self, source_id: &str, read: &Read) -> Result<ConditionedSignal> {
        if !read.has_signal() {
            return Err(SignalError::NoSignalData(read.read_id.clone()));
        }
        let total_len = read.signal.len();
        let subset_len = self.config.subset.select_len(total_len)?;
        if subset_len == 0 {
            return Err(SignalError::InsufficientData {
                stage: Stage::Subset,
                required: 1,
                actual: subset_len,
            });
        }
        let subset = &read.signal[..subset_len];
        log::info!(
            "Processing first {} of {} points of read {} from {}",
            subset_len,
            total_len,
            read.read_id,
            source_id
        );

        log::debug!("Applying Butterworth low-pass filter {:?}", self.config.low_pass);
        let low_passed = low_pass(subset, &self.config.low_pass)?;

        let smoothing = SmoothingConfig {
            window_length: clamp_window_length(self.config.smoothing.window_length, subset_len)?,
            ..self.config.smoothing
        };
        if smoothing.window_length != self.config.smoothing.window_length {
            log::debug!(
                "Clamped Savitzky-Golay window from {} to {}",
                self.config.smoothing.window_length,
                smoothing.window_length
            );
        }
        log::debug!("Applying Savitzky-Golay filter {:?}", smoothing);
        let shape_preserving = savgol_filter(subset, &smoothing)?;

        log::debug!(
            "Calculating rolling standard deviation over {:?} input, {:?}",
            self.config.volatility_input,
            self.config.volatility
        );
        let volatility_input = match self.config.volatility_input {
            VolatilityInput::Raw => subset,
            VolatilityInput::LowPass => low_passed.as_slice(),
            VolatilityInput::ShapePreserving => shape_preserving.as_slice(),
        };
        let volatility = rolling_std(volatility_input, &self.config.volatility)?;

        Ok(ConditionedSignal {
            source_id: source_id.to_string(),
            read_id: read.read_id.clone(),
            total_len,
            subset_len,
            smoothing_window: smoothing.window_length,
            raw: subset.to_vec(),
            low_pass: low_passed,
            shape_preserving,
            volatility,
        })
    }
}
