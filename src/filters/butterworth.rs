//! Zero-phase Butterworth low-pass filtering.
//!
//! The filter is designed as a cascade of second-order sections (biquads) from the analog
//! Butterworth prototype through the bilinear transform with frequency prewarping. It is then
//! run once forward and once backward over the whole signal so that the phase responses of
//! the two passes cancel.
//!
//! # Edge handling
//!
//! Before filtering, the signal is extended at both ends by an odd reflection of
//! [`ButterworthLowPass::pad_len`] samples (`2 * x[0] - x[k]` on the left, the mirrored
//! expression on the right). Each pass starts from the steady-state filter state for a
//! constant input equal to its first sample, so edges are neither pulled towards zero nor
//! delayed. The padding is removed from the output.
//!
//! # Example
//!
//! ```rust
//! use squiggle_algos::filters::butterworth::{low_pass, FilterConfig};
//!
//! let signal: Vec<f64> = (0..200).map(|i| 80.0 + (i as f64 * 0.9).sin()).collect();
//! let smoothed = low_pass(&signal, &FilterConfig::default()).unwrap();
//! assert_eq!(smoothed.len(), signal.len());
//! ```

use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError, Stage};

/// Parameters of the low-pass smoother.
///
/// * `cutoff` - normalized cutoff frequency, where 1.0 is the Nyquist frequency. Must lie in (0, 1).
/// * `order` - filter order; higher orders roll off more steeply. Must be at least 1.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    pub cutoff: f64,
    pub order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cutoff: 0.01,
            order: 4,
        }
    }
}

impl FilterConfig {
    pub fn new(cutoff: f64, order: usize) -> Self {
        Self { cutoff, order }
    }

    /// Checks the cutoff and order invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `cutoff` is not strictly between 0 and 1 (NaN included)
    /// or if `order` is zero.
    pub fn validate(&self) -> Result<()> {
        if !(self.cutoff > 0.0 && self.cutoff < 1.0) {
            return Err(SignalError::invalid(
                Stage::LowPass,
                "cutoff",
                format!(
                    "normalized cutoff must lie in (0, 1), got {}",
                    self.cutoff
                ),
            ));
        }
        if self.order < 1 {
            return Err(SignalError::invalid(
                Stage::LowPass,
                "order",
                "filter order must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Second-order section `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`.
///
/// A first-order section is stored with `b2 = a2 = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 2],
}

impl Biquad {
    /// Gain of the section at zero frequency.
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / (1.0 + self.a[0] + self.a[1])
    }

    /// Transposed direct form II state reached after a long run of unit input.
    fn steady_state(&self) -> [f64; 2] {
        let gain = self.dc_gain();
        [gain - self.b[0], self.b[2] - self.a[1] * gain]
    }

    #[inline]
    fn step(&self, input: f64, state: &mut [f64; 2]) -> f64 {
        let output = self.b[0] * input + state[0];
        state[0] = self.b[1] * input - self.a[0] * output + state[1];
        state[1] = self.b[2] * input - self.a[1] * output;
        output
    }
}

/// A designed Butterworth low-pass filter.
#[derive(Debug, Clone)]
pub struct ButterworthLowPass {
    sections: Vec<Biquad>,
    order: usize,
}

impl ButterworthLowPass {
    /// Designs the filter described by `config`.
    ///
    /// The analog prototype poles `s_k = wn * exp(i * pi * (2k + N + 1) / 2N)` are grouped into
    /// conjugate pairs, each pair giving one biquad, with the remaining real pole of an odd
    /// order giving a final first-order section. `wn = tan(pi * cutoff / 2)` prewarps the
    /// cutoff so the digital filter has its -3 dB point exactly at `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the config fails [`FilterConfig::validate`].
    pub fn design(config: &FilterConfig) -> Result<Self> {
        config.validate()?;
        let order = config.order;
        let wn = (PI * config.cutoff / 2.0).tan();
        let wn2 = wn * wn;

        let mut sections = Vec::with_capacity(order.div_ceil(2));
        for k in 0..order / 2 {
            let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
            // s^2 + 2 wn sin(theta) s + wn^2 mapped through s = (1 - z^-1) / (1 + z^-1)
            let damping = 2.0 * wn * theta.sin();
            let a0 = 1.0 + damping + wn2;
            sections.push(Biquad {
                b: [wn2 / a0, 2.0 * wn2 / a0, wn2 / a0],
                a: [2.0 * (wn2 - 1.0) / a0, (1.0 - damping + wn2) / a0],
            });
        }
        if order % 2 == 1 {
            let gain = wn / (1.0 + wn);
            sections.push(Biquad {
                b: [gain, gain, 0.0],
                a: [(wn - 1.0) / (wn + 1.0), 0.0],
            });
        }
        Ok(Self { sections, order })
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of samples reflected onto each end of the signal: three times the length of
    /// the equivalent transfer function's coefficient vectors.
    pub fn pad_len(&self) -> usize {
        3 * (self.order + 1)
    }

    /// Applies the filter forward and backward, returning a zero-phase result of the same
    /// length as `signal`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` unless `signal` is longer than [`Self::pad_len`].
    pub fn filtfilt(&self, signal: &[f64]) -> Result<Vec<f64>> {
        let pad = self.pad_len();
        if signal.len() <= pad {
            return Err(SignalError::InsufficientData {
                stage: Stage::LowPass,
                required: pad + 1,
                actual: signal.len(),
            });
        }
        let initial = self.initial_state();

        let mut extended = odd_extend(signal, pad);
        let first = extended[0];
        self.filter_in_place(&mut extended, &initial, first);

        extended.reverse();
        let first = extended[0];
        self.filter_in_place(&mut extended, &initial, first);
        extended.reverse();

        Ok(extended[pad..pad + signal.len()].to_vec())
    }

    /// Per-section steady state for a unit input into the whole cascade.
    fn initial_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let [z1, z2] = section.steady_state();
                let state = [z1 * scale, z2 * scale];
                scale *= section.dc_gain();
                state
            })
            .collect()
    }

    fn filter_in_place(&self, data: &mut [f64], initial: &[[f64; 2]], level: f64) {
        let mut states: Vec<[f64; 2]> = initial
            .iter()
            .map(|[z1, z2]| [z1 * level, z2 * level])
            .collect();
        for sample in data.iter_mut() {
            let mut value = *sample;
            for (section, state) in self.sections.iter().zip(states.iter_mut()) {
                value = section.step(value, state);
            }
            *sample = value;
        }
    }
}

/// Extends `signal` by `pad` samples at each end with an odd (point-symmetric) reflection.
///
/// Requires `signal.len() > pad`.
fn odd_extend(signal: &[f64], pad: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];
    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|k| 2.0 * first - signal[k]));
    extended.extend_from_slice(signal);
    extended.extend((1..=pad).map(|k| 2.0 * last - signal[n - 1 - k]));
    extended
}

/// Low-pass filters `signal` with a zero-phase Butterworth filter.
///
/// # Errors
///
/// * `InvalidParameter` if the config is invalid.
/// * `InsufficientData` if the signal is not longer than `3 * (order + 1)` samples.
pub fn low_pass(signal: &[f64], config: &FilterConfig) -> Result<Vec<f64>> {
    ButterworthLowPass::design(config)?.filtfilt(signal)
}
