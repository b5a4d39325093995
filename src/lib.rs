//! Nanopore squiggle conditioning
//!
//! This crate turns a raw nanopore current trace into a denoised, feature-augmented view
//! suitable for inspection or event detection. It provides a zero-phase Butterworth
//! low-pass, Savitzky-Golay smoothing, a rolling volatility feature and a pipeline that
//! applies all three to a prefix of a read.

pub mod analysis;
pub mod error;
pub mod filters;
pub mod pipeline;
pub mod source;

pub use error::{Result, SignalError, Stage};
