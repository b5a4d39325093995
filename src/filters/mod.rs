//! Smoothing filters applied to a raw current trace.
//!
//! The `butterworth` submodule provides the zero-phase low-pass smoother.
//! The `savgol` submodule provides the shape-preserving Savitzky-Golay smoother.
pub mod butterworth;
pub mod savgol;
