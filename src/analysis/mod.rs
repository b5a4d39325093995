/// This module contains features derived from a conditioned signal.
///
/// The available submodules are:
///
/// - `volatility`: Centered rolling standard deviation exposing local signal volatility.
pub mod volatility;
