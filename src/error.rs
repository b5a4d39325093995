//! Error taxonomy shared by every stage of the conditioning pipeline.

use std::fmt;

use thiserror::Error;

/// The component that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Prefix selection and window clamping in the pipeline.
    Subset,
    /// Zero-phase Butterworth low-pass.
    LowPass,
    /// Savitzky-Golay smoothing.
    ShapePreserving,
    /// Rolling standard deviation.
    Volatility,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Subset => "subset selection",
            Stage::LowPass => "low-pass filter",
            Stage::ShapePreserving => "Savitzky-Golay filter",
            Stage::Volatility => "rolling volatility",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("{stage}: invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        stage: Stage,
        parameter: &'static str,
        reason: String,
    },

    #[error("{stage}: insufficient data, need at least {required} samples but got {actual}")]
    InsufficientData {
        stage: Stage,
        required: usize,
        actual: usize,
    },

    #[error("Source contains no reads: {0}")]
    EmptySource(String),

    #[error("Read carries no signal samples: {0}")]
    NoSignalData(String),

    #[error("Signal source not found: {0}")]
    SourceNotFound(String),

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SignalError {
    pub(crate) fn invalid(stage: Stage, parameter: &'static str, reason: impl Into<String>) -> Self {
        SignalError::InvalidParameter {
            stage,
            parameter,
            reason: reason.into(),
        }
    }

    /// The stage that produced the error, if it came from a transform.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SignalError::InvalidParameter { stage, .. }
            | SignalError::InsufficientData { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SignalError>;
