//! Error types for the offline convolution pipeline

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which of the two convolution inputs an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSlot {
    A,
    B,
}

impl fmt::Display for InputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Offline convolution errors
#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Could not read sample {0}: {1}")]
    Decode(InputSlot, String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Could not write output file: {0}")]
    Write(String),

    #[error("DSP error: {0}")]
    Dsp(#[from] irf_dsp::DspError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Job cancelled")]
    Cancelled,
}

/// Result type for offline operations
pub type OfflineResult<T> = Result<T, OfflineError>;
