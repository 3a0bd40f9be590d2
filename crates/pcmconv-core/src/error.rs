//! Error handling for the conversion library
//!
//! Planning and execution report their failures through separate enums so
//! callers can tell a bad format request from a bad buffer. Both are
//! static, deterministic validation failures: nothing is retried and
//! nothing is partially applied.

use std::fmt;
use thiserror::Error;

/// Result type alias for the umbrella error
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors raised while building a conversion plan
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Channel count outside {1, 2} on either side
    #[error("Unsupported channel count: {channels} (supported: 1, 2)")]
    UnsupportedChannelCount {
        /// Offending channel count
        channels: u8,
    },

    /// Sample rate outside [1, 2^18] on either side
    #[error("Sample rate out of range: {rate}Hz (range: {min}-{max})")]
    RateOutOfRange {
        /// Offending sample rate
        rate: u32,
        /// Smallest accepted rate
        min: u32,
        /// Largest accepted rate
        max: u32,
    },

    /// Polyphase ratio outside [31/64, 64/31]
    #[error("Resampling ratio {ratio} outside the polyphase range")]
    RatioOutOfRange {
        /// Offending ratio
        ratio: f64,
    },
}

/// Errors raised while executing a plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// No buffer was supplied for the conversion
    #[error("No buffer allocated for conversion")]
    NoBuffer,

    /// No plan was supplied for the conversion
    #[error("No converter given")]
    NoPlan,

    /// The declared payload length does not fit in the buffer
    #[error("Length {length} exceeds buffer of {capacity} bytes")]
    LengthExceedsBuffer {
        /// Declared payload length
        length: usize,
        /// Buffer size
        capacity: usize,
    },

    /// The buffer cannot hold the largest intermediate result
    #[error("Buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall {
        /// Bytes required by the plan
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// Streaming block shorter than the filter history
    #[error("Block of {frames} frames is shorter than the {required} frames streaming needs")]
    BlockTooShort {
        /// Frames in the block
        frames: usize,
        /// Minimum frames per block
        required: usize,
    },

    /// Stream state was created for a different plan
    #[error("Stream state does not match the plan: {details}")]
    StreamMismatch {
        /// What differs
        details: String,
    },
}

/// Umbrella error for host-level operations
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Planning failed
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Execution failed
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// I/O operation failed
    #[error("I/O operation failed: {reason}")]
    Io {
        /// Underlying error message
        reason: String,
    },
}

impl ConvertError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Plan(_) => ErrorCategory::Configuration,
            Self::Exec(ExecError::NoBuffer | ExecError::NoPlan) => ErrorCategory::Configuration,
            Self::Exec(ExecError::StreamMismatch { .. }) => ErrorCategory::Configuration,
            Self::Exec(ExecError::BlockTooShort { .. }) => ErrorCategory::Processing,
            Self::Exec(ExecError::LengthExceedsBuffer { .. } | ExecError::BufferTooSmall { .. }) => {
                ErrorCategory::Memory
            }
            Self::Io { .. } => ErrorCategory::Io,
        }
    }
}

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Format, rate and plan/stream pairing errors
    Configuration,
    /// Audio processing errors
    Processing,
    /// Buffer sizing errors
    Memory,
    /// I/O related errors
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Processing => write!(f, "Processing"),
            Self::Memory => write!(f, "Memory"),
            Self::Io => write!(f, "I/O"),
        }
    }
}

/// Convert from I/O errors
impl From<std::io::Error> for ConvertError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            reason: error.to_string(),
        }
    }
}
