//! Error types for Rivulet
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RivuletError
pub type Result<T> = std::result::Result<T, RivuletError>;

/// Unified error type for Rivulet operations
#[derive(Debug, Error)]
pub enum RivuletError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    /// A datum header or body could not be decoded from the log
    #[error("Corrupt datum: {0}")]
    Corrupt(String),

    #[error("Invalid UTF-8 in datum: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // -------------------------------------------------------------------------
    // Capacity Errors
    // -------------------------------------------------------------------------
    /// In-place payload overwrite would grow the datum
    #[error("Payload overflow: new payload must be at most {max_size} bytes")]
    PayloadOverflow { max_size: usize },

    // -------------------------------------------------------------------------
    // Value Errors
    // -------------------------------------------------------------------------
    #[error("Type mismatch: expected {expected}-byte payload, got {actual} bytes")]
    TypeMismatch { expected: usize, actual: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RivuletError {
    /// True for faults that scans treat as the end of readable data
    pub fn is_format_fault(&self) -> bool {
        matches!(self, RivuletError::Corrupt(_) | RivuletError::InvalidUtf8(_))
    }
}
