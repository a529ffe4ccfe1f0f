//! Error types for safelist configuration and input decoding
//!
//! A failed safelist check is not an error: it is reported as `false` by
//! [`crate::checker::is_conformant`]. The variants here cover construction
//! problems and inputs that cannot be turned into text at all.

use std::fmt;

/// Errors that can occur while configuring a validator or decoding its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Preset identifier is not one of the known presets
    UnknownPreset(String),
    /// Configuration document could not be read
    InvalidConfig(String),
    /// Character encoding error
    EncodingError(String),
    /// Invalid input data
    InvalidInput(String),
    /// Internal error
    InternalError(String),
}

impl ValidationError {
    /// Get numeric error code for FFI
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidConfig(_) => 1,
            ValidationError::EncodingError(_) => 2,
            ValidationError::UnknownPreset(_) => 3,
            ValidationError::InvalidInput(_) => 5,
            ValidationError::InternalError(_) => 99,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownPreset(name) => {
                write!(f, "Unknown safelist preset '{}'", name)
            }
            ValidationError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            ValidationError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            ValidationError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ValidationError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}
