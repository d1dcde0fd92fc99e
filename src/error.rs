//! # Error Types
//!
//! Custom error types for POCSAG TX using `thiserror`.

use thiserror::Error;

/// Outcome of a POCSAG encode call that did not produce a message
///
/// Validation runs in a fixed order (address, source, batch option,
/// polarity option) and the first violation wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// No encode has completed since the context was reset
    #[error("encode outcome undetermined")]
    Undetermined,

    /// Address outside 1..=0x1FFFFF
    #[error("invalid address {0} (must be 1..=2097151)")]
    InvalidAddress(i64),

    /// Source qualifier outside 0..=3
    #[error("invalid source {0} (must be 0..=3)")]
    InvalidSource(i64),

    /// Batch option outside 0..=2
    #[error("invalid batch option {0} (must be 0, 1 or 2)")]
    InvalidBatchOption(i64),

    /// Polarity option outside 0..=1
    #[error("invalid polarity option {0} (must be 0 or 1)")]
    InvalidPolarityOption(i64),
}

/// Main error type for POCSAG TX
#[derive(Debug, Error)]
pub enum PagerError {
    /// POCSAG encoder rejected its input
    #[error("POCSAG encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Operator command could not be parsed or is out of range
    #[error("Command error: {0}")]
    Command(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No radio modem found (tried: {0})")]
    SerialPortNotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for POCSAG TX
pub type Result<T> = std::result::Result<T, PagerError>;
