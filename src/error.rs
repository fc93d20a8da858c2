use std::collections::TryReserveError;

use thiserror::Error;

/// Errors raised while setting up loggers.
///
/// None of these ever escape the entry API: a failing logger or entry
/// degrades to a no-op and the failure is reported through the `log` facade.
#[derive(Debug, Error)]
pub enum Error {
    /// A buffer or pool could not reserve memory.
    #[error("allocation failed: {0}")]
    Alloc(#[from] TryReserveError),

    /// The process-wide pool was used before `global::init`.
    #[error("global logger pool is not initialized")]
    NotInitialized,

    /// `global::init` was called while a pool was already installed.
    #[error("global logger pool is already initialized")]
    AlreadyInitialized,

    #[error("unknown log level: {0:?}")]
    InvalidLevel(String),

    #[error("unknown log format: {0:?}")]
    InvalidFormat(String),
}

/// Failures of `Generator::next`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GenerateError {
    /// The clock reported a time before the Unix epoch.
    #[error("clock is before the unix epoch")]
    TimeRegression,

    /// The millisecond timestamp no longer fits in 48 bits.
    #[error("timestamp exceeds 48 bits")]
    TimeOverflow,

    /// All 2^80 random values of the current millisecond are used up.
    #[error("random component exhausted for this millisecond")]
    RandomOverflow,
}

/// Failures decoding a ULID from text or bytes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid length {0}")]
    InvalidLength(usize),

    #[error("invalid character {0:?}")]
    InvalidChar(char),

    /// The leading character encodes more than 128 bits.
    #[error("value does not fit in 128 bits")]
    Overflow,
}
