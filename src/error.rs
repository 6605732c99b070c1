//! Error types for flag operations.

use thiserror::Error;

/// Result type for flag operations.
pub type FlagResult<T> = Result<T, FlagError>;

/// Flag-specific errors.
///
/// Evaluation itself never returns these: malformed flag *data* degrades to
/// "disabled" or "no variant" instead of failing, so a broken flag can never
/// crash the calling application. Errors are reserved for setup-time problems
/// (missing storage substrate) and malformed inputs to the hashing primitive.
#[derive(Debug, Error)]
pub enum FlagError {
    /// A store backend's required substrate is missing.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Malformed argument to a core primitive.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error from a persistent store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error from a persistent store.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
