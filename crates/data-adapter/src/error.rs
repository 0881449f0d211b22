//! Error types for data adapters

use thiserror::Error;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a data adapter can report to its host
#[derive(Error, Debug)]
pub enum Error {
    /// The item cannot be subscribed (e.g. unknown to the provider)
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Unrecoverable provider failure
    #[error("Provider failure: {0}")]
    Failure(String),
}
