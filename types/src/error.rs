//! Top-level error type shared across crates.

use thiserror::Error;

/// Parse and arithmetic errors for the fundamental types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DaoError {
    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("arithmetic overflow")]
    Overflow,
}
