//! Treasury-specific errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreasuryError {
    #[error("contribution amount must be greater than zero")]
    InvalidAmount,

    #[error("arithmetic overflow in treasury accounting")]
    Overflow,
}
