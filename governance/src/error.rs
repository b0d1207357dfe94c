use dao_treasury::TreasuryError;
use dao_types::{ProposalId, Timestamp};
use thiserror::Error;

/// How a caller should react to a rejected intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The caller can fix the request (input, eligibility, timing).
    UserCorrectable,
    /// Transient; the same request may succeed later.
    Retryable,
    /// The caller acted on an outdated view and should refresh.
    StaleView,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("contribution amount must be greater than zero")]
    InvalidAmount,

    #[error("not eligible: {0}")]
    NotEligible(String),

    #[error("insufficient balance: need {needed} tokens, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("protocol {0} not found")]
    NotFound(ProposalId),

    #[error("voting on protocol {0} is closed")]
    VotingClosed(ProposalId),

    #[error("voting on protocol {id} is open until {expires_at}")]
    VotingStillOpen { id: ProposalId, expires_at: Timestamp },

    #[error("protocol {0} has already been decided")]
    AlreadyDecided(ProposalId),

    #[error("already voted on protocol {0}")]
    AlreadyVoted(ProposalId),

    #[error("arithmetic overflow")]
    Overflow,
}

impl GovernanceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput(_)
            | Self::InvalidAmount
            | Self::NotEligible(_)
            | Self::InsufficientBalance { .. }
            | Self::VotingClosed(_)
            | Self::VotingStillOpen { .. }
            | Self::AlreadyVoted(_)
            | Self::Overflow => ErrorClass::UserCorrectable,
            Self::NotFound(_) | Self::AlreadyDecided(_) => ErrorClass::StaleView,
        }
    }
}

impl From<TreasuryError> for GovernanceError {
    fn from(e: TreasuryError) -> Self {
        match e {
            TreasuryError::InvalidAmount => Self::InvalidAmount,
            TreasuryError::Overflow => Self::Overflow,
        }
    }
}
