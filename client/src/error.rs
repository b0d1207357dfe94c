use crate::intent::TicketId;
use dao_governance::{CommitSeq, ErrorClass, GovernanceError};
use thiserror::Error;

/// Failure to reach the ledger at all. The request may not have arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("ledger request timed out")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("read reflects commit {as_of}, session has seen {watermark}")]
    StaleRead {
        as_of: CommitSeq,
        watermark: CommitSeq,
    },

    #[error("unknown ticket {0}")]
    UnknownTicket(TicketId),

    #[error("ledger answered {0} with a mismatched effect")]
    UnexpectedEffect(&'static str),
}

impl ClientError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Governance(e) => e.class(),
            Self::Transport(_) | Self::StaleRead { .. } => ErrorClass::Retryable,
            Self::UnknownTicket(_) | Self::UnexpectedEffect(_) => ErrorClass::StaleView,
        }
    }
}
