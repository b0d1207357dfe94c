//! Intents, receipts and the three-stage submission status.

use crate::error::ClientError;
use dao_governance::{CommitSeq, Direction, ErrorClass, ExecutionOutcome, GovernanceError, Vote};
use dao_treasury::ContributionReceipt;
use dao_types::{FundAmount, ProposalId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle for a submitted intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(u64);

impl TicketId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A mutating request, submitted on behalf of a caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Intent {
    Contribute {
        amount: FundAmount,
    },
    CreateProtocol {
        title: String,
        description: String,
    },
    Vote {
        id: ProposalId,
        direction: Direction,
        weight: u128,
    },
    Execute {
        id: ProposalId,
    },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Contribute { .. } => "contribute",
            Self::CreateProtocol { .. } => "create_protocol",
            Self::Vote { .. } => "vote",
            Self::Execute { .. } => "execute",
        }
    }
}

/// What a mined intent produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Contributed(ContributionReceipt),
    Created(ProposalId),
    Voted(Vote),
    Executed(ExecutionOutcome),
}

/// Ledger-side state of a ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Receipt {
    Pending,
    Mined { seq: CommitSeq, effect: Effect },
    Failed { error: GovernanceError },
}

/// Why a submission did not commit, in presentable form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub class: ErrorClass,
    pub message: String,
    pub error: ClientError,
}

impl From<ClientError> for Rejection {
    fn from(error: ClientError) -> Self {
        Self {
            class: error.class(),
            message: error.to_string(),
            error,
        }
    }
}

impl From<GovernanceError> for Rejection {
    fn from(error: GovernanceError) -> Self {
        ClientError::from(error).into()
    }
}

/// Status of a submission as the user sees it: loading, success, or an
/// error with a reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus<T> {
    Pending(TicketId),
    Committed(T),
    Rejected(Rejection),
}

impl<T> TxStatus<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn committed(self) -> Option<T> {
        match self {
            Self::Committed(v) => Some(v),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(r) => Some(r),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TxStatus<U> {
        match self {
            Self::Pending(t) => TxStatus::Pending(t),
            Self::Committed(v) => TxStatus::Committed(f(v)),
            Self::Rejected(r) => TxStatus::Rejected(r),
        }
    }
}

impl Effect {
    pub fn into_contribution(self) -> Option<ContributionReceipt> {
        match self {
            Self::Contributed(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_created(self) -> Option<ProposalId> {
        match self {
            Self::Created(id) => Some(id),
            _ => None,
        }
    }

    pub fn into_vote(self) -> Option<Vote> {
        match self {
            Self::Voted(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_execution(self) -> Option<ExecutionOutcome> {
        match self {
            Self::Executed(o) => Some(o),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_carries_class_and_reason() {
        let r = Rejection::from(GovernanceError::VotingClosed(ProposalId::new(2)));
        assert_eq!(r.class, ErrorClass::UserCorrectable);
        assert_eq!(r.message, "voting on protocol 2 is closed");
    }

    #[test]
    fn map_keeps_pending_and_rejected() {
        let pending: TxStatus<u8> = TxStatus::Pending(TicketId::new(4));
        assert_eq!(pending.map(|v| v + 1), TxStatus::Pending(TicketId::new(4)));
        assert_eq!(TxStatus::Committed(1u8).map(|v| v + 1).committed(), Some(2));
    }
}
