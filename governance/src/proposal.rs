//! Proposals ("protocols"), votes, and their lifecycle.

use dao_types::{Principal, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};

/// Where a proposal is in its lifecycle at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ProposalStatus {
    /// Undecided and inside the voting window; accepts votes.
    Open,
    /// Undecided, voting window elapsed; waiting for `execute`.
    Expired,
    /// Terminal.
    Decided { passed: bool },
}

/// The fixed outcome of a decided proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub passed: bool,
    pub decided_at: Timestamp,
}

/// Side of a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `true` is an upvote, as the contract's `performVote` encodes it.
    pub fn from_bool(up: bool) -> Self {
        if up {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// An immutable vote record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: ProposalId,
    pub voter: Principal,
    pub timestamp: Timestamp,
    pub direction: Direction,
    /// Whole tokens committed to this cast.
    pub weight: u128,
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Principal,
    pub title: String,
    pub description: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    /// Weighted upvote total, in whole tokens.
    pub upvotes: u128,
    /// Weighted downvote total, in whole tokens.
    pub downvotes: u128,
    /// Set exactly once, by the first successful execute.
    decision: Option<Decision>,
}

impl Proposal {
    pub(crate) fn new(
        id: ProposalId,
        proposer: Principal,
        title: String,
        description: String,
        created_at: Timestamp,
        voting_window_secs: u64,
    ) -> Self {
        Self {
            id,
            proposer,
            title,
            description,
            created_at,
            expires_at: created_at.saturating_add_secs(voting_window_secs),
            upvotes: 0,
            downvotes: 0,
            decision: None,
        }
    }

    pub fn status(&self, now: Timestamp) -> ProposalStatus {
        match self.decision {
            Some(d) => ProposalStatus::Decided { passed: d.passed },
            None if now < self.expires_at => ProposalStatus::Open,
            None => ProposalStatus::Expired,
        }
    }

    pub fn decision(&self) -> Option<&Decision> {
        self.decision.as_ref()
    }

    pub fn decided(&self) -> bool {
        self.decision.is_some()
    }

    /// Whether the proposal passed; `false` while undecided.
    pub fn passed(&self) -> bool {
        self.decision.map(|d| d.passed).unwrap_or(false)
    }

    /// Majority rule with ties rejected.
    pub fn tally_passes(&self) -> bool {
        self.upvotes > self.downvotes
    }

    /// Write-once: a second call leaves the first decision in place.
    pub(crate) fn decide(&mut self, now: Timestamp) -> Decision {
        let passed = self.tally_passes();
        *self.decision.get_or_insert(Decision {
            passed,
            decided_at: now,
        })
    }
}

/// Listing filter, matching the client's All / Open / Closed tabs.
///
/// `Open` means undecided (including expired-but-unexecuted proposals);
/// `Closed` means decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl ProtocolFilter {
    pub fn matches(&self, proposal: &Proposal) -> bool {
        match self {
            Self::All => true,
            Self::Open => !proposal.decided(),
            Self::Closed => proposal.decided(),
        }
    }
}
