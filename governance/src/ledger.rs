//! Proposal ledger — storage, weighted tallying, and the decision state machine.
//!
//! `Open → Expired → Decided`. Votes are accepted only while `Open`; the
//! first `execute` at or after expiry fixes the outcome.

use crate::error::GovernanceError;
use crate::proposal::{Direction, Proposal, ProposalStatus, ProtocolFilter, Vote};
use dao_treasury::StakeholderRegistry;
use dao_types::{GovernanceParams, Principal, ProposalId, ReplayPolicy, Timestamp, VotePolicy};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of an `execute` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub id: ProposalId,
    pub passed: bool,
    pub upvotes: u128,
    pub downvotes: u128,
    pub decided_at: Timestamp,
    /// `true` only for the call that performed the decided transition.
    pub newly_decided: bool,
}

/// Number of proposals in each lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub open: usize,
    pub expired: usize,
    pub passed: usize,
    pub rejected: usize,
}

/// Arena of proposals keyed by id, with an append-only vote log per proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalLedger {
    params: GovernanceParams,
    /// Index == id.
    proposals: Vec<Proposal>,
    /// Index == proposal id.
    votes: Vec<Vec<Vote>>,
}

impl ProposalLedger {
    pub fn new(params: GovernanceParams) -> Self {
        Self {
            params,
            proposals: Vec::new(),
            votes: Vec::new(),
        }
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    /// Create a proposal on behalf of `proposer`.
    pub fn create(
        &mut self,
        registry: &StakeholderRegistry,
        proposer: &Principal,
        title: &str,
        description: &str,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        if title.trim().is_empty() {
            return Err(GovernanceError::InvalidInput("title is required".into()));
        }
        if description.trim().is_empty() {
            return Err(GovernanceError::InvalidInput(
                "description is required".into(),
            ));
        }
        if !registry.is_stakeholder(proposer) {
            return Err(GovernanceError::NotEligible(format!(
                "{proposer} is not a stakeholder"
            )));
        }
        let balance = registry.balance_of(proposer);
        if balance < self.params.proposal_min_balance {
            return Err(GovernanceError::NotEligible(format!(
                "{proposer} holds {balance} tokens, proposing needs {}",
                self.params.proposal_min_balance
            )));
        }

        let id = ProposalId::new(self.proposals.len() as u64);
        self.proposals.push(Proposal::new(
            id,
            *proposer,
            title.to_string(),
            description.to_string(),
            now,
            self.params.voting_window_secs,
        ));
        self.votes.push(Vec::new());
        Ok(id)
    }

    /// Cast a weighted vote. Weight is checked against the voter's balance,
    /// not debited from it.
    pub fn vote(
        &mut self,
        registry: &StakeholderRegistry,
        id: ProposalId,
        voter: &Principal,
        direction: Direction,
        weight: u128,
        now: Timestamp,
    ) -> Result<Vote, GovernanceError> {
        if weight == 0 {
            return Err(GovernanceError::InvalidInput(
                "vote weight must be at least one token".into(),
            ));
        }
        let idx = self.index_of(id)?;
        let proposal = &self.proposals[idx];
        if proposal.status(now) != ProposalStatus::Open {
            return Err(GovernanceError::VotingClosed(id));
        }
        if !registry.is_stakeholder(voter) {
            return Err(GovernanceError::NotEligible(format!(
                "{voter} is not a stakeholder"
            )));
        }
        let available = registry.balance_of(voter).whole_units();
        if weight > available {
            return Err(GovernanceError::InsufficientBalance {
                needed: weight,
                available,
            });
        }

        let log = &self.votes[idx];
        match self.params.vote_policy {
            VotePolicy::WeightChecked => {}
            VotePolicy::OncePerProposal => {
                if log.iter().any(|v| v.voter == *voter) {
                    return Err(GovernanceError::AlreadyVoted(id));
                }
            }
            VotePolicy::BalanceBounded => {
                let committed: u128 = log
                    .iter()
                    .filter(|v| v.voter == *voter)
                    .map(|v| v.weight)
                    .sum();
                let needed = committed
                    .checked_add(weight)
                    .ok_or(GovernanceError::Overflow)?;
                if needed > available {
                    return Err(GovernanceError::InsufficientBalance { needed, available });
                }
            }
        }

        let (upvotes, downvotes) = match direction {
            Direction::Up => (
                proposal
                    .upvotes
                    .checked_add(weight)
                    .ok_or(GovernanceError::Overflow)?,
                proposal.downvotes,
            ),
            Direction::Down => (
                proposal.upvotes,
                proposal
                    .downvotes
                    .checked_add(weight)
                    .ok_or(GovernanceError::Overflow)?,
            ),
        };

        let vote = Vote {
            proposal_id: id,
            voter: *voter,
            timestamp: now,
            direction,
            weight,
        };
        let proposal = &mut self.proposals[idx];
        proposal.upvotes = upvotes;
        proposal.downvotes = downvotes;
        self.votes[idx].push(vote.clone());
        Ok(vote)
    }

    /// Decide a proposal whose voting window has elapsed.
    pub fn execute(
        &mut self,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<ExecutionOutcome, GovernanceError> {
        let idx = self.index_of(id)?;
        let proposal = &mut self.proposals[idx];

        if let Some(decision) = proposal.decision().copied() {
            return match self.params.replay_policy {
                ReplayPolicy::ReturnStored => {
                    debug!(%id, passed = decision.passed, "execute replay, returning stored outcome");
                    Ok(ExecutionOutcome {
                        id,
                        passed: decision.passed,
                        upvotes: proposal.upvotes,
                        downvotes: proposal.downvotes,
                        decided_at: decision.decided_at,
                        newly_decided: false,
                    })
                }
                ReplayPolicy::Reject => Err(GovernanceError::AlreadyDecided(id)),
            };
        }
        if now < proposal.expires_at {
            return Err(GovernanceError::VotingStillOpen {
                id,
                expires_at: proposal.expires_at,
            });
        }

        let decision = proposal.decide(now);
        Ok(ExecutionOutcome {
            id,
            passed: decision.passed,
            upvotes: proposal.upvotes,
            downvotes: proposal.downvotes,
            decided_at: decision.decided_at,
            newly_decided: true,
        })
    }

    pub fn get(&self, id: ProposalId) -> Result<&Proposal, GovernanceError> {
        self.index_of(id).map(|idx| &self.proposals[idx])
    }

    /// All proposals in id (creation) order.
    pub fn list(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// The append-only vote log of one proposal, oldest first.
    pub fn votes_of(&self, id: ProposalId) -> Result<&[Vote], GovernanceError> {
        self.index_of(id).map(|idx| self.votes[idx].as_slice())
    }

    pub fn filter(&self, filter: ProtocolFilter) -> Vec<&Proposal> {
        self.proposals.iter().filter(|p| filter.matches(p)).collect()
    }

    pub fn count_by_status(&self, now: Timestamp) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for p in &self.proposals {
            match p.status(now) {
                ProposalStatus::Open => counts.open += 1,
                ProposalStatus::Expired => counts.expired += 1,
                ProposalStatus::Decided { passed: true } => counts.passed += 1,
                ProposalStatus::Decided { passed: false } => counts.rejected += 1,
            }
        }
        counts
    }

    fn index_of(&self, id: ProposalId) -> Result<usize, GovernanceError> {
        let idx = usize::try_from(id.raw()).map_err(|_| GovernanceError::NotFound(id))?;
        if idx < self.proposals.len() {
            Ok(idx)
        } else {
            Err(GovernanceError::NotFound(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_treasury::Treasury;
    use dao_types::{FundAmount, UNIT};

    const WINDOW: u64 = 7 * 24 * 3600;

    fn principal(n: u8) -> Principal {
        Principal::from_bytes([n; 20])
    }

    /// A treasury where principals 1..=4 hold 10 tokens each and principal 9
    /// contributed 0.3 (not a stakeholder).
    fn funded() -> Treasury {
        let mut t = Treasury::from_params(&GovernanceParams::default());
        for n in 1..=4 {
            t.contribute(&principal(n), FundAmount::new(10 * UNIT), Timestamp::new(0))
                .unwrap();
        }
        t.contribute(&principal(9), FundAmount::new(3 * UNIT / 10), Timestamp::new(0))
            .unwrap();
        t
    }

    fn ledger_with(policy: VotePolicy, replay: ReplayPolicy) -> ProposalLedger {
        ProposalLedger::new(GovernanceParams {
            vote_policy: policy,
            replay_policy: replay,
            ..GovernanceParams::default()
        })
    }

    fn ledger() -> ProposalLedger {
        ledger_with(VotePolicy::WeightChecked, ReplayPolicy::ReturnStored)
    }

    #[test]
    fn create_assigns_sequential_ids_and_window() {
        let t = funded();
        let mut l = ledger();
        let a = l
            .create(t.registry(), &principal(1), "A", "first", Timestamp::new(100))
            .unwrap();
        let b = l
            .create(t.registry(), &principal(2), "B", "second", Timestamp::new(200))
            .unwrap();
        assert_eq!(a, ProposalId::new(0));
        assert_eq!(b, ProposalId::new(1));
        let p = l.get(a).unwrap();
        assert_eq!(p.expires_at, Timestamp::new(100 + WINDOW));
        assert!(!p.decided());
    }

    #[test]
    fn create_rejects_blank_text() {
        let t = funded();
        let mut l = ledger();
        let err = l
            .create(t.registry(), &principal(1), "   ", "desc", Timestamp::new(0))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidInput(_)));
        let err = l
            .create(t.registry(), &principal(1), "title", "", Timestamp::new(0))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidInput(_)));
        assert!(l.is_empty());
    }

    #[test]
    fn create_requires_stakeholder_with_one_token() {
        let mut t = funded();
        let mut l = ledger();
        let err = l
            .create(t.registry(), &principal(9), "t", "d", Timestamp::new(0))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::NotEligible(_)));

        // A stakeholder with 0.6 tokens is admitted but cannot propose.
        t.contribute(&principal(8), FundAmount::new(6 * UNIT / 10), Timestamp::new(0))
            .unwrap();
        let err = l
            .create(t.registry(), &principal(8), "t", "d", Timestamp::new(0))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::NotEligible(_)));
        assert!(l.is_empty());
    }

    #[test]
    fn vote_tallies_by_direction() {
        let t = funded();
        let mut l = ledger();
        let id = l
            .create(t.registry(), &principal(1), "t", "d", Timestamp::new(0))
            .unwrap();
        l.vote(t.registry(), id, &principal(2), Direction::Up, 3, Timestamp::new(10))
            .unwrap();
        l.vote(t.registry(), id, &principal(3), Direction::Down, 5, Timestamp::new(20))
            .unwrap();
        let p = l.get(id).unwrap();
        assert_eq!((p.upvotes, p.downvotes), (3, 5));
        let log = l.votes_of(id).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].voter, principal(2));
        assert_eq!(log[1].direction, Direction::Down);
    }

    #[test]
    fn vote_checks_in_order() {
        let t = funded();
        let mut l = ledger();
        let missing = ProposalId::new(42);
        assert_eq!(
            l.vote(t.registry(), missing, &principal(2), Direction::Up, 1, Timestamp::new(0)),
            Err(GovernanceError::NotFound(missing))
        );
        let id = l
            .create(t.registry(), &principal(1), "t", "d", Timestamp::new(0))
            .unwrap();
        assert!(matches!(
            l.vote(t.registry(), id, &principal(2), Direction::Up, 0, Timestamp::new(1)),
            Err(GovernanceError::InvalidInput(_))
        ));
        assert!(matches!(
            l.vote(t.registry(), id, &principal(9), Direction::Up, 1, Timestamp::new(1)),
            Err(GovernanceError::NotEligible(_))
        ));
        assert_eq!(
            l.vote(t.registry(), id, &principal(2), Direction::Up, 11, Timestamp::new(1)),
            Err(GovernanceError::InsufficientBalance {
                needed: 11,
                available: 10
            })
        );
        assert_eq!(
            l.vote(t.registry(), id, &principal(2), Direction::Up, 1, Timestamp::new(WINDOW)),
            Err(GovernanceError::VotingClosed(id))
        );
        assert!(l.votes_of(id).unwrap().is_empty());
        assert_eq!(l.get(id).unwrap().upvotes, 0);
    }

    #[test]
    fn weight_checked_policy_allows_reusing_tokens() {
        let t = funded();
        let mut l = ledger();
        let id = l
            .create(t.registry(), &principal(1), "t", "d", Timestamp::new(0))
            .unwrap();
        for _ in 0..3 {
            l.vote(t.registry(), id, &principal(2), Direction::Up, 10, Timestamp::new(1))
                .unwrap();
        }
        assert_eq!(l.get(id).unwrap().upvotes, 30);
    }

    #[test]
    fn once_per_proposal_policy_rejects_second_cast() {
        let t = funded();
        let mut l = ledger_with(VotePolicy::OncePerProposal, ReplayPolicy::ReturnStored);
        let a = l
            .create(t.registry(), &principal(1), "a", "d", Timestamp::new(0))
            .unwrap();
        let b = l
            .create(t.registry(), &principal(1), "b", "d", Timestamp::new(0))
            .unwrap();
        l.vote(t.registry(), a, &principal(2), Direction::Up, 4, Timestamp::new(1))
            .unwrap();
        assert_eq!(
            l.vote(t.registry(), a, &principal(2), Direction::Down, 1, Timestamp::new(2)),
            Err(GovernanceError::AlreadyVoted(a))
        );
        // The same tokens may still back a vote on another proposal.
        l.vote(t.registry(), b, &principal(2), Direction::Up, 10, Timestamp::new(2))
            .unwrap();
    }

    #[test]
    fn balance_bounded_policy_caps_cumulative_weight() {
        let t = funded();
        let mut l = ledger_with(VotePolicy::BalanceBounded, ReplayPolicy::ReturnStored);
        let id = l
            .create(t.registry(), &principal(1), "t", "d", Timestamp::new(0))
            .unwrap();
        l.vote(t.registry(), id, &principal(2), Direction::Up, 6, Timestamp::new(1))
            .unwrap();
        l.vote(t.registry(), id, &principal(2), Direction::Down, 4, Timestamp::new(2))
            .unwrap();
        assert_eq!(
            l.vote(t.registry(), id, &principal(2), Direction::Up, 1, Timestamp::new(3)),
            Err(GovernanceError::InsufficientBalance {
                needed: 11,
                available: 10
            })
        );
    }

    #[test]
    fn execute_before_expiry_fails() {
        let t = funded();
        let mut l = ledger();
        let id = l
            .create(t.registry(), &principal(1), "t", "d", Timestamp::new(0))
            .unwrap();
        assert_eq!(
            l.execute(id, Timestamp::new(WINDOW - 1)),
            Err(GovernanceError::VotingStillOpen {
                id,
                expires_at: Timestamp::new(WINDOW)
            })
        );
        assert!(!l.get(id).unwrap().decided());
    }

    #[test]
    fn execute_replay_returns_stored_outcome() {
        let t = funded();
        let mut l = ledger();
        let id = l
            .create(t.registry(), &principal(1), "t", "d", Timestamp::new(0))
            .unwrap();
        l.vote(t.registry(), id, &principal(2), Direction::Up, 3, Timestamp::new(1))
            .unwrap();
        let first = l.execute(id, Timestamp::new(WINDOW)).unwrap();
        assert!(first.passed);
        assert!(first.newly_decided);
        let second = l.execute(id, Timestamp::new(WINDOW + 50)).unwrap();
        assert!(second.passed);
        assert!(!second.newly_decided);
        assert_eq!(second.decided_at, first.decided_at);
    }

    #[test]
    fn execute_replay_rejected_under_reject_policy() {
        let t = funded();
        let mut l = ledger_with(VotePolicy::WeightChecked, ReplayPolicy::Reject);
        let id = l
            .create(t.registry(), &principal(1), "t", "d", Timestamp::new(0))
            .unwrap();
        l.execute(id, Timestamp::new(WINDOW)).unwrap();
        assert_eq!(
            l.execute(id, Timestamp::new(WINDOW)),
            Err(GovernanceError::AlreadyDecided(id))
        );
    }

    #[test]
    fn decided_proposal_rejects_votes() {
        let t = funded();
        let mut l = ledger();
        let id = l
            .create(t.registry(), &principal(1), "t", "d", Timestamp::new(0))
            .unwrap();
        l.execute(id, Timestamp::new(WINDOW)).unwrap();
        assert_eq!(
            l.vote(t.registry(), id, &principal(2), Direction::Up, 1, Timestamp::new(WINDOW)),
            Err(GovernanceError::VotingClosed(id))
        );
    }

    #[test]
    fn status_counts_and_filters() {
        let t = funded();
        let mut l = ledger();
        let a = l
            .create(t.registry(), &principal(1), "a", "d", Timestamp::new(0))
            .unwrap();
        let b = l
            .create(t.registry(), &principal(1), "b", "d", Timestamp::new(0))
            .unwrap();
        l.create(t.registry(), &principal(1), "c", "d", Timestamp::new(WINDOW))
            .unwrap();
        l.vote(t.registry(), a, &principal(2), Direction::Up, 1, Timestamp::new(1))
            .unwrap();
        l.execute(a, Timestamp::new(WINDOW)).unwrap();

        let counts = l.count_by_status(Timestamp::new(WINDOW + 1));
        assert_eq!(
            counts,
            StatusCounts {
                open: 1,
                expired: 1,
                passed: 1,
                rejected: 0
            }
        );
        assert_eq!(l.filter(ProtocolFilter::Closed).len(), 1);
        assert_eq!(l.filter(ProtocolFilter::Open).len(), 2);
        assert_eq!(l.filter(ProtocolFilter::All).len(), 3);
        assert!(!l.get(b).unwrap().decided());
    }
}
