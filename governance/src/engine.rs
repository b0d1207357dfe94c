//! Governance engine — the single serialization point for all state.
//!
//! Treasury, registry and proposal ledger live behind one mutex. Each
//! mutating call runs as one transaction under that lock: read the clock,
//! validate everything, apply, bump the commit sequence. A failed call
//! applies nothing. Eligibility checks therefore always see fully committed
//! balances, and concurrent votes on one proposal cannot lose updates.

use crate::error::GovernanceError;
use crate::hook::{ExecutionHook, NoopHook};
use crate::ledger::{ExecutionOutcome, ProposalLedger, StatusCounts};
use crate::metrics::GovernanceMetrics;
use crate::proposal::{Direction, Proposal, ProtocolFilter, Vote};
use crate::snapshot::EngineSnapshot;
use dao_treasury::{ContributionReceipt, StakeholderRecord, Treasury};
use dao_types::{
    Clock, FundAmount, GovernanceParams, Principal, ProposalId, Timestamp, TokenAmount,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Number of transactions committed so far.
pub type CommitSeq = u64;

/// A value together with the commit sequence it reflects.
///
/// For mutating calls `as_of` is the sequence number the call committed as;
/// for reads it is the latest committed sequence at read time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub as_of: CommitSeq,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            as_of: self.as_of,
            value: f(self.value),
        }
    }
}

/// Whether a successful transaction changed state.
enum Effect {
    Mutated,
    ReadOnly,
}

pub(crate) struct EngineState {
    pub(crate) treasury: Treasury,
    pub(crate) ledger: ProposalLedger,
    pub(crate) seq: CommitSeq,
}

/// The governance engine.
pub struct GovernanceEngine {
    params: GovernanceParams,
    state: Mutex<EngineState>,
    clock: Arc<dyn Clock>,
    hook: Arc<dyn ExecutionHook>,
    metrics: GovernanceMetrics,
}

impl GovernanceEngine {
    pub fn new(params: GovernanceParams, clock: Arc<dyn Clock>) -> Self {
        let state = EngineState {
            treasury: Treasury::from_params(&params),
            ledger: ProposalLedger::new(params.clone()),
            seq: 0,
        };
        Self::from_state(params, state, clock)
    }

    /// Rebuild an engine from a snapshot. Parameters come from the snapshot.
    pub fn restore(snapshot: EngineSnapshot, clock: Arc<dyn Clock>) -> Self {
        let params = snapshot.ledger.params().clone();
        let state = EngineState {
            treasury: snapshot.treasury,
            ledger: snapshot.ledger,
            seq: snapshot.seq,
        };
        Self::from_state(params, state, clock)
    }

    fn from_state(params: GovernanceParams, state: EngineState, clock: Arc<dyn Clock>) -> Self {
        let engine = Self {
            params,
            state: Mutex::new(state),
            clock,
            hook: Arc::new(NoopHook),
            metrics: GovernanceMetrics::new(),
        };
        engine.refresh_gauges(&engine.lock());
        engine
    }

    /// Install the action run for each proposal that passes.
    pub fn with_hook(mut self, hook: Arc<dyn ExecutionHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn metrics(&self) -> &GovernanceMetrics {
        &self.metrics
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Mutating operations ─────────────────────────────────────────────

    /// Contribute funds; mints tokens and may admit the caller.
    pub fn contribute(
        &self,
        caller: &Principal,
        amount: FundAmount,
    ) -> Result<Versioned<ContributionReceipt>, GovernanceError> {
        let receipt = self.transact("contribute", caller, |state, now| {
            let receipt = state.treasury.contribute(caller, amount, now)?;
            Ok((receipt, Effect::Mutated))
        })?;
        self.metrics.contributions.inc();
        info!(
            %caller,
            %amount,
            seq = receipt.as_of,
            admitted = receipt.value.newly_admitted,
            "contribution committed"
        );
        Ok(receipt)
    }

    /// Create a proposal.
    pub fn propose(
        &self,
        caller: &Principal,
        title: &str,
        description: &str,
    ) -> Result<Versioned<ProposalId>, GovernanceError> {
        let id = self.transact("propose", caller, |state, now| {
            let id = state
                .ledger
                .create(state.treasury.registry(), caller, title, description, now)?;
            Ok((id, Effect::Mutated))
        })?;
        self.metrics.proposals_created.inc();
        info!(%caller, id = %id.value, seq = id.as_of, "protocol created");
        Ok(id)
    }

    /// Cast a weighted vote.
    pub fn vote(
        &self,
        caller: &Principal,
        id: ProposalId,
        direction: Direction,
        weight: u128,
    ) -> Result<Versioned<Vote>, GovernanceError> {
        let vote = self.transact("vote", caller, |state, now| {
            let vote = state.ledger.vote(
                state.treasury.registry(),
                id,
                caller,
                direction,
                weight,
                now,
            )?;
            Ok((vote, Effect::Mutated))
        })?;
        self.metrics.votes_cast.inc();
        info!(%caller, %id, ?direction, weight, seq = vote.as_of, "vote committed");
        Ok(vote)
    }

    /// Decide a proposal after its voting window.
    ///
    /// Of any number of concurrent calls, exactly one performs the decided
    /// transition and runs the execution hook.
    pub fn execute(
        &self,
        caller: &Principal,
        id: ProposalId,
    ) -> Result<Versioned<ExecutionOutcome>, GovernanceError> {
        let (outcome, decided) = self
            .transact("execute", caller, |state, now| {
                let outcome = state.ledger.execute(id, now)?;
                if outcome.newly_decided {
                    let proposal = state.ledger.get(id)?.clone();
                    Ok(((outcome, Some(proposal)), Effect::Mutated))
                } else {
                    Ok(((outcome, None), Effect::ReadOnly))
                }
            })
            .map(|v| {
                let as_of = v.as_of;
                let (outcome, decided) = v.value;
                (Versioned { as_of, value: outcome }, decided)
            })?;

        if let Some(proposal) = decided {
            self.metrics.executions.inc();
            info!(
                %caller,
                %id,
                passed = outcome.value.passed,
                upvotes = outcome.value.upvotes,
                downvotes = outcome.value.downvotes,
                seq = outcome.as_of,
                "protocol decided"
            );
            if proposal.passed() {
                self.hook.on_passed(&proposal);
            }
        }
        Ok(outcome)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn is_stakeholder(&self, principal: &Principal) -> Versioned<bool> {
        self.read(|s| s.treasury.registry().is_stakeholder(principal))
    }

    pub fn balance_of(&self, principal: &Principal) -> Versioned<TokenAmount> {
        self.read(|s| s.treasury.registry().balance_of(principal))
    }

    pub fn contribution_of(&self, principal: &Principal) -> Versioned<FundAmount> {
        self.read(|s| s.treasury.registry().contribution_of(principal))
    }

    pub fn stakeholder(&self, principal: &Principal) -> Versioned<Option<StakeholderRecord>> {
        self.read(|s| s.treasury.registry().get(principal).cloned())
    }

    pub fn stakeholders(&self) -> Versioned<Vec<StakeholderRecord>> {
        self.read(|s| s.treasury.registry().stakeholders().cloned().collect())
    }

    /// Everything contributed to the treasury so far.
    pub fn treasury_balance(&self) -> Versioned<FundAmount> {
        self.read(|s| s.treasury.total_funds())
    }

    pub fn total_supply(&self) -> Versioned<TokenAmount> {
        self.read(|s| s.treasury.total_supply())
    }

    /// All proposals in creation order.
    pub fn get_protocols(&self) -> Versioned<Vec<Proposal>> {
        self.read(|s| s.ledger.list().to_vec())
    }

    pub fn filter_protocols(&self, filter: ProtocolFilter) -> Versioned<Vec<Proposal>> {
        self.read(|s| s.ledger.filter(filter).into_iter().cloned().collect())
    }

    pub fn get_protocol(&self, id: ProposalId) -> Result<Versioned<Proposal>, GovernanceError> {
        self.try_read(|s| s.ledger.get(id).cloned())
    }

    pub fn get_votes_of(&self, id: ProposalId) -> Result<Versioned<Vec<Vote>>, GovernanceError> {
        self.try_read(|s| s.ledger.votes_of(id).map(<[Vote]>::to_vec))
    }

    pub fn status_counts(&self) -> Versioned<StatusCounts> {
        let now = self.clock.now();
        self.read(|s| s.ledger.count_by_status(now))
    }

    /// Latest committed sequence number.
    pub fn commit_seq(&self) -> CommitSeq {
        self.lock().seq
    }

    /// A consistent copy of all state.
    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.lock();
        EngineSnapshot {
            treasury: state.treasury.clone(),
            ledger: state.ledger.clone(),
            seq: state.seq,
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // Transactions validate before they write, so a panic mid-call
        // cannot leave partial state behind.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transact<T>(
        &self,
        op: &'static str,
        caller: &Principal,
        f: impl FnOnce(&mut EngineState, Timestamp) -> Result<(T, Effect), GovernanceError>,
    ) -> Result<Versioned<T>, GovernanceError> {
        let mut state = self.lock();
        let now = self.clock.now();
        match f(&mut *state, now) {
            Ok((value, Effect::Mutated)) => {
                state.seq += 1;
                self.refresh_gauges(&state);
                Ok(Versioned {
                    as_of: state.seq,
                    value,
                })
            }
            Ok((value, Effect::ReadOnly)) => Ok(Versioned {
                as_of: state.seq,
                value,
            }),
            Err(e) => {
                self.metrics.rejected_intents.inc();
                warn!(op, %caller, error = %e, "intent rejected");
                Err(e)
            }
        }
    }

    fn read<T>(&self, f: impl FnOnce(&EngineState) -> T) -> Versioned<T> {
        let state = self.lock();
        Versioned {
            as_of: state.seq,
            value: f(&state),
        }
    }

    fn try_read<T>(
        &self,
        f: impl FnOnce(&EngineState) -> Result<T, GovernanceError>,
    ) -> Result<Versioned<T>, GovernanceError> {
        let state = self.lock();
        let value = f(&state)?;
        debug!(seq = state.seq, "read");
        Ok(Versioned {
            as_of: state.seq,
            value,
        })
    }

    fn refresh_gauges(&self, state: &EngineState) {
        self.metrics
            .stakeholders
            .set(state.treasury.registry().stakeholder_count() as i64);
        self.metrics.proposals.set(state.ledger.len() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::RecordingHook;
    use dao_nullables::NullClock;
    use dao_types::UNIT;

    const WINDOW: u64 = 7 * 24 * 3600;

    fn principal(n: u8) -> Principal {
        Principal::from_bytes([n; 20])
    }

    fn engine() -> (GovernanceEngine, Arc<NullClock>) {
        let clock = Arc::new(NullClock::new(1_000));
        let engine = GovernanceEngine::new(GovernanceParams::default(), clock.clone());
        (engine, clock)
    }

    #[test]
    fn commit_seq_advances_only_on_success() {
        let (engine, _clock) = engine();
        let p = principal(1);
        assert_eq!(engine.commit_seq(), 0);
        engine.contribute(&p, FundAmount::new(UNIT)).unwrap();
        assert_eq!(engine.commit_seq(), 1);
        assert!(engine.contribute(&p, FundAmount::ZERO).is_err());
        assert_eq!(engine.commit_seq(), 1);
        assert_eq!(engine.metrics().rejected_intents.get(), 1);
    }

    #[test]
    fn zero_contribution_maps_to_invalid_amount() {
        let (engine, _clock) = engine();
        assert_eq!(
            engine.contribute(&principal(1), FundAmount::ZERO),
            Err(GovernanceError::InvalidAmount)
        );
    }

    #[test]
    fn reads_carry_latest_sequence() {
        let (engine, _clock) = engine();
        let p = principal(2);
        let receipt = engine.contribute(&p, FundAmount::new(2 * UNIT)).unwrap();
        let balance = engine.balance_of(&p);
        assert_eq!(balance.as_of, receipt.as_of);
        assert_eq!(balance.value, TokenAmount::new(2 * UNIT));
        assert!(engine.is_stakeholder(&p).value);
        assert_eq!(engine.treasury_balance().value, FundAmount::new(2 * UNIT));
    }

    #[test]
    fn hook_runs_once_for_passed_proposal() {
        let clock = Arc::new(NullClock::new(0));
        let hook = Arc::new(RecordingHook::new());
        let engine = GovernanceEngine::new(GovernanceParams::default(), clock.clone())
            .with_hook(hook.clone());
        let p = principal(3);
        engine.contribute(&p, FundAmount::new(5 * UNIT)).unwrap();
        let id = engine.propose(&p, "Grant", "Fund a grant").unwrap().value;
        engine.vote(&p, id, Direction::Up, 5).unwrap();
        clock.advance(WINDOW);

        let first = engine.execute(&p, id).unwrap();
        let second = engine.execute(&p, id).unwrap();
        assert!(first.value.newly_decided);
        assert!(!second.value.newly_decided);
        assert_eq!(first.value.passed, second.value.passed);
        assert_eq!(second.as_of, first.as_of);
        assert_eq!(hook.executed().len(), 1);
        assert_eq!(hook.executed()[0].id, id);
        assert_eq!(engine.metrics().executions.get(), 1);
    }

    #[test]
    fn hook_skipped_for_rejected_proposal() {
        let clock = Arc::new(NullClock::new(0));
        let hook = Arc::new(RecordingHook::new());
        let engine = GovernanceEngine::new(GovernanceParams::default(), clock.clone())
            .with_hook(hook.clone());
        let p = principal(4);
        engine.contribute(&p, FundAmount::new(5 * UNIT)).unwrap();
        let id = engine.propose(&p, "Grant", "Fund a grant").unwrap().value;
        clock.advance(WINDOW);
        let outcome = engine.execute(&p, id).unwrap();
        assert!(!outcome.value.passed);
        assert!(hook.executed().is_empty());
    }

    #[test]
    fn gauges_follow_state() {
        let (engine, _clock) = engine();
        let p = principal(5);
        engine.contribute(&p, FundAmount::new(UNIT)).unwrap();
        engine.contribute(&principal(6), FundAmount::new(UNIT / 10)).unwrap();
        engine.propose(&p, "t", "d").unwrap();
        assert_eq!(engine.metrics().stakeholders.get(), 1);
        assert_eq!(engine.metrics().proposals.get(), 1);
    }

    #[test]
    fn unknown_protocol_read_is_not_found() {
        let (engine, _clock) = engine();
        let id = ProposalId::new(7);
        assert_eq!(engine.get_protocol(id), Err(GovernanceError::NotFound(id)));
        assert_eq!(engine.get_votes_of(id), Err(GovernanceError::NotFound(id)));
    }
}
