//! Nullable ledger — an in-process boundary with scriptable faults.

use async_trait::async_trait;
use dao_client::{ClientError, Intent, LedgerBoundary, LocalLedger, Receipt, TicketId, TransportError};
use dao_governance::{GovernanceEngine, Proposal, StatusCounts, Versioned, Vote};
use dao_types::{
    Clock, FundAmount, GovernanceParams, Principal, ProposalId, TokenAmount,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// A [`LocalLedger`] wrapper that can fail calls and serve lagging reads.
///
/// - `fail_submits(n)` / `fail_polls(n)`: the next `n` calls fail with a
///   transport error before reaching the ledger.
/// - `lag_reads(n)`: freezes a replica at the current commit; the next `n`
///   reads are answered from it, as a trailing node would.
pub struct NullLedger {
    inner: LocalLedger,
    clock: Arc<dyn Clock>,
    failing_submits: AtomicU32,
    failing_polls: AtomicU32,
    lagging_reads: AtomicU32,
    replica: Mutex<Option<Arc<GovernanceEngine>>>,
}

impl NullLedger {
    /// Mines every intent on submission.
    pub fn new(params: GovernanceParams, clock: Arc<dyn Clock>) -> Self {
        let engine = Arc::new(GovernanceEngine::new(params, clock.clone()));
        Self::wrap(LocalLedger::auto_mining(engine), clock)
    }

    /// Leaves intents queued until [`NullLedger::mine_pending`].
    pub fn manual(params: GovernanceParams, clock: Arc<dyn Clock>) -> Self {
        let engine = Arc::new(GovernanceEngine::new(params, clock.clone()));
        Self::wrap(LocalLedger::new(engine), clock)
    }

    fn wrap(inner: LocalLedger, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            clock,
            failing_submits: AtomicU32::new(0),
            failing_polls: AtomicU32::new(0),
            lagging_reads: AtomicU32::new(0),
            replica: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<GovernanceEngine> {
        self.inner.engine()
    }

    pub fn mine_pending(&self) -> usize {
        self.inner.mine_pending()
    }

    pub fn fail_submits(&self, n: u32) {
        self.failing_submits.store(n, Ordering::SeqCst);
    }

    pub fn fail_polls(&self, n: u32) {
        self.failing_polls.store(n, Ordering::SeqCst);
    }

    pub fn lag_reads(&self, n: u32) {
        let replica = GovernanceEngine::restore(self.engine().snapshot(), self.clock.clone());
        *self.replica.lock().unwrap() = Some(Arc::new(replica));
        self.lagging_reads.store(n, Ordering::SeqCst);
    }

    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn read<T>(&self, f: impl FnOnce(&GovernanceEngine) -> T) -> T {
        if Self::take(&self.lagging_reads) {
            let replica = self.replica.lock().unwrap().clone();
            if let Some(replica) = replica {
                return f(&replica);
            }
        }
        f(self.engine())
    }
}

#[async_trait]
impl LedgerBoundary for NullLedger {
    async fn submit(&self, caller: Principal, intent: Intent) -> Result<TicketId, ClientError> {
        if Self::take(&self.failing_submits) {
            return Err(TransportError::Unavailable("injected submit failure".into()).into());
        }
        self.inner.submit(caller, intent).await
    }

    async fn poll(&self, ticket: TicketId) -> Result<Option<Receipt>, ClientError> {
        if Self::take(&self.failing_polls) {
            return Err(TransportError::Timeout.into());
        }
        self.inner.poll(ticket).await
    }

    async fn params(&self) -> Result<GovernanceParams, ClientError> {
        self.inner.params().await
    }

    async fn is_stakeholder(&self, principal: Principal) -> Result<Versioned<bool>, ClientError> {
        Ok(self.read(|e| e.is_stakeholder(&principal)))
    }

    async fn balance_of(&self, principal: Principal) -> Result<Versioned<TokenAmount>, ClientError> {
        Ok(self.read(|e| e.balance_of(&principal)))
    }

    async fn contribution_of(
        &self,
        principal: Principal,
    ) -> Result<Versioned<FundAmount>, ClientError> {
        Ok(self.read(|e| e.contribution_of(&principal)))
    }

    async fn treasury_balance(&self) -> Result<Versioned<FundAmount>, ClientError> {
        Ok(self.read(|e| e.treasury_balance()))
    }

    async fn protocols(&self) -> Result<Versioned<Vec<Proposal>>, ClientError> {
        Ok(self.read(|e| e.get_protocols()))
    }

    async fn protocol(&self, id: ProposalId) -> Result<Versioned<Proposal>, ClientError> {
        Ok(self.read(|e| e.get_protocol(id))?)
    }

    async fn votes_of(&self, id: ProposalId) -> Result<Versioned<Vec<Vote>>, ClientError> {
        Ok(self.read(|e| e.get_votes_of(id))?)
    }

    async fn status_counts(&self) -> Result<Versioned<StatusCounts>, ClientError> {
        Ok(self.read(|e| e.status_counts()))
    }
}
