//! In-process ledger: an engine plus a FIFO queue of submitted intents.

use crate::boundary::LedgerBoundary;
use crate::error::ClientError;
use crate::intent::{Effect, Intent, Receipt, TicketId};
use async_trait::async_trait;
use dao_governance::{GovernanceEngine, GovernanceError, Proposal, StatusCounts, Versioned, Vote};
use dao_types::{FundAmount, GovernanceParams, Principal, ProposalId, TokenAmount};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

struct Queued {
    ticket: TicketId,
    caller: Principal,
    intent: Intent,
}

/// Hosts a [`GovernanceEngine`] behind the [`LedgerBoundary`] surface.
///
/// Submitted intents wait in a queue until mined, either explicitly with
/// [`LocalLedger::mine_pending`] or by the task from
/// [`LocalLedger::spawn_miner`]. With `auto_mine` set, `submit` mines
/// immediately.
pub struct LocalLedger {
    engine: Arc<GovernanceEngine>,
    queue: Mutex<VecDeque<Queued>>,
    /// Kept for the ledger's lifetime so any ticket can be polled again.
    receipts: Mutex<HashMap<TicketId, Receipt>>,
    next_ticket: AtomicU64,
    submitted: Notify,
    /// Held for a whole drain so batches commit in queue order.
    mining: Mutex<()>,
    auto_mine: bool,
}

impl LocalLedger {
    pub fn new(engine: Arc<GovernanceEngine>) -> Self {
        Self {
            engine,
            queue: Mutex::new(VecDeque::new()),
            receipts: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
            submitted: Notify::new(),
            mining: Mutex::new(()),
            auto_mine: false,
        }
    }

    /// A ledger that mines every intent as soon as it is submitted.
    pub fn auto_mining(engine: Arc<GovernanceEngine>) -> Self {
        Self {
            auto_mine: true,
            ..Self::new(engine)
        }
    }

    pub fn engine(&self) -> &Arc<GovernanceEngine> {
        &self.engine
    }

    /// Intents submitted but not yet mined.
    pub fn pending_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Mine every queued intent in submission order. Returns how many were
    /// processed.
    pub fn mine_pending(&self) -> usize {
        let _mining = self.mining.lock().unwrap_or_else(|e| e.into_inner());
        let batch: Vec<Queued> = self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        let mined = batch.len();
        for queued in batch {
            let receipt = self.apply(&queued.caller, queued.intent);
            self.receipts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(queued.ticket, receipt);
        }
        if mined > 0 {
            debug!(mined, "mined pending intents");
        }
        mined
    }

    /// Mine in the background whenever something is submitted.
    pub fn spawn_miner(self: &Arc<Self>) -> JoinHandle<()> {
        let ledger = Arc::clone(self);
        tokio::spawn(async move {
            info!("local miner started");
            loop {
                ledger.submitted.notified().await;
                ledger.mine_pending();
            }
        })
    }

    fn apply(&self, caller: &Principal, intent: Intent) -> Receipt {
        let result: Result<Versioned<Effect>, GovernanceError> = match intent {
            Intent::Contribute { amount } => self
                .engine
                .contribute(caller, amount)
                .map(|v| v.map(Effect::Contributed)),
            Intent::CreateProtocol { title, description } => self
                .engine
                .propose(caller, &title, &description)
                .map(|v| v.map(Effect::Created)),
            Intent::Vote {
                id,
                direction,
                weight,
            } => self
                .engine
                .vote(caller, id, direction, weight)
                .map(|v| v.map(Effect::Voted)),
            Intent::Execute { id } => self
                .engine
                .execute(caller, id)
                .map(|v| v.map(Effect::Executed)),
        };
        match result {
            Ok(v) => Receipt::Mined {
                seq: v.as_of,
                effect: v.value,
            },
            Err(error) => Receipt::Failed { error },
        }
    }
}

#[async_trait]
impl LedgerBoundary for LocalLedger {
    async fn submit(&self, caller: Principal, intent: Intent) -> Result<TicketId, ClientError> {
        let ticket = TicketId::new(self.next_ticket.fetch_add(1, Ordering::SeqCst));
        debug!(%ticket, %caller, op = intent.name(), "intent submitted");
        self.receipts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(ticket, Receipt::Pending);
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Queued {
                ticket,
                caller,
                intent,
            });
        if self.auto_mine {
            self.mine_pending();
        } else {
            self.submitted.notify_one();
        }
        Ok(ticket)
    }

    async fn poll(&self, ticket: TicketId) -> Result<Option<Receipt>, ClientError> {
        Ok(self
            .receipts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&ticket)
            .cloned())
    }

    async fn params(&self) -> Result<GovernanceParams, ClientError> {
        Ok(self.engine.params().clone())
    }

    async fn is_stakeholder(&self, principal: Principal) -> Result<Versioned<bool>, ClientError> {
        Ok(self.engine.is_stakeholder(&principal))
    }

    async fn balance_of(&self, principal: Principal) -> Result<Versioned<TokenAmount>, ClientError> {
        Ok(self.engine.balance_of(&principal))
    }

    async fn contribution_of(
        &self,
        principal: Principal,
    ) -> Result<Versioned<FundAmount>, ClientError> {
        Ok(self.engine.contribution_of(&principal))
    }

    async fn treasury_balance(&self) -> Result<Versioned<FundAmount>, ClientError> {
        Ok(self.engine.treasury_balance())
    }

    async fn protocols(&self) -> Result<Versioned<Vec<Proposal>>, ClientError> {
        Ok(self.engine.get_protocols())
    }

    async fn protocol(&self, id: ProposalId) -> Result<Versioned<Proposal>, ClientError> {
        Ok(self.engine.get_protocol(id)?)
    }

    async fn votes_of(&self, id: ProposalId) -> Result<Versioned<Vec<Vote>>, ClientError> {
        Ok(self.engine.get_votes_of(id)?)
    }

    async fn status_counts(&self) -> Result<Versioned<StatusCounts>, ClientError> {
        Ok(self.engine.status_counts())
    }
}
