//! Client facade bound to one caller.
//!
//! Turns user actions into intents, checks them locally first, submits them
//! and follows each through `Pending → Committed | Rejected`. Reads are
//! session-consistent: they never reflect less than the caller's own latest
//! committed write.

use crate::boundary::LedgerBoundary;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::intent::{Effect, Intent, Receipt, Rejection, TicketId, TxStatus};
use dao_governance::{
    CommitSeq, Direction, ExecutionOutcome, GovernanceError, Proposal, ProtocolFilter, Versioned,
    Vote,
};
use dao_treasury::ContributionReceipt;
use dao_types::{FundAmount, Principal, ProposalId, TokenAmount};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the home screen shows for the connected caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub principal: Principal,
    pub is_stakeholder: bool,
    pub contribution: FundAmount,
    pub balance: TokenAmount,
    /// Balance floored to whole tokens, the unit votes are cast in.
    pub whole_tokens: u128,
    /// Protocols not yet decided, including expired ones awaiting execution.
    pub open_protocols: usize,
    /// Newest first.
    pub protocols: Vec<Proposal>,
    pub as_of: CommitSeq,
}

/// Result of [`ClientFacade::vote_or_settle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOrSettle {
    Voted(TxStatus<Vote>),
    /// The window had elapsed; an execute was submitted instead.
    Settled(TxStatus<ExecutionOutcome>),
}

pub struct ClientFacade<L: ?Sized> {
    ledger: Arc<L>,
    caller: Principal,
    config: ClientConfig,
    /// Highest commit sequence this session has seen its own writes land at.
    watermark: AtomicU64,
}

impl<L: LedgerBoundary + ?Sized> ClientFacade<L> {
    pub fn new(ledger: Arc<L>, caller: Principal, config: ClientConfig) -> Self {
        Self {
            ledger,
            caller,
            config,
            watermark: AtomicU64::new(0),
        }
    }

    pub fn caller(&self) -> Principal {
        self.caller
    }

    pub fn watermark(&self) -> CommitSeq {
        self.watermark.load(Ordering::SeqCst)
    }

    // ── Submissions ─────────────────────────────────────────────────────

    pub async fn contribute(&self, amount: FundAmount) -> TxStatus<ContributionReceipt> {
        let status = self.send(Intent::Contribute { amount }).await;
        typed(status, "contribute", Effect::into_contribution)
    }

    pub async fn propose(&self, title: &str, description: &str) -> TxStatus<ProposalId> {
        let intent = Intent::CreateProtocol {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
        };
        typed(self.send(intent).await, "create_protocol", Effect::into_created)
    }

    pub async fn vote(&self, id: ProposalId, direction: Direction, weight: u128) -> TxStatus<Vote> {
        let intent = Intent::Vote {
            id,
            direction,
            weight,
        };
        typed(self.send(intent).await, "vote", Effect::into_vote)
    }

    pub async fn execute(&self, id: ProposalId) -> TxStatus<ExecutionOutcome> {
        typed(
            self.send(Intent::Execute { id }).await,
            "execute",
            Effect::into_execution,
        )
    }

    /// Vote, or settle the protocol if its window has already elapsed.
    pub async fn vote_or_settle(
        &self,
        id: ProposalId,
        direction: Direction,
        weight: u128,
    ) -> VoteOrSettle {
        let status = self.vote(id, direction, weight).await;
        let closed = matches!(
            status.rejection(),
            Some(r) if r.error == ClientError::Governance(GovernanceError::VotingClosed(id))
        );
        if !closed {
            return VoteOrSettle::Voted(status);
        }
        match self.protocol(id).await {
            Ok(p) if !p.decided() => {
                info!(caller = %self.caller, %id, "voting window elapsed, executing");
                VoteOrSettle::Settled(self.execute(id).await)
            }
            _ => VoteOrSettle::Voted(status),
        }
    }

    /// Check, submit and confirm an intent.
    pub async fn send(&self, intent: Intent) -> TxStatus<Effect> {
        let op = intent.name();
        if let Err(e) = self.preflight(&intent).await {
            warn!(caller = %self.caller, op, error = %e, "intent rejected before submission");
            return TxStatus::Rejected(e.into());
        }
        match self.ledger.submit(self.caller, intent).await {
            Ok(ticket) => self.confirm(ticket).await,
            Err(e) => {
                warn!(caller = %self.caller, op, error = %e, "submission failed");
                TxStatus::Rejected(e.into())
            }
        }
    }

    /// Poll a ticket until it is mined or the attempt budget runs out.
    pub async fn confirm(&self, ticket: TicketId) -> TxStatus<Effect> {
        let attempts = self.config.max_polls.max(1);
        for attempt in 1..=attempts {
            match self.ledger.poll(ticket).await {
                Ok(Some(Receipt::Mined { seq, effect })) => {
                    self.watermark.fetch_max(seq, Ordering::SeqCst);
                    info!(caller = %self.caller, %ticket, seq, "intent committed");
                    return TxStatus::Committed(effect);
                }
                Ok(Some(Receipt::Failed { error })) => {
                    warn!(caller = %self.caller, %ticket, error = %error, "intent failed");
                    return TxStatus::Rejected(error.into());
                }
                Ok(None) => {
                    return TxStatus::Rejected(ClientError::UnknownTicket(ticket).into());
                }
                Ok(Some(Receipt::Pending)) => {
                    debug!(%ticket, attempt, "intent pending");
                }
                Err(e) => {
                    warn!(%ticket, attempt, error = %e, "poll failed");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.poll_interval()).await;
            }
        }
        TxStatus::Pending(ticket)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub async fn is_stakeholder(&self) -> Result<bool, ClientError> {
        let caller = self.caller;
        self.consistent("is_stakeholder", || self.ledger.is_stakeholder(caller))
            .await
            .map(|v| v.value)
    }

    pub async fn balance(&self) -> Result<TokenAmount, ClientError> {
        let caller = self.caller;
        self.consistent("balance_of", || self.ledger.balance_of(caller))
            .await
            .map(|v| v.value)
    }

    pub async fn contribution(&self) -> Result<FundAmount, ClientError> {
        let caller = self.caller;
        self.consistent("contribution_of", || self.ledger.contribution_of(caller))
            .await
            .map(|v| v.value)
    }

    pub async fn treasury_balance(&self) -> Result<FundAmount, ClientError> {
        self.consistent("treasury_balance", || self.ledger.treasury_balance())
            .await
            .map(|v| v.value)
    }

    /// Protocols matching `filter`, in creation order.
    pub async fn protocols(&self, filter: ProtocolFilter) -> Result<Vec<Proposal>, ClientError> {
        let all = self
            .consistent("protocols", || self.ledger.protocols())
            .await?;
        Ok(all.value.into_iter().filter(|p| filter.matches(p)).collect())
    }

    pub async fn protocol(&self, id: ProposalId) -> Result<Proposal, ClientError> {
        self.consistent("protocol", || self.ledger.protocol(id))
            .await
            .map(|v| v.value)
    }

    /// Vote log of `id`, newest first.
    pub async fn votes_of(&self, id: ProposalId) -> Result<Vec<Vote>, ClientError> {
        self.consistent("votes_of", || self.ledger.votes_of(id))
            .await
            .map(|v| v.value.into_iter().rev().collect())
    }

    pub async fn dashboard(&self) -> Result<Dashboard, ClientError> {
        let is_stakeholder = self.is_stakeholder().await?;
        let contribution = self.contribution().await?;
        let balance = self.balance().await?;
        let counts = self
            .consistent("status_counts", || self.ledger.status_counts())
            .await?
            .value;
        let protocols = self
            .consistent("protocols", || self.ledger.protocols())
            .await?;
        Ok(Dashboard {
            principal: self.caller,
            is_stakeholder,
            contribution,
            balance,
            whole_tokens: balance.whole_units(),
            open_protocols: counts.open + counts.expired,
            protocols: protocols.value.into_iter().rev().collect(),
            as_of: protocols.as_of,
        })
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Mirrors the checks the ledger will run, so obviously invalid
    /// intents never leave the client.
    async fn preflight(&self, intent: &Intent) -> Result<(), ClientError> {
        match intent {
            Intent::Contribute { amount } if amount.is_zero() => {
                Err(GovernanceError::InvalidAmount.into())
            }
            Intent::CreateProtocol { title, description } => {
                if title.trim().is_empty() {
                    return Err(GovernanceError::InvalidInput("title is required".into()).into());
                }
                if description.trim().is_empty() {
                    return Err(
                        GovernanceError::InvalidInput("description is required".into()).into(),
                    );
                }
                if !self.is_stakeholder().await? {
                    return Err(GovernanceError::NotEligible(format!(
                        "{} is not a stakeholder",
                        self.caller
                    ))
                    .into());
                }
                let min = self.ledger.params().await?.proposal_min_balance;
                let balance = self.balance().await?;
                if balance < min {
                    return Err(GovernanceError::NotEligible(format!(
                        "{} holds {balance} tokens, proposing needs {min}",
                        self.caller
                    ))
                    .into());
                }
                Ok(())
            }
            Intent::Vote { weight: 0, .. } => Err(GovernanceError::InvalidInput(
                "vote weight must be at least one token".into(),
            )
            .into()),
            _ => Ok(()),
        }
    }

    /// Read until the result reflects the session watermark.
    async fn consistent<T, F, Fut>(
        &self,
        what: &'static str,
        read: F,
    ) -> Result<Versioned<T>, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Versioned<T>, ClientError>>,
    {
        let watermark = self.watermark();
        let mut retries = 0;
        loop {
            let versioned = read().await?;
            if versioned.as_of >= watermark {
                debug!(what, as_of = versioned.as_of, "read");
                return Ok(versioned);
            }
            if retries >= self.config.max_stale_retries {
                warn!(what, as_of = versioned.as_of, watermark, "read still stale, giving up");
                return Err(ClientError::StaleRead {
                    as_of: versioned.as_of,
                    watermark,
                });
            }
            retries += 1;
            debug!(what, as_of = versioned.as_of, watermark, retries, "stale read, retrying");
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }
}

fn typed<T>(
    status: TxStatus<Effect>,
    op: &'static str,
    extract: fn(Effect) -> Option<T>,
) -> TxStatus<T> {
    match status {
        TxStatus::Committed(effect) => match extract(effect) {
            Some(v) => TxStatus::Committed(v),
            None => TxStatus::Rejected(Rejection::from(ClientError::UnexpectedEffect(op))),
        },
        TxStatus::Pending(t) => TxStatus::Pending(t),
        TxStatus::Rejected(r) => TxStatus::Rejected(r),
    }
}
