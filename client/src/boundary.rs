//! The call surface between a client and whatever hosts the engine.

use crate::error::ClientError;
use crate::intent::{Intent, Receipt, TicketId};
use async_trait::async_trait;
use dao_governance::{Proposal, StatusCounts, Versioned, Vote};
use dao_types::{FundAmount, GovernanceParams, Principal, ProposalId, TokenAmount};

/// Reads and intent submission against a ledger.
///
/// Mutations are asynchronous: `submit` only enqueues, the outcome is
/// observed through `poll`. Every read reports the commit sequence it
/// reflects, which may trail the caller's own writes on a lagging replica.
/// Any call may fail with [`ClientError::Transport`].
#[async_trait]
pub trait LedgerBoundary: Send + Sync {
    async fn submit(&self, caller: Principal, intent: Intent) -> Result<TicketId, ClientError>;

    /// `None` when the ledger has never seen the ticket.
    async fn poll(&self, ticket: TicketId) -> Result<Option<Receipt>, ClientError>;

    async fn params(&self) -> Result<GovernanceParams, ClientError>;

    async fn is_stakeholder(&self, principal: Principal) -> Result<Versioned<bool>, ClientError>;

    async fn balance_of(&self, principal: Principal) -> Result<Versioned<TokenAmount>, ClientError>;

    async fn contribution_of(
        &self,
        principal: Principal,
    ) -> Result<Versioned<FundAmount>, ClientError>;

    async fn treasury_balance(&self) -> Result<Versioned<FundAmount>, ClientError>;

    async fn protocols(&self) -> Result<Versioned<Vec<Proposal>>, ClientError>;

    async fn protocol(&self, id: ProposalId) -> Result<Versioned<Proposal>, ClientError>;

    async fn votes_of(&self, id: ProposalId) -> Result<Versioned<Vec<Vote>>, ClientError>;

    async fn status_counts(&self) -> Result<Versioned<StatusCounts>, ClientError>;
}
