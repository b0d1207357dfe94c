//! Scripted sessions: replay user actions through client facades against
//! an in-process ledger with a controllable clock.

use dao_client::{ClientConfig, ClientFacade, LocalLedger, TxStatus, VoteOrSettle};
use dao_governance::{Direction, GovernanceEngine, ProposalStatus, RecordingHook};
use dao_nullables::NullClock;
use dao_types::{FundAmount, GovernanceParams, Principal, ProposalId, Timestamp};
use dao_utils::format_remaining;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid script: {0}")]
    Parse(String),

    #[error("step {index}: {reason}")]
    Step { index: usize, reason: String },
}

#[derive(Clone, Debug, Deserialize)]
pub struct Script {
    /// Clock value at the start of the session, in seconds.
    #[serde(default)]
    pub start_secs: u64,
    pub steps: Vec<Step>,
}

/// One step: optionally advance the clock, then optionally act.
#[derive(Clone, Debug, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub advance_secs: u64,
    #[serde(default)]
    pub caller: Option<Principal>,
    #[serde(default)]
    pub op: Option<Op>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Op {
    /// `amount` in decimal units, e.g. "0.5".
    Contribute { amount: String },
    Propose { title: String, description: String },
    Vote {
        id: u64,
        direction: Direction,
        weight: u128,
    },
    /// Vote, or execute if the window has already closed.
    VoteOrSettle {
        id: u64,
        direction: Direction,
        weight: u128,
    },
    Execute { id: u64 },
}

impl Op {
    fn name(&self) -> &'static str {
        match self {
            Self::Contribute { .. } => "contribute",
            Self::Propose { .. } => "propose",
            Self::Vote { .. } => "vote",
            Self::VoteOrSettle { .. } => "vote_or_settle",
            Self::Execute { .. } => "execute",
        }
    }
}

impl Script {
    pub fn from_json(s: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(s).map_err(|e| ScriptError::Parse(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub at: Timestamp,
    pub caller: Principal,
    pub op: &'static str,
    /// "committed", "pending" or "rejected".
    pub outcome: &'static str,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct StakeholderReport {
    pub principal: Principal,
    pub contributed: String,
    pub balance: String,
    pub whole_tokens: u128,
}

#[derive(Debug, Serialize)]
pub struct ProtocolReport {
    pub id: ProposalId,
    pub title: String,
    pub proposer: Principal,
    pub status: ProposalStatus,
    pub upvotes: u128,
    pub downvotes: u128,
    pub remaining: String,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub now: Timestamp,
    pub commit_seq: u64,
    pub treasury_balance: String,
    pub total_supply: String,
    pub stakeholders: Vec<StakeholderReport>,
    pub protocols: Vec<ProtocolReport>,
    /// Passed protocols handed to the execution hook, in order.
    pub executed: Vec<ProposalId>,
    pub steps: Vec<StepReport>,
}

/// Outcome of a session: the report plus the engine, for metrics.
pub struct Session {
    pub report: Report,
    pub engine: Arc<GovernanceEngine>,
}

pub async fn run(
    script: &Script,
    params: GovernanceParams,
    client: ClientConfig,
) -> Result<Session, ScriptError> {
    let clock = Arc::new(NullClock::new(script.start_secs));
    let hook = Arc::new(RecordingHook::new());
    let engine = Arc::new(GovernanceEngine::new(params, clock.clone()).with_hook(hook.clone()));
    let ledger = Arc::new(LocalLedger::new(Arc::clone(&engine)));
    let miner = ledger.spawn_miner();

    let mut facades: HashMap<Principal, ClientFacade<LocalLedger>> = HashMap::new();
    let mut steps = Vec::new();

    for (index, step) in script.steps.iter().enumerate() {
        if step.advance_secs > 0 {
            clock.advance(step.advance_secs);
            debug!(index, now = %clock.now(), "clock advanced");
        }
        let Some(op) = &step.op else {
            continue;
        };
        let caller = step.caller.ok_or_else(|| ScriptError::Step {
            index,
            reason: format!("{} needs a caller", op.name()),
        })?;
        let facade = facades
            .entry(caller)
            .or_insert_with(|| ClientFacade::new(Arc::clone(&ledger), caller, client.clone()));

        let (outcome, detail) = match op {
            Op::Contribute { amount } => {
                let amount = FundAmount::parse(amount).map_err(|e| ScriptError::Step {
                    index,
                    reason: e.to_string(),
                })?;
                describe(facade.contribute(amount).await, |r| {
                    format!(
                        "minted {}, balance {}{}",
                        r.minted,
                        r.balance,
                        if r.newly_admitted { ", admitted" } else { "" }
                    )
                })
            }
            Op::Propose { title, description } => {
                describe(facade.propose(title, description).await, |id| {
                    format!("created protocol {id}")
                })
            }
            Op::Vote {
                id,
                direction,
                weight,
            } => describe(
                facade.vote(ProposalId::new(*id), *direction, *weight).await,
                |v| format!("{:?} x{} on {}", v.direction, v.weight, v.proposal_id),
            ),
            Op::VoteOrSettle {
                id,
                direction,
                weight,
            } => match facade
                .vote_or_settle(ProposalId::new(*id), *direction, *weight)
                .await
            {
                VoteOrSettle::Voted(status) => describe(status, |v| {
                    format!("{:?} x{} on {}", v.direction, v.weight, v.proposal_id)
                }),
                VoteOrSettle::Settled(status) => describe(status, |o| {
                    format!("window closed, settled: passed={}", o.passed)
                }),
            },
            Op::Execute { id } => describe(facade.execute(ProposalId::new(*id)).await, |o| {
                format!(
                    "passed={} ({} up / {} down){}",
                    o.passed,
                    o.upvotes,
                    o.downvotes,
                    if o.newly_decided { "" } else { ", already decided" }
                )
            }),
        };
        info!(index, %caller, op = op.name(), outcome, "step done");
        steps.push(StepReport {
            index,
            at: clock.now(),
            caller,
            op: op.name(),
            outcome,
            detail,
        });
    }
    miner.abort();

    let now = clock.now();
    let report = Report {
        now,
        commit_seq: engine.commit_seq(),
        treasury_balance: engine.treasury_balance().value.to_string(),
        total_supply: engine.total_supply().value.to_string(),
        stakeholders: engine
            .stakeholders()
            .value
            .into_iter()
            .map(|r| StakeholderReport {
                principal: r.principal,
                contributed: r.contributed.to_string(),
                balance: r.balance.to_string(),
                whole_tokens: r.balance.whole_units(),
            })
            .collect(),
        protocols: engine
            .get_protocols()
            .value
            .into_iter()
            .map(|p| ProtocolReport {
                id: p.id,
                status: p.status(now),
                remaining: format_remaining(p.expires_at, now),
                title: p.title,
                proposer: p.proposer,
                upvotes: p.upvotes,
                downvotes: p.downvotes,
            })
            .collect(),
        executed: hook.executed().into_iter().map(|p| p.id).collect(),
        steps,
    };
    Ok(Session { report, engine })
}

fn describe<T>(status: TxStatus<T>, ok: impl FnOnce(T) -> String) -> (&'static str, String) {
    match status {
        TxStatus::Committed(v) => ("committed", ok(v)),
        TxStatus::Pending(ticket) => ("pending", format!("ticket {ticket} not mined yet")),
        TxStatus::Rejected(r) => ("rejected", format!("{:?}: {}", r.class, r.message)),
    }
}
