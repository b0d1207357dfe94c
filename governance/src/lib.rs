//! Proposal ledger and governance engine.
//!
//! Stakeholders (see `dao-treasury`) create proposals ("protocols"), cast
//! weighted up/down votes during a fixed voting window, and execute the
//! proposal afterwards. Execution fixes the outcome once: strictly more
//! upvotes than downvotes passes, ties are rejected.
//!
//! [`GovernanceEngine`] is the only entry point that mutates state. It
//! serializes every transaction behind one lock and tags each result with
//! the commit sequence it reflects.

pub mod engine;
pub mod error;
pub mod hook;
pub mod ledger;
pub mod metrics;
pub mod proposal;
pub mod snapshot;

pub use engine::{CommitSeq, GovernanceEngine, Versioned};
pub use error::{ErrorClass, GovernanceError};
pub use hook::{ExecutionHook, NoopHook, RecordingHook};
pub use ledger::{ExecutionOutcome, ProposalLedger, StatusCounts};
pub use metrics::GovernanceMetrics;
pub use proposal::{Decision, Direction, Proposal, ProposalStatus, ProtocolFilter, Vote};
pub use snapshot::{EngineSnapshot, SnapshotError, SNAPSHOT_VERSION};
