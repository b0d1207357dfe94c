//! Execution hook — the action a passed proposal triggers.

use crate::proposal::Proposal;
use std::sync::Mutex;

/// Called once for each proposal that passes, after the decision commits.
///
/// The engine invokes the hook only from the call that performed the
/// decided transition, so each proposal reaches it at most once.
pub trait ExecutionHook: Send + Sync {
    fn on_passed(&self, proposal: &Proposal);
}

/// Does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHook;

impl ExecutionHook for NoopHook {
    fn on_passed(&self, _proposal: &Proposal) {}
}

/// Records every proposal handed to it. Useful for payout queues and tests.
#[derive(Debug, Default)]
pub struct RecordingHook {
    executed: Mutex<Vec<Proposal>>,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proposals received so far, in execution order.
    pub fn executed(&self) -> Vec<Proposal> {
        self.executed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ExecutionHook for RecordingHook {
    fn on_passed(&self, proposal: &Proposal) {
        self.executed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(proposal.clone());
    }
}
