//! Point-in-time engine snapshots, serialized with bincode.

use crate::engine::CommitSeq;
use crate::ledger::ProposalLedger;
use dao_treasury::Treasury;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot format version, bumped on incompatible layout changes.
pub const SNAPSHOT_VERSION: u16 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("snapshot decoding failed: {0}")]
    Decode(String),

    #[error("unsupported snapshot version {found} (expected {SNAPSHOT_VERSION})")]
    Version { found: u16 },
}

/// Everything the engine holds, taken under a single lock acquisition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub treasury: Treasury,
    pub ledger: ProposalLedger,
    pub seq: CommitSeq,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u16,
    snapshot: EngineSnapshot,
}

impl EngineSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let envelope = Envelope {
            version: SNAPSHOT_VERSION,
            snapshot: self.clone(),
        };
        bincode::serialize(&envelope).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let envelope: Envelope =
            bincode::deserialize(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        if envelope.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: envelope.version,
            });
        }
        Ok(envelope.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GovernanceEngine;
    use crate::proposal::Direction;
    use dao_nullables::NullClock;
    use dao_types::{FundAmount, GovernanceParams, Principal, UNIT};
    use std::sync::Arc;

    #[test]
    fn restored_engine_continues_where_it_left_off() {
        let clock = Arc::new(NullClock::new(10));
        let engine = GovernanceEngine::new(GovernanceParams::default(), clock.clone());
        let alice = Principal::from_bytes([1; 20]);
        engine.contribute(&alice, FundAmount::new(3 * UNIT)).unwrap();
        let id = engine.propose(&alice, "Audit", "Pay auditors").unwrap().value;
        engine.vote(&alice, id, Direction::Up, 2).unwrap();

        let bytes = engine.snapshot().to_bytes().unwrap();
        let restored = GovernanceEngine::restore(EngineSnapshot::from_bytes(&bytes).unwrap(), clock);

        assert_eq!(restored.commit_seq(), engine.commit_seq());
        assert_eq!(restored.get_protocols().value, engine.get_protocols().value);
        assert_eq!(restored.balance_of(&alice).value, engine.balance_of(&alice).value);
        assert!(restored.is_stakeholder(&alice).value);
        let next = restored.propose(&alice, "Second", "Another").unwrap();
        assert_eq!(next.value.raw(), id.raw() + 1);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            EngineSnapshot::from_bytes(&[0xff, 0x01]),
            Err(SnapshotError::Decode(_))
        ));
    }
}
