//! Prometheus metrics for the governance engine.
//!
//! [`GovernanceMetrics`] owns a dedicated [`Registry`]; [`GovernanceMetrics::encode`]
//! renders it in the Prometheus text exposition format.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

/// Counters and gauges covering every engine operation.
pub struct GovernanceMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub contributions: IntCounter,
    pub proposals_created: IntCounter,
    pub votes_cast: IntCounter,
    /// Executions that performed the decided transition.
    pub executions: IntCounter,
    /// Mutating calls that failed and left state untouched.
    pub rejected_intents: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub stakeholders: IntGauge,
    pub proposals: IntGauge,
}

impl GovernanceMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let contributions = register_int_counter_with_registry!(
            Opts::new("dao_contributions_total", "Contributions accepted"),
            registry
        )
        .expect("failed to register contributions counter");

        let proposals_created = register_int_counter_with_registry!(
            Opts::new("dao_proposals_created_total", "Protocols created"),
            registry
        )
        .expect("failed to register proposals_created counter");

        let votes_cast = register_int_counter_with_registry!(
            Opts::new("dao_votes_cast_total", "Votes recorded"),
            registry
        )
        .expect("failed to register votes_cast counter");

        let executions = register_int_counter_with_registry!(
            Opts::new("dao_executions_total", "Protocols decided by execute"),
            registry
        )
        .expect("failed to register executions counter");

        let rejected_intents = register_int_counter_with_registry!(
            Opts::new(
                "dao_rejected_intents_total",
                "Mutating calls rejected by the engine"
            ),
            registry
        )
        .expect("failed to register rejected_intents counter");

        let stakeholders = register_int_gauge_with_registry!(
            Opts::new("dao_stakeholders", "Admitted stakeholders"),
            registry
        )
        .expect("failed to register stakeholders gauge");

        let proposals = register_int_gauge_with_registry!(
            Opts::new("dao_proposals", "Protocols in the ledger"),
            registry
        )
        .expect("failed to register proposals gauge");

        Self {
            registry,
            contributions,
            proposals_created,
            votes_cast,
            executions,
            rejected_intents,
            stakeholders,
            proposals,
        }
    }

    /// Text exposition of every metric in the registry.
    pub fn encode(&self) -> String {
        let mut buf = Vec::new();
        if TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Default for GovernanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
