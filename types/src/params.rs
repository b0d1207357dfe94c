//! Governance parameters — admission, eligibility, voting window and policies.
//!
//! Every field has a serde default, so a partial TOML table only overrides
//! what it names.

use crate::amount::{FundAmount, TokenAmount, UNIT};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How repeated votes by the same voter are treated.
///
/// Votes are weight-checked against the voter's balance, never debited from
/// it. The policy decides whether the same tokens may back several casts on
/// one proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotePolicy {
    /// Every cast only needs `weight <= balance`; repeats are allowed.
    #[default]
    WeightChecked,
    /// One cast per voter per proposal.
    OncePerProposal,
    /// Repeats allowed while the voter's cumulative weight on the proposal
    /// stays within their balance.
    BalanceBounded,
}

/// What `execute` does on a proposal that is already decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPolicy {
    /// Return the stored outcome without re-tallying.
    #[default]
    ReturnStored,
    /// Fail with an already-decided error.
    Reject,
}

/// All engine parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Cumulative contribution at which a principal becomes a stakeholder.
    /// Default: 0.5 unit.
    #[serde(default = "default_admission_threshold", with = "decimal_fund")]
    pub admission_threshold: FundAmount,

    /// Token balance a stakeholder needs to create a proposal. Default: 1 token.
    #[serde(default = "default_proposal_min_balance", with = "decimal_token")]
    pub proposal_min_balance: TokenAmount,

    /// Voting window in seconds; `expires_at = created_at + voting_window_secs`.
    /// Default: 7 days.
    #[serde(default = "default_voting_window_secs")]
    pub voting_window_secs: u64,

    /// Raw tokens minted per raw unit contributed. Default: 1 (1:1).
    #[serde(default = "default_tokens_per_unit")]
    pub tokens_per_unit: u64,

    #[serde(default)]
    pub vote_policy: VotePolicy,

    #[serde(default)]
    pub replay_policy: ReplayPolicy,
}

fn default_admission_threshold() -> FundAmount {
    FundAmount::new(UNIT / 2)
}

fn default_proposal_min_balance() -> TokenAmount {
    TokenAmount::new(UNIT)
}

fn default_voting_window_secs() -> u64 {
    7 * 24 * 3600
}

fn default_tokens_per_unit() -> u64 {
    1
}

// Amounts are written as decimal strings ("0.5") in config files; TOML
// integers cannot hold 18-decimal raw values.
mod decimal_fund {
    use super::*;

    pub fn serialize<S: Serializer>(v: &FundAmount, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<FundAmount, D::Error> {
        let s = String::deserialize(d)?;
        FundAmount::parse(&s).map_err(serde::de::Error::custom)
    }
}

mod decimal_token {
    use super::*;

    pub fn serialize<S: Serializer>(v: &TokenAmount, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TokenAmount, D::Error> {
        let s = String::deserialize(d)?;
        TokenAmount::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            admission_threshold: default_admission_threshold(),
            proposal_min_balance: default_proposal_min_balance(),
            voting_window_secs: default_voting_window_secs(),
            tokens_per_unit: default_tokens_per_unit(),
            vote_policy: VotePolicy::default(),
            replay_policy: ReplayPolicy::default(),
        }
    }
}
