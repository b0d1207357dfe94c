//! Stakeholder registry — membership and token balances derived from contributions.

use dao_types::{FundAmount, Principal, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bookkeeping for one contributing principal.
///
/// A record exists for every principal that has contributed at least once,
/// whether or not it has been admitted yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderRecord {
    pub principal: Principal,
    /// Cumulative amount ever contributed. Never decreases.
    pub contributed: FundAmount,
    /// Governance tokens minted to this principal. Never decreases.
    pub balance: TokenAmount,
    pub first_contribution_at: Timestamp,
    /// When the cumulative contribution first reached the admission threshold.
    pub admitted_at: Option<Timestamp>,
}

/// Membership view over all contributors.
///
/// Queries are total: unknown principals read as zero contribution, zero
/// balance, not a stakeholder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderRegistry {
    admission_threshold: FundAmount,
    records: BTreeMap<Principal, StakeholderRecord>,
}

impl StakeholderRegistry {
    pub fn new(admission_threshold: FundAmount) -> Self {
        Self {
            admission_threshold,
            records: BTreeMap::new(),
        }
    }

    pub fn admission_threshold(&self) -> FundAmount {
        self.admission_threshold
    }

    /// True iff the cumulative contribution reaches the admission threshold.
    pub fn is_stakeholder(&self, principal: &Principal) -> bool {
        self.contribution_of(principal) >= self.admission_threshold
    }

    /// Current token balance; zero for unknown principals.
    pub fn balance_of(&self, principal: &Principal) -> TokenAmount {
        self.records
            .get(principal)
            .map(|r| r.balance)
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Cumulative amount contributed; zero for unknown principals.
    pub fn contribution_of(&self, principal: &Principal) -> FundAmount {
        self.records
            .get(principal)
            .map(|r| r.contributed)
            .unwrap_or(FundAmount::ZERO)
    }

    pub fn get(&self, principal: &Principal) -> Option<&StakeholderRecord> {
        self.records.get(principal)
    }

    /// Admitted stakeholders, in principal order.
    pub fn stakeholders(&self) -> impl Iterator<Item = &StakeholderRecord> {
        self.records
            .values()
            .filter(move |r| r.contributed >= self.admission_threshold)
    }

    pub fn stakeholder_count(&self) -> usize {
        self.stakeholders().count()
    }

    /// Every principal that has contributed, admitted or not.
    pub fn contributors(&self) -> impl Iterator<Item = &StakeholderRecord> {
        self.records.values()
    }

    /// Replace (or create) a record. Only the treasury writes here, after it
    /// has computed every new value with checked arithmetic.
    pub(crate) fn commit(&mut self, record: StakeholderRecord) {
        self.records.insert(record.principal, record);
    }
}
