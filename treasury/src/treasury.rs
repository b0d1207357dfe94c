//! Contribution intake and token issuance.

use crate::error::TreasuryError;
use crate::registry::{StakeholderRecord, StakeholderRegistry};
use dao_types::{FundAmount, GovernanceParams, Principal, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of a committed contribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionReceipt {
    pub principal: Principal,
    /// Tokens minted by this contribution.
    pub minted: TokenAmount,
    /// Cumulative contribution after this one.
    pub total_contributed: FundAmount,
    /// Token balance after this contribution.
    pub balance: TokenAmount,
    /// Whether this contribution crossed the admission threshold.
    pub newly_admitted: bool,
}

/// The treasury — owns issuance and is the sole writer of the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    registry: StakeholderRegistry,
    /// Raw tokens minted per raw unit contributed.
    tokens_per_unit: u64,
    /// Sum of every contribution ever received.
    total_funds: FundAmount,
    /// Sum of every token ever minted.
    total_supply: TokenAmount,
}

impl Treasury {
    pub fn new(admission_threshold: FundAmount, tokens_per_unit: u64) -> Self {
        Self {
            registry: StakeholderRegistry::new(admission_threshold),
            tokens_per_unit,
            total_funds: FundAmount::ZERO,
            total_supply: TokenAmount::ZERO,
        }
    }

    pub fn from_params(params: &GovernanceParams) -> Self {
        Self::new(params.admission_threshold, params.tokens_per_unit)
    }

    pub fn registry(&self) -> &StakeholderRegistry {
        &self.registry
    }

    /// Treasury balance: everything contributed so far.
    pub fn total_funds(&self) -> FundAmount {
        self.total_funds
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// Tokens minted for `amount` at the configured rate.
    pub fn tokens_for(&self, amount: FundAmount) -> Result<TokenAmount, TreasuryError> {
        amount
            .raw()
            .checked_mul(u128::from(self.tokens_per_unit))
            .map(TokenAmount::new)
            .ok_or(TreasuryError::Overflow)
    }

    /// Accept a contribution.
    ///
    /// Every new value is computed before anything is written, so an error
    /// leaves the treasury and the registry untouched.
    pub fn contribute(
        &mut self,
        principal: &Principal,
        amount: FundAmount,
        now: Timestamp,
    ) -> Result<ContributionReceipt, TreasuryError> {
        if amount.is_zero() {
            return Err(TreasuryError::InvalidAmount);
        }
        let minted = self.tokens_for(amount)?;
        let was_stakeholder = self.registry.is_stakeholder(principal);

        let mut record = self
            .registry
            .get(principal)
            .cloned()
            .unwrap_or_else(|| StakeholderRecord {
                principal: *principal,
                contributed: FundAmount::ZERO,
                balance: TokenAmount::ZERO,
                first_contribution_at: now,
                admitted_at: None,
            });
        record.contributed = record
            .contributed
            .checked_add(amount)
            .ok_or(TreasuryError::Overflow)?;
        record.balance = record
            .balance
            .checked_add(minted)
            .ok_or(TreasuryError::Overflow)?;
        let total_funds = self
            .total_funds
            .checked_add(amount)
            .ok_or(TreasuryError::Overflow)?;
        let total_supply = self
            .total_supply
            .checked_add(minted)
            .ok_or(TreasuryError::Overflow)?;

        let newly_admitted =
            !was_stakeholder && record.contributed >= self.registry.admission_threshold();
        if newly_admitted {
            record.admitted_at = Some(now);
        }

        let receipt = ContributionReceipt {
            principal: *principal,
            minted,
            total_contributed: record.contributed,
            balance: record.balance,
            newly_admitted,
        };

        self.registry.commit(record);
        self.total_funds = total_funds;
        self.total_supply = total_supply;

        if newly_admitted {
            info!(%principal, contributed = %receipt.total_contributed, "stakeholder admitted");
        }
        debug!(%principal, %amount, minted = %minted, "contribution accepted");
        Ok(receipt)
    }
}
