//! Treasury and stakeholder registry.
//!
//! Contributions are the only way state enters this crate:
//! `contribute(p, amount)` adds to `p`'s cumulative contribution, mints
//! governance tokens at a fixed rate, and admits `p` as a stakeholder once
//! the cumulative contribution reaches the admission threshold.
//!
//! The registry is a derived view. It has no public mutators; the treasury
//! is the only writer.

pub mod error;
pub mod registry;
pub mod treasury;

pub use error::TreasuryError;
pub use registry::{StakeholderRecord, StakeholderRegistry};
pub use treasury::{ContributionReceipt, Treasury};
