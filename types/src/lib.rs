//! Fundamental types for the stakeholder DAO.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! principals, fixed-point amounts, timestamps and clocks, proposal ids, and the
//! governance parameters that configure the engine.

pub mod amount;
pub mod error;
pub mod id;
pub mod params;
pub mod principal;
pub mod time;

pub use amount::{format_units, parse_units, FundAmount, TokenAmount, DECIMALS, UNIT};
pub use error::DaoError;
pub use id::ProposalId;
pub use params::{GovernanceParams, ReplayPolicy, VotePolicy};
pub use principal::Principal;
pub use time::{Clock, SystemClock, Timestamp};
