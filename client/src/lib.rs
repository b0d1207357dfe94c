//! Client facade for the DAO governance engine.
//!
//! A [`ClientFacade`] acts for one caller. It submits intents through a
//! [`LedgerBoundary`], reports each as `Pending`, `Committed` or `Rejected`,
//! and keeps reads consistent with the caller's own writes.
//! [`LocalLedger`] hosts an engine in-process.

pub mod boundary;
pub mod config;
pub mod error;
pub mod facade;
pub mod intent;
pub mod local;

pub use boundary::LedgerBoundary;
pub use config::ClientConfig;
pub use error::{ClientError, TransportError};
pub use facade::{ClientFacade, Dashboard, VoteOrSettle};
pub use intent::{Effect, Intent, Receipt, Rejection, TicketId, TxStatus};
pub use local::LocalLedger;
