//! Client tuning: confirmation polling and stale-read retries.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Delay between receipt polls and between stale-read retries.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Polls per confirmation before giving up and reporting `Pending`.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    /// Re-reads allowed when a replica trails the session watermark.
    #[serde(default = "default_max_stale_retries")]
    pub max_stale_retries: u32,
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_max_polls() -> u32 {
    40
}

fn default_max_stale_retries() -> u32 {
    5
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
            max_stale_retries: default_max_stale_retries(),
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Zero-delay settings for tests and scripted sessions.
    pub fn immediate() -> Self {
        Self {
            poll_interval_ms: 0,
            ..Self::default()
        }
    }
}
