//! Consensus configuration with TOML file support.

use crate::ConsensusError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the consensus subsystem.
///
/// Can be loaded from a TOML file via [`ConsensusConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a sensible
/// default, so a partial file is fine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Seconds between announcement rounds for one election.
    #[serde(default = "default_announce_interval")]
    pub announce_interval_secs: u64,

    /// Unanswered announcements before an unconfirmed election is evicted.
    #[serde(default = "default_max_announcements")]
    pub max_announcements: u32,

    /// Milliseconds between election-pool sweep ticks.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Seconds between local representative registry refreshes.
    #[serde(default = "default_rep_refresh_interval")]
    pub rep_refresh_interval_secs: u64,

    /// Seconds between online-representative discovery rounds.
    #[serde(default = "default_online_discovery_interval")]
    pub online_discovery_interval_secs: u64,

    /// Liveness window for an online-representative record.
    #[serde(default = "default_online_rep_ttl")]
    pub online_rep_ttl_secs: u64,

    /// Capacity of the inbound message dedup cache.
    #[serde(default = "default_cache_size")]
    pub dedup_cache_size: usize,

    /// TTL of dedup entries, in seconds.
    #[serde(default = "default_dedup_ttl")]
    pub dedup_cache_ttl_secs: u64,

    /// Capacity of the dependency-gap (unchecked) cache.
    #[serde(default = "default_cache_size")]
    pub unchecked_cache_size: usize,

    /// TTL of unchecked entries, in seconds. A block whose dependency does
    /// not arrive within this window is abandoned.
    #[serde(default = "default_gap_ttl")]
    pub unchecked_ttl_secs: u64,

    /// Capacity of the parked-vote cache.
    #[serde(default = "default_cache_size")]
    pub vote_cache_size: usize,

    /// TTL of parked votes, in seconds.
    #[serde(default = "default_gap_ttl")]
    pub vote_cache_ttl_secs: u64,

    /// Bounded capacity of each per-topic ingress queue.
    #[serde(default = "default_ingress_capacity")]
    pub ingress_queue_capacity: usize,

    /// Delay before retrying a conflicted ledger transaction.
    #[serde(default = "default_conflict_retry_delay_ms")]
    pub conflict_retry_delay_ms: u64,
}

fn default_announce_interval() -> u64 {
    16
}
fn default_max_announcements() -> u32 {
    20
}
fn default_sweep_interval_ms() -> u64 {
    1000
}
fn default_rep_refresh_interval() -> u64 {
    300
}
fn default_online_discovery_interval() -> u64 {
    120
}
fn default_online_rep_ttl() -> u64 {
    300
}
fn default_cache_size() -> usize {
    65_536
}
fn default_dedup_ttl() -> u64 {
    600
}
fn default_gap_ttl() -> u64 {
    300
}
fn default_ingress_capacity() -> usize {
    1024
}
fn default_conflict_retry_delay_ms() -> u64 {
    1
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config must deserialize from defaults")
    }
}

impl ConsensusConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConsensusError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConsensusError::Config(format!("read config file: {e}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConsensusError> {
        toml::from_str(raw).map_err(|e| ConsensusError::Config(format!("parse config: {e}")))
    }

    pub fn conflict_retry_delay(&self) -> Duration {
        Duration::from_millis(self.conflict_retry_delay_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.dedup_cache_ttl_secs)
    }

    pub fn unchecked_ttl(&self) -> Duration {
        Duration::from_secs(self.unchecked_ttl_secs)
    }

    pub fn vote_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.vote_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ConsensusConfig::default();
        assert_eq!(cfg.announce_interval_secs, 16);
        assert_eq!(cfg.max_announcements, 20);
        assert_eq!(cfg.sweep_interval_ms, 1000);
        assert_eq!(cfg.rep_refresh_interval_secs, 300);
        assert_eq!(cfg.online_discovery_interval_secs, 120);
        assert_eq!(cfg.unchecked_ttl_secs, 300);
        assert_eq!(cfg.dedup_cache_size, 65_536);
    }

    #[test]
    fn partial_toml_overrides() {
        let cfg = ConsensusConfig::from_toml_str(
            r#"
            announce_interval_secs = 4
            max_announcements = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.announce_interval_secs, 4);
        assert_eq!(cfg.max_announcements, 5);
        // Unspecified fields keep their defaults.
        assert_eq!(cfg.sweep_interval_ms, 1000);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(ConsensusConfig::from_toml_str("announce_interval_secs = \"soon\"").is_err());
    }

    #[test]
    fn duration_helpers() {
        let cfg = ConsensusConfig::default();
        assert_eq!(cfg.conflict_retry_delay(), Duration::from_millis(1));
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(1));
        assert_eq!(cfg.unchecked_ttl(), Duration::from_secs(300));
    }
}
