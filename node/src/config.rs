//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use quorum_consensus::{PrioritizerConfig, VoterConfig, VoterStrategy};
use quorum_types::Amount;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for an election node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Call [`NodeConfig::validate`]
/// before starting a node; [`crate::ElectionNode::start`] does so itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Whether this node votes: "default", "force_enabled" or "disabled".
    #[serde(default)]
    pub voter_strategy: VoterStrategy,

    /// Minimum own representative weight (raw) required to cast votes.
    #[serde(default = "default_min_vote_weight")]
    pub min_vote_weight: u64,

    /// Capacity of the prioritized vote queue.
    #[serde(default = "default_queue_group_max_size")]
    pub queue_group_max_size: usize,

    /// Votes in flight from the prioritizer to the election task. Anything
    /// beyond this waits in the prioritized queue.
    #[serde(default = "default_vote_channel_size")]
    pub vote_channel_size: usize,

    /// Total votes buffered for elections that have not started yet.
    #[serde(default = "default_vote_buffer_max_size")]
    pub vote_buffer_max_size: usize,

    /// Recently rejected transactions remembered to drop their votes.
    #[serde(default = "default_rejected_cache_size")]
    pub rejected_cache_size: usize,

    /// Recently seen vote signatures remembered to drop duplicates.
    #[serde(default = "default_duplicate_window_size")]
    pub duplicate_window_size: usize,

    /// Confirmed slots remembered so they are not reopened.
    #[serde(default = "default_recently_confirmed_size")]
    pub recently_confirmed_size: usize,

    /// Idle back-off of the vote prioritizer when its queue is empty.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Age after which an open election is re-announced.
    #[serde(default = "default_staling_after_secs")]
    pub staling_after_secs: u64,

    /// Age after which an open election is abandoned.
    #[serde(default = "default_staled_after_secs")]
    pub staled_after_secs: u64,

    /// Period of the staling and expiry sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Delay of the expiry sweep relative to the staling sweep.
    #[serde(default = "default_expiry_sweep_offset_secs")]
    pub expiry_sweep_offset_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_min_vote_weight() -> u64 {
    1_000_000_000_000_000
}

fn default_queue_group_max_size() -> usize {
    5_000
}

fn default_vote_channel_size() -> usize {
    64
}

fn default_vote_buffer_max_size() -> usize {
    10_000
}

fn default_rejected_cache_size() -> usize {
    10_000
}

fn default_duplicate_window_size() -> usize {
    65_536
}

fn default_recently_confirmed_size() -> usize {
    65_536
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_staling_after_secs() -> u64 {
    60
}

fn default_staled_after_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_expiry_sweep_offset_secs() -> u64 {
    30
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// Reject settings the engine cannot run with. `has_signer` tells whether
    /// a signing key is available to the node.
    pub fn validate(&self, has_signer: bool) -> Result<(), NodeError> {
        let capacities = [
            ("queue_group_max_size", self.queue_group_max_size),
            ("vote_channel_size", self.vote_channel_size),
            ("vote_buffer_max_size", self.vote_buffer_max_size),
            ("rejected_cache_size", self.rejected_cache_size),
            ("duplicate_window_size", self.duplicate_window_size),
            ("recently_confirmed_size", self.recently_confirmed_size),
        ];
        if let Some((name, _)) = capacities.iter().find(|(_, size)| *size == 0) {
            return Err(NodeError::Config(format!("{name} must be greater than zero")));
        }
        if self.poll_interval_ms == 0 || self.sweep_interval_secs == 0 {
            return Err(NodeError::Config(
                "poll_interval_ms and sweep_interval_secs must be greater than zero".into(),
            ));
        }
        if self.staled_after_secs <= self.staling_after_secs {
            return Err(NodeError::Config(format!(
                "staled_after_secs ({}) must exceed staling_after_secs ({})",
                self.staled_after_secs, self.staling_after_secs
            )));
        }
        if self.voter_strategy == VoterStrategy::ForceEnabled && !has_signer {
            return Err(NodeError::Config(
                "voter_strategy = \"force_enabled\" requires a signing key".into(),
            ));
        }
        self.parsed_log_format().map(|_| ())
    }

    pub fn parsed_log_format(&self) -> Result<LogFormat, NodeError> {
        match self.log_format.as_str() {
            "human" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            other => Err(NodeError::Config(format!("unknown log_format {other:?}"))),
        }
    }

    pub fn prioritizer_config(&self) -> PrioritizerConfig {
        PrioritizerConfig {
            queue_max_size: self.queue_group_max_size,
            buffer_max_size: self.vote_buffer_max_size,
            rejected_cache_size: self.rejected_cache_size,
            duplicate_window_size: self.duplicate_window_size,
        }
    }

    pub fn voter_config(&self) -> VoterConfig {
        VoterConfig {
            strategy: self.voter_strategy,
            min_weight: Amount::new(u128::from(self.min_vote_weight)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn staling_after(&self) -> Duration {
        Duration::from_secs(self.staling_after_secs)
    }

    pub fn staled_after(&self) -> Duration {
        Duration::from_secs(self.staled_after_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn expiry_sweep_offset(&self) -> Duration {
        Duration::from_secs(self.expiry_sweep_offset_secs)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            voter_strategy: VoterStrategy::Default,
            min_vote_weight: default_min_vote_weight(),
            queue_group_max_size: default_queue_group_max_size(),
            vote_channel_size: default_vote_channel_size(),
            vote_buffer_max_size: default_vote_buffer_max_size(),
            rejected_cache_size: default_rejected_cache_size(),
            duplicate_window_size: default_duplicate_window_size(),
            recently_confirmed_size: default_recently_confirmed_size(),
            poll_interval_ms: default_poll_interval_ms(),
            staling_after_secs: default_staling_after_secs(),
            staled_after_secs: default_staled_after_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            expiry_sweep_offset_secs: default_expiry_sweep_offset_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.voter_strategy, VoterStrategy::Default);
        assert_eq!(config.min_vote_weight, 1_000_000_000_000_000);
        assert_eq!(config.queue_group_max_size, 5_000);
        assert_eq!(config.vote_buffer_max_size, 10_000);
        assert_eq!(config.vote_channel_size, 64);
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.staling_after(), Duration::from_secs(60));
        assert_eq!(config.staled_after(), Duration::from_secs(300));
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            voter_strategy = "disabled"
            queue_group_max_size = 64
            staled_after_secs = 900
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.voter_strategy, VoterStrategy::Disabled);
        assert_eq!(config.queue_group_max_size, 64);
        assert_eq!(config.staled_after_secs, 900);
        assert_eq!(config.staling_after_secs, 60); // default
    }

    #[test]
    fn unknown_strategy_is_a_config_error() {
        let result = NodeConfig::from_toml_str("voter_strategy = \"sometimes\"");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "voter_strategy = \"force_enabled\"\nmin_vote_weight = 42").expect("write");
        let config = NodeConfig::from_toml_file(file.path()).expect("should load");
        assert_eq!(config.voter_strategy, VoterStrategy::ForceEnabled);
        assert_eq!(config.voter_config().min_weight, Amount::new(42));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/quorum.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn defaults_validate() {
        assert!(NodeConfig::default().validate(false).is_ok());
    }

    #[test]
    fn staled_must_exceed_staling() {
        let config = NodeConfig {
            staling_after_secs: 300,
            staled_after_secs: 300,
            ..NodeConfig::default()
        };
        assert!(matches!(config.validate(true), Err(NodeError::Config(_))));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = NodeConfig {
            vote_buffer_max_size: 0,
            ..NodeConfig::default()
        };
        let err = config.validate(true).expect_err("zero buffer must fail");
        assert!(err.to_string().contains("vote_buffer_max_size"));
    }

    #[test]
    fn zero_vote_channel_is_rejected() {
        let config = NodeConfig {
            vote_channel_size: 0,
            ..NodeConfig::default()
        };
        let err = config.validate(false).expect_err("zero channel must fail");
        assert!(err.to_string().contains("vote_channel_size"));
    }

    #[test]
    fn force_enabled_requires_signer() {
        let config = NodeConfig {
            voter_strategy: VoterStrategy::ForceEnabled,
            ..NodeConfig::default()
        };
        assert!(config.validate(false).is_err());
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let config = NodeConfig {
            log_format: "xml".into(),
            ..NodeConfig::default()
        };
        assert!(config.validate(false).is_err());
        assert_eq!(
            NodeConfig::default().parsed_log_format().expect("human"),
            LogFormat::Human
        );
    }
}
