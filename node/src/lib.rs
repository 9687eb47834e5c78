//! Quorum election node: runs the consensus engine as a set of tokio tasks.
//!
//! The node owns one task per engine component:
//! - the election set, which folds votes and decides slots
//! - the vote prioritizer, which admits and orders inbound votes
//! - the local voter, which signs and announces this node's votes
//! - the confirmation monitor, which persists decided transactions
//! - staling and expiry sweep timers
//!
//! Components talk over unbounded command channels; outcomes are published
//! as [`NodeEvent`]s to any number of subscribers.

pub mod config;
pub mod error;
pub mod events;
pub mod handle;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;

mod election_monitor;
mod election_service;
mod prioritizer_service;
mod router;
mod sweeper;
mod voter_service;

pub use config::NodeConfig;
pub use election_service::{CandidateTally, ElectionSnapshot};
pub use error::NodeError;
pub use events::NodeEvent;
pub use handle::NodeHandle;
pub use logging::{init_from_config, init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::{ElectionNode, NodeDependencies};
pub use prioritizer_service::PrioritizerSnapshot;
pub use shutdown::{ShutdownController, ShutdownSignal};
