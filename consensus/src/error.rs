use thiserror::Error;

/// Failures reported by the engine's collaborators.
///
/// Engine outcomes themselves (dropped, rejected or stale votes, expired
/// elections) are events, not errors.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("store error: {0}")]
    Store(String),
}
