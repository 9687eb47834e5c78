use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("consensus error: {0}")]
    Consensus(#[from] quorum_consensus::ConsensusError),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0} channel closed")]
    ChannelClosed(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shutdown timeout")]
    ShutdownTimeout,

    #[error("task failed: {0}")]
    Task(String),
}
