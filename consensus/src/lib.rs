//! Consensus: per-slot elections decided by representative-weighted votes.
//!
//! Each account delegates its weight to a representative. Representatives
//! vote on the candidates competing for an `(account, height)` slot; a
//! candidate confirms once final votes reach 67% of known weight.
//!
//! Every component here is a synchronous state machine. The node crate runs
//! each one behind its own task and channel.
//!
//! ## Module overview
//!
//! - [`election`]: the election set (observe, fold votes, stale, expire).
//! - [`weighter`]: per-candidate vote tally.
//! - [`prioritizer`]: vote admission, buffering and prioritization.
//! - [`vote_queue`]: weight-ordered bounded queue feeding elections.
//! - [`vote_buffer`]: votes waiting for their election to start.
//! - [`voter`]: this node's own voting policy.
//! - [`rep_weights`]: representative weights and the confirmation threshold.
//! - [`signer`], [`store`], [`broadcast`], [`clock`]: collaborator seams.

pub mod broadcast;
pub mod clock;
pub mod election;
pub mod error;
pub mod prioritizer;
pub mod recent_set;
pub mod rep_weights;
pub mod signer;
pub mod store;
pub mod transaction;
pub mod vote;
pub mod vote_buffer;
pub mod vote_queue;
pub mod voter;
pub mod weighter;

pub use broadcast::{BroadcastMessage, BroadcastPayload, BroadcastStrategy, Broadcaster};
pub use clock::{Clock, SystemClock};
pub use election::{Election, ElectionEvent};
pub use error::ConsensusError;
pub use prioritizer::{PrioritizerConfig, VoteEvent, VotePrioritizer};
pub use recent_set::RecentSet;
pub use rep_weights::{RepWeightCache, VoteWeightService, CONFIRMATION_THRESHOLD_BPS};
pub use signer::{Ed25519Signer, VoteSigner};
pub use store::TransactionStore;
pub use transaction::{Transaction, TransactionRejectionReason};
pub use vote::{TransactionVote, Vote, VoteDropReason, VoteKey, VoteRejectionReason};
pub use vote_buffer::VoteBuffer;
pub use vote_queue::VoteQueue;
pub use voter::{CastVote, ElectionVoter, VoterConfig, VoterStrategy};
pub use weighter::TransactionWeighter;
