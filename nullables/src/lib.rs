//! Nullable infrastructure for deterministic testing.
//!
//! The engine's external dependencies (clock, network, storage, signing) sit behind
//! traits in `quorum-consensus`. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod network;
pub mod signer;
pub mod store;

pub use clock::NullClock;
pub use network::NullNetwork;
pub use signer::NullSigner;
pub use store::NullStore;
