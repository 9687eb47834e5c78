//! Fundamental types for the quorum election engine.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: transaction hashes, keys and signatures, voting weight amounts,
//! vote timestamps, and the `(account, height)` slot a fork competes for.

pub mod amount;
pub mod hash;
pub mod keys;
pub mod slot;
pub mod time;

pub use amount::Amount;
pub use hash::TxHash;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use slot::{Height, Slot};
pub use time::Timestamp;
