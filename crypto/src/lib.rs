//! Cryptographic primitives for the quorum election engine.
//!
//! - **Ed25519** for vote signatures
//! - **Blake2b-256** for transaction hashes and vote signing payloads

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
