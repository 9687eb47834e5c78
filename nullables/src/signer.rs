//! Nullable signer: a fixed Ed25519 key that counts what it signs.

use quorum_consensus::VoteSigner;
use quorum_crypto::{keypair_from_seed, sign_message};
use quorum_types::{KeyPair, PublicKey, Signature};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Signs with a key derived from a one-byte seed, so tests can name voters
/// by number and still produce verifiable signatures.
pub struct NullSigner {
    keypair: KeyPair,
    signed: AtomicUsize,
}

impl NullSigner {
    pub fn new(seed: u8) -> Self {
        Self {
            keypair: keypair_from_seed(&[seed; 32]),
            signed: AtomicUsize::new(0),
        }
    }

    /// Number of payloads signed so far.
    pub fn signed(&self) -> usize {
        self.signed.load(Ordering::SeqCst)
    }
}

impl VoteSigner for NullSigner {
    fn public_key(&self) -> PublicKey {
        self.keypair.public
    }

    fn sign(&self, payload: &[u8; 32]) -> Signature {
        self.signed.fetch_add(1, Ordering::SeqCst);
        sign_message(payload, &self.keypair.private)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_crypto::verify_signature;

    #[test]
    fn same_seed_same_key() {
        assert_eq!(NullSigner::new(4).public_key(), NullSigner::new(4).public_key());
        assert_ne!(NullSigner::new(4).public_key(), NullSigner::new(5).public_key());
    }

    #[test]
    fn counts_signatures() {
        let signer = NullSigner::new(1);
        let payload = [7u8; 32];
        let sig = signer.sign(&payload);
        assert!(verify_signature(&payload, &sig, &signer.public_key()));
        assert_eq!(signer.signed(), 1);
    }
}
