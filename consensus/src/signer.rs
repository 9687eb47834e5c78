//! Signing of this node's own votes.

use quorum_crypto::{keypair_from_private, sign_message};
use quorum_types::{KeyPair, PrivateKey, PublicKey, Signature};

/// Signs vote payloads on behalf of the local representative.
pub trait VoteSigner: Send + Sync {
    fn public_key(&self) -> PublicKey;

    fn sign(&self, payload: &[u8; 32]) -> Signature;
}

/// Ed25519 signer backed by an in-memory key pair.
pub struct Ed25519Signer {
    keypair: KeyPair,
}

impl Ed25519Signer {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    pub fn from_private(private: PrivateKey) -> Self {
        Self::new(keypair_from_private(private))
    }
}

impl VoteSigner for Ed25519Signer {
    fn public_key(&self) -> PublicKey {
        self.keypair.public
    }

    fn sign(&self, payload: &[u8; 32]) -> Signature {
        sign_message(payload, &self.keypair.private)
    }
}
