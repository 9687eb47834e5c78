//! Slots: contested positions in an account chain.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::keys::PublicKey;

/// Position of a transaction in its account chain (1-based).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Height(u64);

impl Height {
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contested `(account, height)` position. Every transaction competing for
/// the same slot is a fork of the others; exactly one of them can confirm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub account: PublicKey,
    pub height: Height,
}

impl Slot {
    pub fn new(account: PublicKey, height: Height) -> Self {
        Self { account, height }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account, self.height)
    }
}
