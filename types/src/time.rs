//! Vote timestamps.
//!
//! Timestamps are Unix epoch milliseconds (UTC). One value is reserved:
//! [`Timestamp::FINAL`] marks a final vote, an irrevocable commitment that
//! compares greater than every wall-clock timestamp and therefore can never
//! be superseded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    /// Sentinel carried by final votes.
    pub const FINAL: Self = Self(u64::MAX);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Current system time. Never returns the final sentinel.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis.min(u64::MAX - 1))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn is_final(&self) -> bool {
        *self == Self::FINAL
    }

    /// Little-endian bytes, as bound into vote signatures.
    pub fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// The timestamp `duration` before this one, clamped at the epoch.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration.as_millis() as u64))
    }

    /// The next representable non-final timestamp after this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1).min(u64::MAX - 1))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_final() {
            write!(f, "final")
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}
