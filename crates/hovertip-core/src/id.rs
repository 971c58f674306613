#![forbid(unsafe_code)]

//! Trigger identities.
//!
//! A [`TriggerId`] is minted once when a trigger mounts and kept for as long
//! as that trigger lives. It is only ever compared for equality against the
//! coordinator's active trigger.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of one mounted trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(u64);

impl TriggerId {
    /// Wrap a raw identity value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identity value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Element id used to link the trigger to its tooltip (`aria-describedby`).
    #[must_use]
    pub fn dom_id(self) -> String {
        format!("tooltip--{}", self.0)
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mints unique [`TriggerId`]s.
///
/// Safe to share between threads; identities are never reused within one
/// generator.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a generator whose first identity is `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Mint the next identity.
    pub fn next_id(&self) -> TriggerId {
        TriggerId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
