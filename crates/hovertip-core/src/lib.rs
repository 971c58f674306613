#![forbid(unsafe_code)]

//! Core: geometry, trigger input events, trigger identities, and clocks.

pub mod clock;
pub mod event;
pub mod geometry;
pub mod id;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace, warn};
