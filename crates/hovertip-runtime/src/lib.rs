#![forbid(unsafe_code)]

//! hovertip runtime
//!
//! Owns tooltip visibility for a whole interface: one state machine, its two
//! timers, and the listeners that want to hear about every change.
//!
//! # Key Components
//!
//! - [`Coordinator`] - shared handle that serializes every transition
//! - [`Machine`] - the state machine and its declarative [`TRANSITIONS`] table
//! - [`TimerQueue`] - generation-checked one-shot timers
//! - [`Registry`] / [`Subscription`] - listener registration
//! - [`TimerDriver`] - background thread that fires timers on wall time
//! - [`Simulator`] - deterministic driver for tests
//!
//! # How it fits in the system
//! `hovertip-core` supplies identities, clocks, and input types. Trigger
//! bindings in `hovertip-widgets` translate input into [`MachineEvent`]s and
//! subscribe here to learn when their own tooltip is visible.

use std::sync::{Mutex, MutexGuard};

pub mod config;
pub mod coordinator;
pub mod debug_trace;
pub mod driver;
pub mod machine;
pub mod simulator;
pub mod subscription;
pub mod timer;

pub use config::{ConfigError, TooltipConfig, TooltipPolicy};
pub use coordinator::{Coordinator, TriggerMount};
pub use driver::TimerDriver;
pub use machine::{Context, Machine, MachineEvent, Snapshot, State, TRANSITIONS, Transition};
pub use simulator::{Record, Simulator};
pub use subscription::{Listener, Registry, Subscription, SubscriptionId};
pub use timer::{TimerHandle, TimerKind, TimerQueue};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
