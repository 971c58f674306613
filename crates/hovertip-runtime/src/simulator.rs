#![forbid(unsafe_code)]

//! Deterministic coordinator simulator for testing.
//!
//! `Simulator` pairs a [`Coordinator`] with a [`DeterministicClock`] and
//! records every snapshot the coordinator publishes. Time only moves through
//! [`advance`](Simulator::advance), which fires each timer at exactly its
//! deadline, so timing assertions never sleep and never flake.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use hovertip_runtime::{MachineEvent, Simulator, State, TooltipConfig};
//!
//! let sim = Simulator::new(TooltipConfig::default());
//! let id = sim.coordinator().next_trigger_id();
//!
//! sim.send(MachineEvent::MouseEnter, Some(id));
//! sim.advance(Duration::from_millis(100));
//! assert_eq!(sim.state(), State::Visible);
//! assert_eq!(sim.states(), vec![State::Focused, State::Visible]);
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hovertip_core::clock::{Clock, DeterministicClock};
use hovertip_core::id::TriggerId;

use crate::config::TooltipConfig;
use crate::coordinator::Coordinator;
use crate::lock;
use crate::machine::{MachineEvent, Snapshot, State};
use crate::subscription::Subscription;

/// One published snapshot and the simulated time it was published at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub at: Duration,
    pub snapshot: Snapshot,
}

/// Deterministic driver for a [`Coordinator`].
pub struct Simulator {
    clock: DeterministicClock,
    coordinator: Coordinator,
    history: Arc<Mutex<Vec<Record>>>,
    _recorder: Subscription,
}

impl Simulator {
    /// Create a simulator at time zero.
    #[must_use]
    pub fn new(config: TooltipConfig) -> Self {
        let clock = DeterministicClock::new();
        let coordinator = Coordinator::with_clock(config, Arc::new(clock.clone()));
        let history = Arc::new(Mutex::new(Vec::new()));

        let recorder = {
            let history = Arc::clone(&history);
            let clock = clock.clone();
            coordinator.subscribe(move |snapshot| {
                lock(&history).push(Record {
                    at: clock.now(),
                    snapshot: *snapshot,
                });
            })
        };

        Self {
            clock,
            coordinator,
            history,
            _recorder: recorder,
        }
    }

    #[must_use]
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn clock(&self) -> &DeterministicClock {
        &self.clock
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.coordinator.state()
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.coordinator.snapshot()
    }

    /// Send an event at the current simulated time.
    pub fn send(&self, event: MachineEvent, new_context: Option<TriggerId>) -> bool {
        self.coordinator.transition(event, new_context)
    }

    /// Send a guarded exit event at the current simulated time.
    pub fn send_if_active(&self, event: MachineEvent, id: TriggerId) -> bool {
        self.coordinator.transition_if_active(event, id)
    }

    /// Move time forward by `dt`, firing due timers at their exact deadlines.
    ///
    /// Returns how many timer transitions fired.
    pub fn advance(&self, dt: Duration) -> usize {
        let target = self.now().saturating_add(dt);
        self.advance_to(target)
    }

    /// Move time forward to `target`. Targets in the past are ignored.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.coordinator.next_deadline() {
            if deadline > target {
                break;
            }
            self.clock.set(deadline);
            let n = self.coordinator.fire_due_timers();
            if n == 0 {
                break;
            }
            fired += n;
        }
        self.clock.set(target);
        fired
    }

    /// Every snapshot published so far, in order.
    #[must_use]
    pub fn history(&self) -> Vec<Record> {
        lock(&self.history).clone()
    }

    /// States of every published snapshot, in order.
    #[must_use]
    pub fn states(&self) -> Vec<State> {
        lock(&self.history).iter().map(|r| r.snapshot.state).collect()
    }

    /// Forget recorded history.
    pub fn clear_history(&self) {
        lock(&self.history).clear();
    }
}
