#![forbid(unsafe_code)]

//! The shared visibility coordinator.
//!
//! A [`Coordinator`] is a cheap, cloneable handle to one [`Machine`]. Every
//! trigger in an interface holds a clone and feeds it events; at most one
//! tooltip is ever visible because there is only one machine to ask.
//!
//! # Serialization
//!
//! Transitions are applied one at a time under the machine lock, and each
//! taken transition notifies every listener before the next one starts.
//! A listener that requests a transition while being notified does not
//! deadlock: the request is queued and applied, in order, once the current
//! notification pass finishes. Such a request reports `false` because it has
//! not been applied yet.
//!
//! Read accessors ([`snapshot`](Coordinator::snapshot) and friends) never
//! take the machine lock, so listeners may call them freely.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hovertip_core::clock::DeterministicClock;
//! use hovertip_runtime::{Coordinator, MachineEvent, State, TooltipConfig};
//!
//! let clock = DeterministicClock::new();
//! let coordinator = Coordinator::with_clock(TooltipConfig::default(), Arc::new(clock.clone()));
//! let id = coordinator.next_trigger_id();
//!
//! coordinator.transition(MachineEvent::MouseEnter, Some(id));
//! assert_eq!(coordinator.state(), State::Focused);
//!
//! clock.advance(Duration::from_millis(100));
//! coordinator.fire_due_timers();
//! assert!(coordinator.is_visible(id));
//! ```

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, ThreadId};
use std::time::Duration;

use hovertip_core::clock::{Clock, SystemClock};
use hovertip_core::event::KeyEvent;
use hovertip_core::id::{IdGenerator, TriggerId};

use crate::config::TooltipConfig;
use crate::driver::Wakeup;
use crate::lock;
use crate::machine::{Machine, MachineEvent, Snapshot, State, Transition};
use crate::subscription::{self, Registry, Subscription};

/// A unit of work applied under the machine lock.
#[derive(Debug, Clone, Copy)]
enum Op {
    Transition(MachineEvent, Option<TriggerId>),
    IfActive(MachineEvent, TriggerId),
    Expire,
}

/// Values readers may see without taking the machine lock.
#[derive(Debug, Clone, Copy, Default)]
struct Published {
    snapshot: Snapshot,
    next_deadline: Option<Duration>,
}

struct Shared {
    machine: Mutex<Machine>,
    published: Mutex<Published>,
    registry: Arc<Mutex<Registry>>,
    deferred: Mutex<VecDeque<Op>>,
    notifying: Mutex<Option<ThreadId>>,
    mounted: Mutex<HashSet<TriggerId>>,
    ids: IdGenerator,
    clock: Arc<dyn Clock>,
    suppress_focus: AtomicBool,
    wakeup: Wakeup,
}

/// Shared handle to the interface-wide tooltip state machine.
#[derive(Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    /// Create a coordinator on wall-clock time.
    #[must_use]
    pub fn new(config: TooltipConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a coordinator reading time from `clock`.
    #[must_use]
    pub fn with_clock(config: TooltipConfig, clock: Arc<dyn Clock>) -> Self {
        tracing::debug!(
            rest_ms = config.rest_delay.as_millis() as u64,
            linger_ms = config.linger_delay.as_millis() as u64,
            suppress_focus = config.suppress_focus,
            "tooltip coordinator created"
        );
        Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(Machine::new(&config)),
                published: Mutex::new(Published::default()),
                registry: Arc::new(Mutex::new(Registry::new())),
                deferred: Mutex::new(VecDeque::new()),
                notifying: Mutex::new(None),
                mounted: Mutex::new(HashSet::new()),
                ids: IdGenerator::new(),
                clock,
                suppress_focus: AtomicBool::new(config.suppress_focus),
                wakeup: Wakeup::new(),
            }),
        }
    }

    // --- Transitions ---

    /// Request a transition.
    ///
    /// `new_context` becomes the active trigger if the edge is taken.
    /// Returns `true` if an edge was taken. Events with no edge from the
    /// current state are ignored.
    pub fn transition(&self, event: MachineEvent, new_context: Option<TriggerId>) -> bool {
        self.run(Op::Transition(event, new_context)) > 0
    }

    /// Request a transition only if `id` is the active trigger.
    ///
    /// The check and the transition happen atomically, so an exit event from
    /// a trigger that has lost focus to another never disturbs the other's
    /// tooltip.
    pub fn transition_if_active(&self, event: MachineEvent, id: TriggerId) -> bool {
        self.run(Op::IfActive(event, id)) > 0
    }

    /// Fire every timer whose deadline has passed. Returns how many
    /// transitions resulted.
    pub fn fire_due_timers(&self) -> usize {
        self.run(Op::Expire)
    }

    /// Route a keyboard event that reached the document.
    ///
    /// `Escape` dismisses the visible tooltip as long as its trigger is
    /// still mounted. Returns `true` if the tooltip was dismissed.
    pub fn handle_key(&self, key: &KeyEvent) -> bool {
        if !key.is_escape() {
            return false;
        }
        let snapshot = self.snapshot();
        if snapshot.state != State::Visible {
            return false;
        }
        let Some(active) = snapshot.context.active_trigger else {
            return false;
        };
        if !self.is_mounted(active) {
            tracing::trace!(trigger = %active, "escape ignored: active trigger unmounted");
            return false;
        }
        self.transition_if_active(MachineEvent::SelectWithKeyboard, active)
    }

    /// The pointer moved somewhere that is not over any trigger.
    pub fn pointer_moved_outside(&self) -> bool {
        self.transition(MachineEvent::GlobalMouseMove, None)
    }

    // --- Reads ---

    /// Current state and context.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        lock(&self.shared.published).snapshot
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.snapshot().state
    }

    #[must_use]
    pub fn active_trigger(&self) -> Option<TriggerId> {
        self.snapshot().context.active_trigger
    }

    /// Whether `id`'s tooltip should currently render.
    #[must_use]
    pub fn is_visible(&self, id: TriggerId) -> bool {
        self.snapshot().is_visible_for(id)
    }

    /// Current time on the coordinator's clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.shared.clock.now()
    }

    /// Deadline of the earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        lock(&self.shared.published).next_deadline
    }

    /// Time left until the earliest pending timer fires.
    #[must_use]
    pub fn time_until_next_timer(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_sub(self.now()))
    }

    // --- Subscriptions ---

    /// Register a listener for every taken transition.
    ///
    /// The listener runs on whichever thread applied the transition. Drop
    /// the returned guard to unsubscribe.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = lock(&self.shared.registry).insert(Arc::new(listener));
        Subscription::new(id, &self.shared.registry)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.registry).len()
    }

    // --- Focus suppression ---

    /// Turn focus-driven display off or on.
    ///
    /// While suppressed, trigger bindings skip their `Focus` dispatch. Pointer
    /// events are unaffected.
    pub fn set_focus_suppressed(&self, suppressed: bool) {
        self.shared
            .suppress_focus
            .store(suppressed, Ordering::Relaxed);
        tracing::debug!(suppressed, "focus suppression changed");
    }

    #[must_use]
    pub fn is_focus_suppressed(&self) -> bool {
        self.shared.suppress_focus.load(Ordering::Relaxed)
    }

    // --- Triggers ---

    /// Mint a trigger identity unique within this coordinator.
    pub fn next_trigger_id(&self) -> TriggerId {
        self.shared.ids.next_id()
    }

    /// Record `id` as mounted until the returned guard drops.
    ///
    /// Only mounted triggers receive `Escape`.
    pub fn mount_trigger(&self, id: TriggerId) -> TriggerMount {
        let fresh = lock(&self.shared.mounted).insert(id);
        if !fresh {
            tracing::warn!(trigger = %id, "trigger id mounted twice");
        }
        TriggerMount {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    #[must_use]
    pub fn is_mounted(&self, id: TriggerId) -> bool {
        lock(&self.shared.mounted).contains(&id)
    }

    pub(crate) fn wakeup(&self) -> &Wakeup {
        &self.shared.wakeup
    }

    // --- Internals ---

    fn run(&self, op: Op) -> usize {
        let me = thread::current().id();
        if *lock(&self.shared.notifying) == Some(me) {
            tracing::trace!(?op, "queued re-entrant transition");
            crate::debug_trace!("deferred {:?}", op);
            lock(&self.shared.deferred).push_back(op);
            return 0;
        }

        let mut machine = lock(&self.shared.machine);
        let taken = self.apply(&mut machine, op);
        loop {
            // Only this thread can have queued work: the queue is filled by
            // listeners we are running.
            let next = lock(&self.shared.deferred).pop_front();
            let Some(op) = next else { break };
            self.apply(&mut machine, op);
        }
        taken
    }

    fn apply(&self, machine: &mut Machine, op: Op) -> usize {
        let now = self.shared.clock.now();
        let results: Vec<(Transition, Snapshot)> = match op {
            Op::Transition(event, ctx) => machine
                .transition(event, ctx, now)
                .map(|t| (t, machine.snapshot()))
                .into_iter()
                .collect(),
            Op::IfActive(event, id) => machine
                .transition_if_active(event, id, now)
                .map(|t| (t, machine.snapshot()))
                .into_iter()
                .collect(),
            Op::Expire => machine.expire(now),
        };

        if results.is_empty() {
            if let Op::Transition(event, _) | Op::IfActive(event, _) = op {
                tracing::trace!(?event, state = %machine.state(), "no transition");
            }
            return 0;
        }

        let next_deadline = machine.next_deadline();
        let count = results.len();
        for (transition, snapshot) in results {
            log_transition(&transition, &snapshot, now);
            *lock(&self.shared.published) = Published {
                snapshot,
                next_deadline,
            };
            self.publish(&snapshot);
        }
        // Also catches timers that were canceled without re-arming.
        self.shared.wakeup.notify();
        count
    }

    fn publish(&self, snapshot: &Snapshot) {
        let _pass = NotifyPass::begin(&self.shared.notifying, &self.shared.deferred);
        let delivered = subscription::notify(&self.shared.registry, snapshot);
        tracing::trace!(delivered, "listeners notified");
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("snapshot", &self.snapshot())
            .field("subscribers", &self.subscriber_count())
            .field("focus_suppressed", &self.is_focus_suppressed())
            .finish()
    }
}

fn log_transition(transition: &Transition, snapshot: &Snapshot, now: Duration) {
    let trigger = snapshot.context.active_trigger.map(TriggerId::get);
    tracing::debug!(
        from = %transition.from,
        to = %transition.to,
        event = ?transition.event,
        internal = transition.internal,
        trigger,
        now_ms = now.as_millis() as u64,
        "tooltip transition"
    );
    crate::debug_trace!(
        "{} --{:?}--> {} (trigger={:?})",
        transition.from,
        transition.event,
        transition.to,
        trigger
    );
}

/// Marks the current thread as notifying for the lifetime of the guard.
///
/// Cleared on drop so a panicking listener does not leave the coordinator
/// deferring forever. Work queued by a pass that unwinds is dropped with it.
struct NotifyPass<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
    deferred: &'a Mutex<VecDeque<Op>>,
}

impl<'a> NotifyPass<'a> {
    fn begin(slot: &'a Mutex<Option<ThreadId>>, deferred: &'a Mutex<VecDeque<Op>>) -> Self {
        *lock(slot) = Some(thread::current().id());
        Self { slot, deferred }
    }
}

impl Drop for NotifyPass<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let dropped = lock(self.deferred).drain(..).count();
            if dropped > 0 {
                tracing::warn!(dropped, "listener panicked; queued transitions discarded");
            }
        }
        *lock(self.slot) = None;
    }
}

/// Mount guard returned by [`Coordinator::mount_trigger`].
#[must_use = "dropping a TriggerMount unmounts the trigger"]
pub struct TriggerMount {
    id: TriggerId,
    shared: Weak<Shared>,
}

impl TriggerMount {
    #[inline]
    #[must_use]
    pub fn id(&self) -> TriggerId {
        self.id
    }
}

impl Drop for TriggerMount {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.mounted).remove(&self.id);
        }
    }
}

impl fmt::Debug for TriggerMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerMount").field("id", &self.id).finish()
    }
}
