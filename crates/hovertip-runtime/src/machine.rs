#![forbid(unsafe_code)]

//! The tooltip visibility state machine.
//!
//! One [`Machine`] owns the visibility state for a whole interface. Input
//! events move it along the edges of [`TRANSITIONS`]; an event with no edge
//! from the current state is silently ignored.
//!
//! # Transition order
//!
//! A taken edge runs, in order: the current state's leave hook, the context
//! swap (when a new context was supplied), the target state's enter hook.
//! The caller notifies subscribers afterwards. A self-loop is an internal
//! transition: it swaps context but runs neither hook, so
//! `Focused --mousemove--> Focused` does not restart the rest timer.
//!
//! # Invariants
//!
//! 1. A rest timer is pending only in `Focused`; a linger timer only in
//!    `LeavingVisible`.
//! 2. The active trigger is set in `Focused`, `Visible`, and `LeavingVisible`,
//!    and cleared in `Idle`.
//! 3. Timer handles are owned by the state that armed them; leaving the state
//!    invalidates the handle, so a stale timer can never fire.

use std::fmt;
use std::time::Duration;

use hovertip_core::id::TriggerId;

use crate::config::TooltipConfig;
use crate::timer::{TimerHandle, TimerKind, TimerQueue};

/// Visibility state, one active per machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum State {
    /// Nothing engaged.
    #[default]
    Idle,
    /// Pointer is on a trigger; waiting for it to rest.
    Focused,
    /// A tooltip is shown.
    Visible,
    /// A tooltip is shown but will hide when the linger delay elapses.
    LeavingVisible,
    /// The user rejected the tooltip; it stays hidden until disengagement.
    Dismissed,
}

impl State {
    /// Every state.
    pub const ALL: [State; 5] = [
        State::Idle,
        State::Focused,
        State::Visible,
        State::LeavingVisible,
        State::Dismissed,
    ];

    /// Whether the active trigger's tooltip is on screen in this state.
    #[inline]
    #[must_use]
    pub const fn shows_tooltip(self) -> bool {
        matches!(self, State::Visible | State::LeavingVisible)
    }

    /// Stable lowercase name, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Focused => "focused",
            State::Visible => "visible",
            State::LeavingVisible => "leaving_visible",
            State::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events the machine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineEvent {
    MouseEnter,
    MouseMove,
    MouseLeave,
    MouseDown,
    Focus,
    Blur,
    /// The rest timer fired.
    Rest,
    /// Keyboard selection or `Escape` on the open tooltip.
    SelectWithKeyboard,
    /// Pointer moved somewhere in the document outside the trigger.
    GlobalMouseMove,
    /// The linger timer fired.
    TimeComplete,
}

impl MachineEvent {
    /// Every event.
    pub const ALL: [MachineEvent; 10] = [
        MachineEvent::MouseEnter,
        MachineEvent::MouseMove,
        MachineEvent::MouseLeave,
        MachineEvent::MouseDown,
        MachineEvent::Focus,
        MachineEvent::Blur,
        MachineEvent::Rest,
        MachineEvent::SelectWithKeyboard,
        MachineEvent::GlobalMouseMove,
        MachineEvent::TimeComplete,
    ];
}

/// The transition table as data: `(from, event, to)`.
pub const TRANSITIONS: &[(State, MachineEvent, State)] = &[
    (State::Idle, MachineEvent::MouseEnter, State::Focused),
    (State::Idle, MachineEvent::Focus, State::Visible),
    (State::Focused, MachineEvent::MouseMove, State::Focused),
    (State::Focused, MachineEvent::MouseLeave, State::Idle),
    (State::Focused, MachineEvent::MouseDown, State::Dismissed),
    (State::Focused, MachineEvent::Blur, State::Idle),
    (State::Focused, MachineEvent::Rest, State::Visible),
    (State::Visible, MachineEvent::Focus, State::Focused),
    (State::Visible, MachineEvent::MouseEnter, State::Focused),
    (State::Visible, MachineEvent::MouseLeave, State::LeavingVisible),
    (State::Visible, MachineEvent::Blur, State::LeavingVisible),
    (State::Visible, MachineEvent::MouseDown, State::Dismissed),
    (State::Visible, MachineEvent::SelectWithKeyboard, State::Dismissed),
    (State::Visible, MachineEvent::GlobalMouseMove, State::LeavingVisible),
    (State::LeavingVisible, MachineEvent::MouseEnter, State::Visible),
    (State::LeavingVisible, MachineEvent::Focus, State::Visible),
    (State::LeavingVisible, MachineEvent::TimeComplete, State::Idle),
    (State::Dismissed, MachineEvent::MouseLeave, State::Idle),
    (State::Dismissed, MachineEvent::Blur, State::Idle),
];

/// Target of the edge labeled `event` leaving `state`, if one exists.
#[must_use]
pub const fn next_state(state: State, event: MachineEvent) -> Option<State> {
    use MachineEvent as E;
    use State as S;

    match (state, event) {
        (S::Idle, E::MouseEnter) => Some(S::Focused),
        (S::Idle, E::Focus) => Some(S::Visible),

        (S::Focused, E::MouseMove) => Some(S::Focused),
        (S::Focused, E::MouseLeave | E::Blur) => Some(S::Idle),
        (S::Focused, E::MouseDown) => Some(S::Dismissed),
        (S::Focused, E::Rest) => Some(S::Visible),

        (S::Visible, E::Focus | E::MouseEnter) => Some(S::Focused),
        (S::Visible, E::MouseLeave | E::Blur | E::GlobalMouseMove) => Some(S::LeavingVisible),
        (S::Visible, E::MouseDown | E::SelectWithKeyboard) => Some(S::Dismissed),

        (S::LeavingVisible, E::MouseEnter | E::Focus) => Some(S::Visible),
        (S::LeavingVisible, E::TimeComplete) => Some(S::Idle),

        (S::Dismissed, E::MouseLeave | E::Blur) => Some(S::Idle),

        _ => None,
    }
}

/// Auxiliary data: which trigger the current state pertains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Context {
    pub active_trigger: Option<TriggerId>,
}

/// State and context as seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Snapshot {
    pub state: State,
    pub context: Context,
}

impl Snapshot {
    /// Whether `id`'s tooltip should currently render.
    #[inline]
    #[must_use]
    pub fn is_visible_for(&self, id: TriggerId) -> bool {
        self.context.active_trigger == Some(id) && self.state.shows_tooltip()
    }
}

/// Record of one taken edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: State,
    pub to: State,
    pub event: MachineEvent,
    /// Self-loop: context swapped, hooks skipped.
    pub internal: bool,
    /// Timer armed by the enter hook, if any.
    pub armed: Option<TimerKind>,
}

/// Internal state tag that owns the timer its enter hook armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Focused { rest: TimerHandle },
    Visible,
    LeavingVisible { linger: TimerHandle },
    Dismissed,
}

impl Phase {
    const fn state(self) -> State {
        match self {
            Phase::Idle => State::Idle,
            Phase::Focused { .. } => State::Focused,
            Phase::Visible => State::Visible,
            Phase::LeavingVisible { .. } => State::LeavingVisible,
            Phase::Dismissed => State::Dismissed,
        }
    }
}

/// The tooltip state machine with its context and timers.
#[derive(Debug)]
pub struct Machine {
    phase: Phase,
    context: Context,
    timers: TimerQueue,
    rest_delay: Duration,
    linger_delay: Duration,
    taken: u64,
}

impl Machine {
    /// Create an idle machine using the delays from `config`.
    #[must_use]
    pub fn new(config: &TooltipConfig) -> Self {
        Self {
            phase: Phase::Idle,
            context: Context::default(),
            timers: TimerQueue::new(),
            rest_delay: config.rest_delay,
            linger_delay: config.linger_delay,
            taken: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> State {
        self.phase.state()
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> Context {
        self.context
    }

    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state(),
            context: self.context,
        }
    }

    /// Pending timers, for inspection.
    #[inline]
    #[must_use]
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Earliest pending timer deadline.
    #[inline]
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Number of edges taken since creation.
    #[inline]
    #[must_use]
    pub fn transitions_taken(&self) -> u64 {
        self.taken
    }

    /// Follow the edge labeled `event`, if the current state has one.
    ///
    /// `new_context` replaces the active trigger between the leave and enter
    /// hooks. `now` anchors the deadline of any timer the enter hook arms.
    pub fn transition(
        &mut self,
        event: MachineEvent,
        new_context: Option<TriggerId>,
        now: Duration,
    ) -> Option<Transition> {
        let from = self.state();
        let to = next_state(from, event)?;
        self.taken += 1;

        if to == from {
            if let Some(id) = new_context {
                self.context.active_trigger = Some(id);
            }
            return Some(Transition {
                from,
                to,
                event,
                internal: true,
                armed: None,
            });
        }

        self.leave();
        if let Some(id) = new_context {
            self.context.active_trigger = Some(id);
        }
        let armed = self.enter(to, now);

        Some(Transition {
            from,
            to,
            event,
            internal: false,
            armed,
        })
    }

    /// Like [`transition`](Self::transition), but only when `id` is the
    /// active trigger. Used for exit events that must not cancel a tooltip
    /// another trigger has since taken over.
    pub fn transition_if_active(
        &mut self,
        event: MachineEvent,
        id: TriggerId,
        now: Duration,
    ) -> Option<Transition> {
        if self.context.active_trigger != Some(id) {
            tracing::trace!(?event, trigger = %id, "ignored: trigger is not active");
            return None;
        }
        self.transition(event, None, now)
    }

    /// Fire every timer due at `now`, in deadline order.
    ///
    /// Each fired timer becomes a `Rest` or `TimeComplete` transition; the
    /// snapshot after each one is returned so callers can notify in order.
    pub fn expire(&mut self, now: Duration) -> Vec<(Transition, Snapshot)> {
        let mut fired = Vec::new();
        while let Some((handle, kind)) = self.timers.pop_due(now) {
            let event = match (kind, self.phase) {
                (TimerKind::Rest, Phase::Focused { rest }) if rest == handle => MachineEvent::Rest,
                (TimerKind::Linger, Phase::LeavingVisible { linger }) if linger == handle => {
                    MachineEvent::TimeComplete
                }
                _ => {
                    tracing::warn!(?kind, state = %self.state(), "timer fired outside its owning state");
                    continue;
                }
            };
            if let Some(transition) = self.transition(event, None, now) {
                fired.push((transition, self.snapshot()));
            }
        }
        fired
    }

    fn leave(&mut self) {
        match self.phase {
            Phase::Focused { rest } => {
                self.timers.cancel(rest);
            }
            Phase::LeavingVisible { linger } => {
                self.timers.cancel(linger);
                self.context.active_trigger = None;
            }
            Phase::Dismissed => {
                self.context.active_trigger = None;
            }
            Phase::Idle | Phase::Visible => {}
        }
    }

    fn enter(&mut self, to: State, now: Duration) -> Option<TimerKind> {
        // Only the entered state may own a timer.
        self.timers.cancel_all();

        let (phase, armed) = match to {
            State::Idle => {
                self.context.active_trigger = None;
                (Phase::Idle, None)
            }
            State::Focused => {
                let rest = self
                    .timers
                    .start(TimerKind::Rest, now.saturating_add(self.rest_delay));
                (Phase::Focused { rest }, Some(TimerKind::Rest))
            }
            State::Visible => (Phase::Visible, None),
            State::LeavingVisible => {
                let linger = self
                    .timers
                    .start(TimerKind::Linger, now.saturating_add(self.linger_delay));
                (Phase::LeavingVisible { linger }, Some(TimerKind::Linger))
            }
            State::Dismissed => (Phase::Dismissed, None),
        };
        self.phase = phase;
        armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: TriggerId = TriggerId::from_raw(1);
    const T2: TriggerId = TriggerId::from_raw(2);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn machine() -> Machine {
        Machine::new(&TooltipConfig::default())
    }

    fn visible_on(id: TriggerId) -> Machine {
        let mut m = machine();
        m.transition(MachineEvent::Focus, Some(id), ms(0));
        assert_eq!(m.state(), State::Visible);
        m
    }

    // --- Table ---

    #[test]
    fn table_and_dispatch_agree() {
        for state in State::ALL {
            for event in MachineEvent::ALL {
                let from_table = TRANSITIONS
                    .iter()
                    .find(|(s, e, _)| *s == state && *e == event)
                    .map(|(_, _, to)| *to);
                assert_eq!(
                    next_state(state, event),
                    from_table,
                    "mismatch for {state} / {event:?}"
                );
            }
        }
    }

    #[test]
    fn table_has_no_duplicate_edges() {
        for (i, (s, e, _)) in TRANSITIONS.iter().enumerate() {
            assert!(
                !TRANSITIONS[i + 1..].iter().any(|(s2, e2, _)| s2 == s && e2 == e),
                "duplicate edge {s} / {e:?}"
            );
        }
    }

    #[test]
    fn starts_idle_without_context() {
        let m = machine();
        assert_eq!(m.state(), State::Idle);
        assert_eq!(m.context().active_trigger, None);
        assert!(m.timers().is_empty());
    }

    // --- No-ops ---

    #[test]
    fn missing_edge_is_noop() {
        let mut m = machine();
        assert_eq!(m.transition(MachineEvent::MouseMove, Some(T1), ms(0)), None);
        assert_eq!(m.transition(MachineEvent::Blur, None, ms(0)), None);
        assert_eq!(m.state(), State::Idle);
        assert_eq!(m.context().active_trigger, None, "no-op must not swap context");
        assert_eq!(m.transitions_taken(), 0);
    }

    // --- Hooks ---

    #[test]
    fn entering_focused_arms_rest_timer() {
        let mut m = machine();
        let t = m.transition(MachineEvent::MouseEnter, Some(T1), ms(10)).unwrap();
        assert_eq!(t.armed, Some(TimerKind::Rest));
        assert_eq!(m.state(), State::Focused);
        assert_eq!(m.context().active_trigger, Some(T1));
        assert_eq!(m.next_deadline(), Some(ms(110)));
    }

    #[test]
    fn mousemove_self_loop_keeps_rest_timer() {
        let mut m = machine();
        m.transition(MachineEvent::MouseEnter, Some(T1), ms(0));
        let rest = m.timers().pending(TimerKind::Rest).unwrap();

        let t = m.transition(MachineEvent::MouseMove, Some(T1), ms(80)).unwrap();
        assert!(t.internal);
        assert_eq!(m.timers().pending(TimerKind::Rest), Some(rest));
        assert_eq!(m.next_deadline(), Some(ms(100)));
    }

    #[test]
    fn mousemove_self_loop_swaps_context() {
        let mut m = machine();
        m.transition(MachineEvent::MouseEnter, Some(T1), ms(0));
        m.transition(MachineEvent::MouseMove, Some(T2), ms(5));
        assert_eq!(m.context().active_trigger, Some(T2));
    }

    #[test]
    fn leaving_focused_cancels_rest_timer() {
        let mut m = machine();
        m.transition(MachineEvent::MouseEnter, Some(T1), ms(0));
        m.transition(MachineEvent::MouseLeave, None, ms(50));
        assert_eq!(m.state(), State::Idle);
        assert!(m.timers().is_empty());
        assert!(m.expire(ms(1_000)).is_empty(), "canceled rest must not fire");
    }

    #[test]
    fn rest_timer_shows_tooltip() {
        let mut m = machine();
        m.transition(MachineEvent::MouseEnter, Some(T1), ms(0));
        assert!(m.expire(ms(99)).is_empty());
        let fired = m.expire(ms(100));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0.event, MachineEvent::Rest);
        assert_eq!(fired[0].1.state, State::Visible);
        assert!(fired[0].1.is_visible_for(T1));
    }

    #[test]
    fn focus_from_idle_is_immediate() {
        let m = visible_on(T1);
        assert_eq!(m.context().active_trigger, Some(T1));
        assert!(m.timers().is_empty());
    }

    #[test]
    fn leaving_visible_arms_linger_and_keeps_context() {
        let mut m = visible_on(T1);
        let t = m.transition(MachineEvent::MouseLeave, None, ms(20)).unwrap();
        assert_eq!(t.armed, Some(TimerKind::Linger));
        assert_eq!(m.state(), State::LeavingVisible);
        assert_eq!(m.context().active_trigger, Some(T1));
        assert!(m.snapshot().is_visible_for(T1));
        assert_eq!(m.next_deadline(), Some(ms(520)));
    }

    #[test]
    fn linger_expiry_returns_to_idle() {
        let mut m = visible_on(T1);
        m.transition(MachineEvent::Blur, None, ms(0));
        let fired = m.expire(ms(500));
        assert_eq!(fired[0].0.event, MachineEvent::TimeComplete);
        assert_eq!(m.state(), State::Idle);
        assert_eq!(m.context().active_trigger, None);
    }

    #[test]
    fn reentering_during_linger_cancels_hide() {
        let mut m = visible_on(T1);
        m.transition(MachineEvent::MouseLeave, None, ms(0));
        m.transition(MachineEvent::MouseEnter, Some(T1), ms(200));
        assert_eq!(m.state(), State::Visible);
        assert!(m.timers().is_empty());
        assert!(m.expire(ms(10_000)).is_empty());
        assert_eq!(m.state(), State::Visible);
    }

    #[test]
    fn leaving_visible_without_new_context_clears_it() {
        // LeavingVisible's leave hook clears context; TimeComplete carries none.
        let mut m = visible_on(T1);
        m.transition(MachineEvent::GlobalMouseMove, None, ms(0));
        m.expire(ms(500));
        assert_eq!(m.context().active_trigger, None);
    }

    #[test]
    fn dismissed_blocks_reactivation_until_disengaged() {
        let mut m = visible_on(T1);
        m.transition(MachineEvent::MouseDown, None, ms(0));
        assert_eq!(m.state(), State::Dismissed);

        assert_eq!(m.transition(MachineEvent::MouseMove, Some(T1), ms(1)), None);
        assert_eq!(m.transition(MachineEvent::Focus, Some(T1), ms(2)), None);
        assert_eq!(m.transition(MachineEvent::SelectWithKeyboard, None, ms(3)), None);
        assert_eq!(m.state(), State::Dismissed);

        m.transition(MachineEvent::MouseLeave, None, ms(4));
        assert_eq!(m.state(), State::Idle);
        assert_eq!(m.context().active_trigger, None);
    }

    #[test]
    fn mousedown_while_focused_dismisses() {
        let mut m = machine();
        m.transition(MachineEvent::MouseEnter, Some(T1), ms(0));
        m.transition(MachineEvent::MouseDown, None, ms(10));
        assert_eq!(m.state(), State::Dismissed);
        assert!(m.timers().is_empty());
    }

    #[test]
    fn entering_another_trigger_while_visible_waits_for_rest() {
        let mut m = visible_on(T1);
        m.transition(MachineEvent::MouseEnter, Some(T2), ms(0));
        assert_eq!(m.state(), State::Focused);
        assert_eq!(m.context().active_trigger, Some(T2));
        assert!(!m.snapshot().is_visible_for(T1));
        assert!(!m.snapshot().is_visible_for(T2));
        m.expire(ms(100));
        assert!(m.snapshot().is_visible_for(T2));
    }

    // --- Guarded exits ---

    #[test]
    fn guarded_exit_ignored_for_inactive_trigger() {
        let mut m = machine();
        m.transition(MachineEvent::MouseEnter, Some(T1), ms(0));
        m.transition(MachineEvent::MouseMove, Some(T2), ms(1));
        assert_eq!(m.transition_if_active(MachineEvent::Blur, T1, ms(2)), None);
        assert_eq!(m.state(), State::Focused);
        assert!(m.transition_if_active(MachineEvent::Blur, T2, ms(3)).is_some());
        assert_eq!(m.state(), State::Idle);
    }

    // --- Invariants ---

    #[test]
    fn timers_only_pending_in_owning_states() {
        let mut m = machine();
        let script = [
            (MachineEvent::MouseEnter, Some(T1)),
            (MachineEvent::MouseMove, Some(T1)),
            (MachineEvent::Rest, None),
            (MachineEvent::MouseLeave, None),
            (MachineEvent::Focus, Some(T2)),
            (MachineEvent::Blur, None),
            (MachineEvent::TimeComplete, None),
        ];
        for (i, (event, ctx)) in script.into_iter().enumerate() {
            m.transition(event, ctx, ms(i as u64));
            let rest = m.timers().pending(TimerKind::Rest).is_some();
            let linger = m.timers().pending(TimerKind::Linger).is_some();
            assert_eq!(rest, m.state() == State::Focused, "rest timer in {}", m.state());
            assert_eq!(linger, m.state() == State::LeavingVisible, "linger timer in {}", m.state());
        }
    }

    #[test]
    fn custom_delays_are_honored() {
        let config = TooltipConfig::default()
            .rest_delay(ms(30))
            .linger_delay(ms(70));
        let mut m = Machine::new(&config);
        m.transition(MachineEvent::MouseEnter, Some(T1), ms(0));
        assert_eq!(m.next_deadline(), Some(ms(30)));
        m.expire(ms(30));
        m.transition(MachineEvent::MouseLeave, None, ms(40));
        assert_eq!(m.next_deadline(), Some(ms(110)));
    }

    #[test]
    fn state_names_are_stable() {
        assert_eq!(State::LeavingVisible.to_string(), "leaving_visible");
        assert_eq!(State::default(), State::Idle);
        assert!(State::Visible.shows_tooltip());
        assert!(State::LeavingVisible.shows_tooltip());
        assert!(!State::Focused.shows_tooltip());
    }
}
