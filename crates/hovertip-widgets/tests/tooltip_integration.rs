#![forbid(unsafe_code)]

//! Bindings, coordinator, and overlay layer working together on a
//! deterministic clock.

use std::sync::Arc;
use std::time::Duration;

use hovertip_core::clock::DeterministicClock;
use hovertip_core::event::{KeyCode, KeyEvent, MouseButton, TriggerEvent};
use hovertip_core::geometry::{Offset, Position, Rect, Size};
use hovertip_runtime::{Coordinator, State, TooltipConfig};
use hovertip_widgets::{
    MemoryLayer, OverlayPlacement, RectTracker, Tooltip, TriggerBinding, TriggerOptions,
};

const VIEWPORT: Size = Size {
    width: 800,
    height: 600,
};

struct Harness {
    clock: DeterministicClock,
    coordinator: Coordinator,
}

impl Harness {
    fn new() -> Self {
        let clock = DeterministicClock::new();
        let coordinator = Coordinator::with_clock(TooltipConfig::default(), Arc::new(clock.clone()));
        Self { clock, coordinator }
    }

    fn mount(&self) -> TriggerBinding {
        TriggerBinding::mount(&self.coordinator, TriggerOptions::default())
    }

    fn advance(&self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
        self.coordinator.fire_due_timers();
    }
}

#[test]
fn hover_shows_after_rest_and_places_overlay() {
    let h = Harness::new();
    let binding = h.mount();
    let tooltip = Tooltip::new("Bold");
    let mut layer = MemoryLayer::with_size(Size::new(80, 24));
    let mut tracker = RectTracker::new(|| Some(Rect::new(40, 60, 32, 32)));

    binding.dispatch(&TriggerEvent::MouseEnter);
    binding.dispatch(&TriggerEvent::MouseMove);
    h.advance(60);
    binding.dispatch(&TriggerEvent::MouseMove);
    assert!(!binding.is_visible());
    assert_eq!(binding.anchor_rect(&mut tracker), None);

    h.advance(40);
    assert!(binding.is_visible());

    let anchor = binding.anchor_rect(&mut tracker);
    tooltip.sync(&binding, anchor, &mut layer, VIEWPORT, Offset::ZERO);
    let placement = tooltip.sync(&binding, anchor, &mut layer, VIEWPORT, Offset::ZERO);
    assert_eq!(placement, OverlayPlacement::Placed(Position::new(40, 100)));
}

#[test]
fn moving_between_adjacent_triggers() {
    let h = Harness::new();
    let left = h.mount();
    let right = h.mount();

    left.dispatch(&TriggerEvent::MouseEnter);
    h.advance(100);
    assert!(left.is_visible());

    // Browser order: leave the first, then enter the second.
    left.dispatch(&TriggerEvent::MouseLeave);
    assert!(left.is_visible(), "lingering");
    right.dispatch(&TriggerEvent::MouseEnter);
    assert!(right.is_visible(), "linger grace re-entry keeps a tooltip open");
    assert!(!left.is_visible());
    assert_eq!(h.coordinator.active_trigger(), Some(right.id()));

    h.advance(1_000);
    assert!(right.is_visible());
}

#[test]
fn focus_race_between_neighbours() {
    let h = Harness::new();
    let a = h.mount();
    let b = h.mount();

    a.dispatch(&TriggerEvent::Focus);
    assert!(a.is_visible());

    // Focus moves to b before a's blur is delivered.
    b.dispatch(&TriggerEvent::Focus);
    a.dispatch(&TriggerEvent::Blur);
    a.dispatch(&TriggerEvent::MouseDown(MouseButton::Left));
    assert_eq!(h.coordinator.state(), State::Focused);
    assert_eq!(h.coordinator.active_trigger(), Some(b.id()));

    h.advance(100);
    assert!(b.is_visible());
    assert!(!a.is_visible());
}

#[test]
fn escape_dismisses_until_disengaged() {
    let h = Harness::new();
    let binding = h.mount();
    let escape = KeyEvent::new(KeyCode::Escape);

    binding.dispatch(&TriggerEvent::Focus);
    assert!(h.coordinator.handle_key(&escape));
    assert!(!binding.is_visible());

    binding.dispatch(&TriggerEvent::MouseMove);
    binding.dispatch(&TriggerEvent::Focus);
    assert!(!binding.is_visible(), "dismissed state holds");

    binding.dispatch(&TriggerEvent::Blur);
    binding.dispatch(&TriggerEvent::Focus);
    assert!(binding.is_visible());
}

#[test]
fn unmounted_active_trigger_ignores_escape() {
    let h = Harness::new();
    let binding = h.mount();
    binding.dispatch(&TriggerEvent::Focus);
    let id = binding.id();
    drop(binding);

    // The machine still reports the tooltip; nobody is left to show it.
    assert!(h.coordinator.is_visible(id));
    assert!(!h.coordinator.handle_key(&KeyEvent::new(KeyCode::Escape)));
    assert_eq!(h.coordinator.state(), State::Visible);

    let other = h.mount();
    other.dispatch(&TriggerEvent::MouseEnter);
    h.advance(100);
    assert!(other.is_visible());
    assert!(!h.coordinator.is_visible(id));
}

#[test]
fn suppression_can_be_toggled_at_runtime() {
    let h = Harness::new();
    let binding = h.mount();

    h.coordinator.set_focus_suppressed(true);
    binding.dispatch(&TriggerEvent::Focus);
    assert!(!binding.is_visible());

    h.coordinator.set_focus_suppressed(false);
    binding.dispatch(&TriggerEvent::Focus);
    assert!(binding.is_visible());
}

#[test]
fn pointer_leaving_to_document_starts_grace() {
    let h = Harness::new();
    let binding = h.mount();
    let tooltip = Tooltip::new("Info");
    let mut layer = MemoryLayer::with_size(Size::new(10, 10));

    binding.dispatch(&TriggerEvent::Focus);
    h.coordinator.pointer_moved_outside();
    h.advance(499);
    assert!(binding.is_visible());
    assert!(
        tooltip
            .sync(&binding, Some(Rect::new(0, 0, 5, 5)), &mut layer, VIEWPORT, Offset::ZERO)
            .is_mounted()
    );

    h.advance(1);
    assert!(!binding.is_visible());
    assert_eq!(
        tooltip.sync(&binding, Some(Rect::new(0, 0, 5, 5)), &mut layer, VIEWPORT, Offset::ZERO),
        OverlayPlacement::Hidden
    );
    assert!(layer.is_empty());
}
