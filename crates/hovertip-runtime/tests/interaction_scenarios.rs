#![forbid(unsafe_code)]

//! End-to-end interaction scenarios on simulated time.

use std::time::Duration;

use hovertip_core::event::{KeyCode, KeyEvent};
use hovertip_runtime::{MachineEvent, Simulator, State, TooltipConfig};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn hover_rest_then_show() {
    let sim = Simulator::new(TooltipConfig::default());
    let t1 = sim.coordinator().next_trigger_id();

    sim.send(MachineEvent::MouseEnter, Some(t1));
    assert_eq!(sim.state(), State::Focused);
    assert_eq!(sim.coordinator().active_trigger(), Some(t1));

    sim.advance(ms(100));
    assert_eq!(sim.state(), State::Visible);
    assert!(sim.coordinator().is_visible(t1));
}

#[test]
fn moving_to_another_trigger_waits_a_full_rest() {
    let sim = Simulator::new(TooltipConfig::default());
    let c = sim.coordinator();
    let (t1, t2) = (c.next_trigger_id(), c.next_trigger_id());

    sim.send(MachineEvent::MouseEnter, Some(t1));
    sim.advance(ms(100));
    assert!(c.is_visible(t1));

    // t1's leave arrives after t2's enter; the guard keeps it from
    // disturbing t2.
    sim.send(MachineEvent::MouseEnter, Some(t2));
    assert!(!sim.send_if_active(MachineEvent::Blur, t1));

    assert_eq!(sim.state(), State::Focused);
    assert!(!c.is_visible(t1));
    assert!(!c.is_visible(t2), "no fast path: the rest delay applies again");

    sim.advance(ms(99));
    assert!(!c.is_visible(t2));
    sim.advance(ms(1));
    assert!(c.is_visible(t2));
}

#[test]
fn leave_then_enter_neighbour_switches_without_rest() {
    let sim = Simulator::new(TooltipConfig::default());
    let c = sim.coordinator();
    let (t1, t2) = (c.next_trigger_id(), c.next_trigger_id());

    sim.send(MachineEvent::MouseEnter, Some(t1));
    sim.advance(ms(100));

    // Usual host order: the old trigger's leave, then the new one's enter.
    sim.send(MachineEvent::MouseLeave, None);
    sim.advance(ms(20));
    sim.send(MachineEvent::MouseEnter, Some(t2));

    assert_eq!(sim.state(), State::Visible);
    assert!(!c.is_visible(t1));
    assert!(c.is_visible(t2));
    assert_eq!(sim.history().last().map(|r| r.at), Some(ms(120)));

    // The linger timer was cancelled along with the leaving state.
    sim.advance(ms(1_000));
    assert!(c.is_visible(t2));
}

#[test]
fn keyboard_focus_shows_immediately() {
    let sim = Simulator::new(TooltipConfig::default());
    let t = sim.coordinator().next_trigger_id();
    assert!(sim.send(MachineEvent::Focus, Some(t)));
    assert_eq!(sim.state(), State::Visible);
    assert_eq!(sim.history()[0].at, Duration::ZERO);
}

#[test]
fn escape_dismisses_once() {
    let sim = Simulator::new(TooltipConfig::default());
    let c = sim.coordinator();
    let t = c.next_trigger_id();
    let _mount = c.mount_trigger(t);
    let escape = KeyEvent::new(KeyCode::Escape);

    sim.send(MachineEvent::Focus, Some(t));
    assert!(c.handle_key(&escape));
    assert_eq!(sim.state(), State::Dismissed);

    assert!(!c.handle_key(&escape), "no edge from Dismissed");
    assert_eq!(sim.state(), State::Dismissed);
}

#[test]
fn escape_release_is_ignored() {
    let sim = Simulator::new(TooltipConfig::default());
    let c = sim.coordinator();
    let t = c.next_trigger_id();
    let _mount = c.mount_trigger(t);
    sim.send(MachineEvent::Focus, Some(t));

    let release = KeyEvent::new(KeyCode::Escape).with_kind(hovertip_core::event::KeyEventKind::Release);
    assert!(!c.handle_key(&release));
    assert_eq!(sim.state(), State::Visible);
}

#[test]
fn leaving_then_returning_within_grace() {
    let sim = Simulator::new(TooltipConfig::default());
    let t = sim.coordinator().next_trigger_id();

    sim.send(MachineEvent::MouseEnter, Some(t));
    sim.advance(ms(100));
    sim.send(MachineEvent::MouseLeave, None);
    sim.advance(ms(300));
    assert!(sim.coordinator().is_visible(t), "still lingering");

    sim.send(MachineEvent::MouseEnter, Some(t));
    sim.advance(ms(1_000));
    assert_eq!(sim.state(), State::Visible);
    assert_eq!(
        sim.states(),
        vec![
            State::Focused,
            State::Visible,
            State::LeavingVisible,
            State::Visible
        ]
    );
}

#[test]
fn click_while_resting_dismisses_until_leave() {
    let sim = Simulator::new(TooltipConfig::default());
    let t = sim.coordinator().next_trigger_id();

    sim.send(MachineEvent::MouseEnter, Some(t));
    sim.advance(ms(50));
    sim.send_if_active(MachineEvent::MouseDown, t);
    assert_eq!(sim.state(), State::Dismissed);

    sim.advance(ms(1_000));
    sim.send(MachineEvent::MouseMove, Some(t));
    assert_eq!(sim.state(), State::Dismissed, "rest timer was canceled");

    sim.send(MachineEvent::MouseLeave, None);
    sim.send(MachineEvent::MouseEnter, Some(t));
    sim.advance(ms(100));
    assert!(sim.coordinator().is_visible(t));
}

#[test]
fn global_pointer_move_starts_grace_period() {
    let sim = Simulator::new(TooltipConfig::default());
    let c = sim.coordinator();
    let t = c.next_trigger_id();

    sim.send(MachineEvent::Focus, Some(t));
    assert!(c.pointer_moved_outside());
    assert_eq!(sim.state(), State::LeavingVisible);
    assert!(!c.pointer_moved_outside(), "no edge from LeavingVisible");

    sim.advance(ms(500));
    assert_eq!(sim.state(), State::Idle);
    assert_eq!(c.active_trigger(), None);
}

#[test]
fn custom_delays_drive_timing() {
    let config = TooltipConfig::default()
        .rest_delay(ms(20))
        .linger_delay(ms(40));
    let sim = Simulator::new(config);
    let t = sim.coordinator().next_trigger_id();

    sim.send(MachineEvent::MouseEnter, Some(t));
    sim.advance(ms(20));
    assert_eq!(sim.state(), State::Visible);
    sim.send(MachineEvent::MouseLeave, None);
    sim.advance(ms(40));
    assert_eq!(sim.state(), State::Idle);
    let at: Vec<_> = sim.history().iter().map(|r| r.at).collect();
    assert_eq!(at, vec![ms(0), ms(20), ms(20), ms(60)]);
}
