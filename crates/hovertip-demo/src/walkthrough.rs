#![forbid(unsafe_code)]

//! A scripted interaction with a three-button toolbar.
//!
//! The same script runs on simulated time (every timer fires at its exact
//! deadline, output is reproducible) or on wall time with a
//! [`TimerDriver`] firing timers in the background.

use std::cell::Cell;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use hovertip::prelude::*;
use hovertip::widgets::Measure;
use hovertip::{MemoryLayer, OverlayPlacement, RectTracker, Simulator, TriggerId};

const VIEWPORT: Size = Size::new(320, 240);
const TOOLTIP_SIZE: Size = Size::new(96, 20);
/// Extra time waited past a deadline, so wall-clock runs are not racing the
/// driver thread.
const SLACK: Duration = Duration::from_millis(50);

/// What the user does at one step of the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Deliver an event to toolbar button `usize`.
    Trigger(usize, TriggerEvent),
    /// A key press that reached the document.
    DocumentKey(KeyEvent),
    /// The pointer moved over empty space.
    PointerOutside,
    /// Nothing; only time passes.
    Wait,
}

/// One step: wait, then act.
#[derive(Debug, Clone)]
pub struct Step {
    pub wait: Duration,
    pub action: Action,
    pub note: &'static str,
}

impl Step {
    fn new(wait: Duration, action: Action, note: &'static str) -> Self {
        Self { wait, action, note }
    }
}

/// Toolbar labels, in button order.
pub const BUTTONS: [&str; 3] = ["bold", "italic", "underline"];

/// The walkthrough script, timed against `config`'s delays.
#[must_use]
pub fn script(config: &TooltipConfig) -> Vec<Step> {
    let now = Duration::ZERO;
    let rest = config.rest_delay + SLACK;
    let linger = config.linger_delay + SLACK;
    vec![
        Step::new(now, Action::Trigger(0, TriggerEvent::MouseEnter), "pointer enters bold"),
        Step::new(rest, Action::Wait, "pointer rests on bold"),
        Step::new(now, Action::Trigger(0, TriggerEvent::MouseLeave), "pointer leaves bold"),
        Step::new(
            SLACK,
            Action::Trigger(1, TriggerEvent::MouseEnter),
            "pointer enters italic during the grace period",
        ),
        Step::new(linger, Action::Wait, "pointer stays on italic"),
        Step::new(
            now,
            Action::DocumentKey(KeyEvent::new(KeyCode::Escape)),
            "escape pressed",
        ),
        Step::new(
            now,
            Action::Trigger(2, TriggerEvent::MouseEnter),
            "pointer slides onto underline while dismissed",
        ),
        Step::new(now, Action::Trigger(1, TriggerEvent::MouseLeave), "pointer leaves italic"),
        Step::new(now, Action::Trigger(2, TriggerEvent::Focus), "tab focuses underline"),
        Step::new(
            now,
            Action::Trigger(2, TriggerEvent::Key(KeyEvent::new(KeyCode::Enter))),
            "enter activates underline",
        ),
        Step::new(now, Action::Trigger(2, TriggerEvent::Blur), "focus leaves underline"),
        Step::new(now, Action::Trigger(0, TriggerEvent::Focus), "shift-tab focuses bold"),
        Step::new(now, Action::PointerOutside, "pointer wanders off the toolbar"),
        Step::new(linger, Action::Wait, "grace period runs out"),
    ]
}

/// Observable state after one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub at: Duration,
    pub note: &'static str,
    pub state: State,
    /// Element id of the active trigger, if any.
    pub active: Option<String>,
    /// Element id and placement of every mounted overlay.
    pub overlays: Vec<(String, OverlayPlacement)>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>6}ms] {:<48} {:<16}",
            self.at.as_millis(),
            self.note,
            self.state.as_str()
        )?;
        if let Some(active) = &self.active {
            write!(f, " active={active}")?;
        }
        for (id, placement) in &self.overlays {
            match placement.position() {
                Some(p) => write!(f, " [{id} @ {},{}]", p.left, p.top)?,
                None => write!(f, " [{id} measuring]")?,
            }
        }
        Ok(())
    }
}

/// A laid-out button that counts how often it is measured.
#[derive(Debug)]
struct ButtonBox {
    rect: Rect,
    measured: Cell<u32>,
}

impl Measure for ButtonBox {
    fn measure(&self) -> Option<Rect> {
        self.measured.set(self.measured.get() + 1);
        Some(self.rect)
    }
}

struct Button {
    binding: TriggerBinding,
    tooltip: Tooltip,
    tracker: RectTracker<ButtonBox>,
}

/// The toolbar: buttons, their tooltips and the overlay layer.
pub struct Toolbar {
    coordinator: Coordinator,
    buttons: Vec<Button>,
    layer: MemoryLayer,
}

impl Toolbar {
    /// Mount the toolbar's buttons on `coordinator`.
    #[must_use]
    pub fn mount(coordinator: &Coordinator) -> Self {
        let buttons = BUTTONS
            .iter()
            .zip(0..)
            .map(|(name, i)| Button {
                binding: TriggerBinding::mount(coordinator, TriggerOptions::default().id(*name)),
                tooltip: Tooltip::new(format!("Toggle {name}")),
                tracker: RectTracker::new(ButtonBox {
                    rect: Rect::new(8 + i * 40, 8, 32, 24),
                    measured: Cell::new(0),
                }),
            })
            .collect();
        Self {
            coordinator: coordinator.clone(),
            buttons,
            layer: MemoryLayer::with_size(TOOLTIP_SIZE),
        }
    }

    /// Perform `action`. Returns `true` if the machine moved.
    pub fn act(&mut self, action: Action) -> bool {
        match action {
            Action::Trigger(index, event) => self
                .buttons
                .get(index)
                .is_some_and(|button| button.binding.dispatch(&event)),
            Action::DocumentKey(key) => self.coordinator.handle_key(&key),
            Action::PointerOutside => self.coordinator.pointer_moved_outside(),
            Action::Wait => false,
        }
    }

    /// Sync every tooltip with the layer, re-running a pass for overlays
    /// that were just mounted for measurement.
    pub fn sync(&mut self) {
        for button in &mut self.buttons {
            let anchor = button.binding.anchor_rect(&mut button.tracker);
            let mut placement = OverlayPlacement::Measuring;
            for _ in 0..2 {
                if placement != OverlayPlacement::Measuring {
                    break;
                }
                placement = button.tooltip.sync(
                    &button.binding,
                    anchor,
                    &mut self.layer,
                    VIEWPORT,
                    Offset::ZERO,
                );
            }
        }
    }

    /// How many times each button has been measured, in button order.
    #[must_use]
    pub fn measurements(&self) -> Vec<u32> {
        self.buttons
            .iter()
            .map(|button| button.tracker.source().measured.get())
            .collect()
    }

    fn dom_id(&self, id: TriggerId) -> Option<String> {
        self.buttons
            .iter()
            .find(|button| button.binding.id() == id)
            .map(|button| button.binding.dom_id().to_string())
    }

    /// Capture what is currently observable.
    #[must_use]
    pub fn frame(&self, at: Duration, note: &'static str) -> Frame {
        let snapshot = self.coordinator.snapshot();
        let overlays = self
            .buttons
            .iter()
            .filter_map(|button| {
                let id = button.binding.dom_id();
                self.layer.get(id).map(|view| (id.to_string(), view.placement))
            })
            .collect();
        Frame {
            at,
            note,
            state: snapshot.state,
            active: snapshot.context.active_trigger.and_then(|id| self.dom_id(id)),
            overlays,
        }
    }
}

/// Run the script on simulated time and return one frame per step.
#[must_use]
pub fn run_scripted(config: TooltipConfig) -> Vec<Frame> {
    let steps = script(&config);
    let sim = Simulator::new(config);
    let mut toolbar = Toolbar::mount(sim.coordinator());

    let mut frames = Vec::with_capacity(steps.len());
    for step in steps {
        sim.advance(step.wait);
        toolbar.act(step.action);
        toolbar.sync();
        frames.push(toolbar.frame(sim.now(), step.note));
    }
    frames
}

/// Run the script on wall time, reporting each frame through `on_frame`.
pub fn run_live(config: TooltipConfig, mut on_frame: impl FnMut(&Frame)) -> Result<()> {
    let steps = script(&config);
    let coordinator = Coordinator::new(config);
    let driver = TimerDriver::spawn(coordinator.clone())?;
    let mut toolbar = Toolbar::mount(&coordinator);
    let started = Instant::now();

    for step in steps {
        thread::sleep(step.wait);
        toolbar.act(step.action);
        toolbar.sync();
        on_frame(&toolbar.frame(started.elapsed(), step.note));
    }

    driver.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(frames: &[Frame]) -> Vec<State> {
        frames.iter().map(|f| f.state).collect()
    }

    #[test]
    fn scripted_walkthrough_with_default_delays() {
        let frames = run_scripted(TooltipConfig::default());
        assert_eq!(
            states(&frames),
            vec![
                State::Focused,
                State::Visible,
                State::LeavingVisible,
                State::Visible,
                State::Visible,
                State::Dismissed,
                State::Dismissed,
                State::Idle,
                State::Visible,
                State::Dismissed,
                State::Idle,
                State::Visible,
                State::LeavingVisible,
                State::Idle,
            ]
        );
    }

    #[test]
    fn only_the_active_tooltip_is_mounted() {
        let frames = run_scripted(TooltipConfig::default());
        for frame in &frames {
            assert!(frame.overlays.len() <= 1, "{frame}");
            if frame.state.shows_tooltip() {
                assert_eq!(frame.overlays.len(), 1, "{frame}");
                assert_eq!(Some(&frame.overlays[0].0), frame.active.as_ref());
                assert!(frame.overlays[0].1.position().is_some(), "{frame}");
            } else {
                assert!(frame.overlays.is_empty(), "{frame}");
            }
        }
    }

    #[test]
    fn grace_period_hands_over_to_the_next_button() {
        let frames = run_scripted(TooltipConfig::default());
        assert_eq!(frames[1].active.as_deref(), Some("bold"));
        assert_eq!(frames[3].active.as_deref(), Some("italic"));
        assert_eq!(frames[3].at, frames[2].at + SLACK);
    }

    #[test]
    fn suppressed_focus_keeps_keyboard_steps_hidden() {
        let frames = run_scripted(TooltipConfig::default().suppress_focus(true));
        // "tab focuses underline" no longer shows anything.
        assert_eq!(frames[8].state, State::Idle);
        assert!(frames[8].overlays.is_empty());
    }

    #[test]
    fn buttons_are_measured_only_when_their_tooltip_shows() {
        let config = TooltipConfig::default();
        let sim = Simulator::new(config.clone());
        let mut toolbar = Toolbar::mount(sim.coordinator());
        toolbar.sync();
        assert_eq!(toolbar.measurements(), vec![0, 0, 0]);

        for step in script(&config) {
            sim.advance(step.wait);
            toolbar.act(step.action);
            toolbar.sync();
        }
        // bold shows twice, italic and underline once each.
        assert_eq!(toolbar.measurements(), vec![2, 1, 1]);
    }

    #[test]
    fn frame_display_lists_overlays() {
        let frames = run_scripted(TooltipConfig::default());
        let line = frames[1].to_string();
        assert!(line.contains("visible"), "{line}");
        assert!(line.contains("active=bold"), "{line}");
        assert!(line.contains("[bold @ 8,40]"), "{line}");
    }
}
