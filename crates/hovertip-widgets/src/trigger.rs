#![forbid(unsafe_code)]

//! Trigger bindings.
//!
//! A [`TriggerBinding`] attaches one trigger element to the shared
//! [`Coordinator`]. It owns the trigger's identity, keeps a local
//! visibility flag current through a subscription, and turns the trigger's
//! input into machine events:
//!
//! | Input | Machine event | Context |
//! |---|---|---|
//! | mouse enter | `MouseEnter` | this trigger |
//! | mouse move | `MouseMove` | this trigger |
//! | focus | `Focus` (skipped while focus is suppressed) | this trigger |
//! | mouse leave | `MouseLeave` | unchanged |
//! | blur | `Blur`, only if this trigger is active | unchanged |
//! | mouse down | `MouseDown`, only if this trigger is active | unchanged |
//! | `Enter` / `Space` | `SelectWithKeyboard`, only if this trigger is active | unchanged |
//!
//! The guarded rows keep a trigger that just lost focus from closing a
//! tooltip its neighbour has since opened.
//!
//! # Example
//!
//! ```
//! use hovertip_core::event::TriggerEvent;
//! use hovertip_runtime::{Coordinator, TooltipConfig};
//! use hovertip_widgets::trigger::{EventResponse, TriggerBinding, TriggerHandlers, TriggerOptions};
//!
//! let coordinator = Coordinator::new(TooltipConfig::default());
//! let binding = TriggerBinding::mount(&coordinator, TriggerOptions::default());
//! let mut handlers = binding.bind(TriggerHandlers::new());
//!
//! handlers.dispatch(&TriggerEvent::Focus);
//! assert!(binding.is_visible());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hovertip_core::event::{TriggerEvent, TriggerEventKind};
use hovertip_core::geometry::Rect;
use hovertip_core::id::TriggerId;
use hovertip_runtime::{Coordinator, MachineEvent, Subscription, TriggerMount};

use crate::measure::{Measure, RectTracker};

/// What a caller-supplied handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventResponse {
    /// Continue with the default behavior.
    #[default]
    Ignored,
    /// The handler took the event; skip the machine dispatch.
    Consumed,
}

impl EventResponse {
    #[inline]
    #[must_use]
    pub fn is_consumed(self) -> bool {
        self == EventResponse::Consumed
    }
}

/// Mount options for a [`TriggerBinding`].
#[derive(Debug, Clone, Default)]
pub struct TriggerOptions {
    /// Element id linking trigger and tooltip. Defaults to `tooltip--{n}`.
    pub id: Option<String>,
    /// Report the tooltip as visible regardless of the machine. For
    /// inspecting tooltip styling during development.
    pub always_visible: bool,
}

impl TriggerOptions {
    /// Use an explicit element id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Force the tooltip visible.
    #[must_use]
    pub fn always_visible(mut self, always: bool) -> Self {
        self.always_visible = always;
        self
    }
}

type Handler = Box<dyn FnMut(&TriggerEvent) -> EventResponse + Send>;

/// Caller-supplied handlers, at most one per event kind.
#[derive(Default)]
pub struct TriggerHandlers {
    handlers: HashMap<TriggerEventKind, Handler>,
}

impl TriggerHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handler for `kind`, replacing any previous one.
    #[must_use]
    pub fn on<F>(mut self, kind: TriggerEventKind, handler: F) -> Self
    where
        F: FnMut(&TriggerEvent) -> EventResponse + Send + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for TriggerHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerHandlers")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One mounted trigger.
///
/// Dropping the binding unsubscribes it and marks the trigger unmounted.
/// The machine is not told: if this trigger was active its tooltip stays
/// logically visible until the next event moves the machine on.
pub struct TriggerBinding {
    id: TriggerId,
    dom_id: String,
    always_visible: bool,
    visible: Arc<AtomicBool>,
    coordinator: Coordinator,
    _subscription: Subscription,
    _mount: TriggerMount,
}

impl TriggerBinding {
    /// Mount a trigger on `coordinator`.
    pub fn mount(coordinator: &Coordinator, options: TriggerOptions) -> Self {
        let id = coordinator.next_trigger_id();
        let dom_id = match options.id {
            Some(dom_id) => {
                #[cfg(debug_assertions)]
                if dom_id.trim().is_empty() {
                    hovertip_core::warn!(trigger = %id, "trigger mounted with an empty element id");
                }
                dom_id
            }
            None => id.dom_id(),
        };
        let always_visible = options.always_visible;

        let visible = Arc::new(AtomicBool::new(always_visible || coordinator.is_visible(id)));
        let subscription = {
            let visible = Arc::clone(&visible);
            coordinator.subscribe(move |snapshot| {
                visible.store(
                    always_visible || snapshot.is_visible_for(id),
                    Ordering::Release,
                );
            })
        };
        let mount = coordinator.mount_trigger(id);

        hovertip_core::debug!(trigger = %id, dom_id = %dom_id, always_visible, "trigger mounted");
        Self {
            id,
            dom_id,
            always_visible,
            visible,
            coordinator: coordinator.clone(),
            _subscription: subscription,
            _mount: mount,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TriggerId {
        self.id
    }

    /// Element id for the tooltip, used as the trigger's `aria-describedby`.
    #[must_use]
    pub fn dom_id(&self) -> &str {
        &self.dom_id
    }

    #[must_use]
    pub fn is_always_visible(&self) -> bool {
        self.always_visible
    }

    /// Whether this trigger's tooltip should currently render.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Wrap caller handlers so each event also reaches the machine.
    #[must_use]
    pub fn bind(&self, handlers: TriggerHandlers) -> BoundHandlers {
        BoundHandlers {
            id: self.id,
            coordinator: self.coordinator.clone(),
            handlers,
        }
    }

    /// Dispatch `event` with no caller handlers. Returns `true` if the
    /// machine took a transition.
    pub fn dispatch(&self, event: &TriggerEvent) -> bool {
        route(&self.coordinator, self.id, event)
    }

    /// The trigger's rectangle, measured only while the tooltip is visible.
    pub fn anchor_rect<M: Measure>(&self, tracker: &mut RectTracker<M>) -> Option<Rect> {
        tracker.set_observing(self.is_visible());
        tracker.rect()
    }
}

impl fmt::Debug for TriggerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerBinding")
            .field("id", &self.id)
            .field("dom_id", &self.dom_id)
            .field("visible", &self.is_visible())
            .finish()
    }
}

/// Caller handlers augmented with machine dispatch.
pub struct BoundHandlers {
    id: TriggerId,
    coordinator: Coordinator,
    handlers: TriggerHandlers,
}

impl BoundHandlers {
    /// Run the caller's handler for `event`, then dispatch to the machine
    /// unless the handler consumed it.
    pub fn dispatch(&mut self, event: &TriggerEvent) -> EventResponse {
        let response = self
            .handlers
            .handlers
            .get_mut(&event.kind())
            .map_or(EventResponse::Ignored, |handler| handler(event));

        if response.is_consumed() {
            hovertip_core::trace!(trigger = %self.id, kind = ?event.kind(), "event consumed by handler");
        } else {
            route(&self.coordinator, self.id, event);
        }
        response
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TriggerId {
        self.id
    }
}

impl fmt::Debug for BoundHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHandlers")
            .field("id", &self.id)
            .field("handlers", &self.handlers)
            .finish()
    }
}

fn route(coordinator: &Coordinator, id: TriggerId, event: &TriggerEvent) -> bool {
    match event {
        TriggerEvent::MouseEnter => coordinator.transition(MachineEvent::MouseEnter, Some(id)),
        TriggerEvent::MouseMove => coordinator.transition(MachineEvent::MouseMove, Some(id)),
        TriggerEvent::Focus => {
            if coordinator.is_focus_suppressed() {
                hovertip_core::trace!(trigger = %id, "focus ignored: suppressed");
                return false;
            }
            coordinator.transition(MachineEvent::Focus, Some(id))
        }
        TriggerEvent::MouseLeave => coordinator.transition(MachineEvent::MouseLeave, None),
        TriggerEvent::Blur => coordinator.transition_if_active(MachineEvent::Blur, id),
        TriggerEvent::MouseDown(_) => coordinator.transition_if_active(MachineEvent::MouseDown, id),
        TriggerEvent::Key(key) if key.is_activation() => {
            coordinator.transition_if_active(MachineEvent::SelectWithKeyboard, id)
        }
        TriggerEvent::Key(_) => false,
    }
}
