#![forbid(unsafe_code)]

//! Trigger-side building blocks for hovertip.
//!
//! - [`trigger`] binds trigger elements to a shared
//!   [`Coordinator`](hovertip_runtime::Coordinator).
//! - [`placement`] positions overlays next to their trigger.
//! - [`measure`] tracks element rectangles while they matter.
//! - [`label`] wires accessible text.
//! - [`tooltip`] drives the host's overlay layer.

pub mod label;
pub mod measure;
pub mod placement;
pub mod tooltip;
pub mod trigger;

pub use label::{AccessibleLabel, AnnouncedLabel};
pub use measure::{Measure, RectTracker};
pub use placement::{
    Align, DefaultPlacement, PlacementConfig, PlacementStrategy, Side, position_default,
};
pub use tooltip::{
    MemoryLayer, OverlayLayer, OverlayPlacement, OverlayView, Tooltip, resolve_placement,
};
pub use trigger::{BoundHandlers, EventResponse, TriggerBinding, TriggerHandlers, TriggerOptions};
