#![forbid(unsafe_code)]

//! hovertip public facade crate.
//!
//! Re-exports the types an application needs to coordinate tooltips and
//! offers a prelude for day-to-day use.
//!
//! ```
//! use hovertip::prelude::*;
//!
//! let coordinator = Coordinator::new(TooltipConfig::from_env());
//! let save = TriggerBinding::mount(&coordinator, TriggerOptions::default().id("save"));
//! save.dispatch(&TriggerEvent::Focus);
//! assert_eq!(save.is_visible(), !coordinator.is_focus_suppressed());
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use hovertip_core::clock::{Clock, DeterministicClock, SystemClock};
pub use hovertip_core::event::{
    KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, TriggerEvent, TriggerEventKind,
};
pub use hovertip_core::geometry::{Offset, Position, Rect, Size};
pub use hovertip_core::id::TriggerId;

// --- Runtime re-exports ----------------------------------------------------

pub use hovertip_runtime::{
    ConfigError, Coordinator, MachineEvent, Simulator, Snapshot, State, Subscription,
    TimerDriver, TooltipConfig, TooltipPolicy,
};

// --- Widget re-exports -----------------------------------------------------

pub use hovertip_widgets::{
    AccessibleLabel, DefaultPlacement, EventResponse, MemoryLayer, OverlayLayer,
    OverlayPlacement, PlacementConfig, PlacementStrategy, RectTracker, Tooltip, TriggerBinding,
    TriggerHandlers, TriggerOptions, position_default,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for hovertip hosts.
#[derive(Debug)]
pub enum Error {
    /// Loading or validating a tooltip policy failed.
    Config(ConfigError),
    /// I/O failure, e.g. spawning the timer driver thread.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Standard result type for hovertip APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Coordinator, Error, EventResponse, KeyCode, KeyEvent, Offset, Rect, Result, Size, State,
        TimerDriver, Tooltip, TooltipConfig, TriggerBinding, TriggerEvent, TriggerEventKind,
        TriggerHandlers, TriggerOptions,
    };

    pub use crate::{core, runtime, widgets};
}

pub use hovertip_core as core;
pub use hovertip_runtime as runtime;
pub use hovertip_widgets as widgets;
