#![forbid(unsafe_code)]

//! Canonical input events delivered to tooltip triggers.
//!
//! Hosts translate their native pointer, focus, and keyboard notifications
//! into [`TriggerEvent`] values addressed at one trigger, and document-level
//! key presses into bare [`KeyEvent`]s for the coordinator.
//!
//! # Design Notes
//!
//! - `KeyEventKind` defaults to `Press` when the host cannot distinguish it
//! - `Modifiers` use bitflags for easy combination
//! - Only key presses and repeats count as activation; releases never do

use bitflags::bitflags;

/// An input event targeted at a single trigger element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// The pointer entered the trigger.
    MouseEnter,
    /// The pointer moved while over the trigger.
    MouseMove,
    /// The pointer left the trigger.
    MouseLeave,
    /// A pointer button was pressed on the trigger.
    MouseDown(MouseButton),
    /// The trigger gained keyboard focus.
    Focus,
    /// The trigger lost keyboard focus.
    Blur,
    /// A key was pressed while the trigger had focus.
    Key(KeyEvent),
}

impl TriggerEvent {
    /// The payload-free kind of this event.
    #[must_use]
    pub const fn kind(&self) -> TriggerEventKind {
        match self {
            Self::MouseEnter => TriggerEventKind::MouseEnter,
            Self::MouseMove => TriggerEventKind::MouseMove,
            Self::MouseLeave => TriggerEventKind::MouseLeave,
            Self::MouseDown(_) => TriggerEventKind::MouseDown,
            Self::Focus => TriggerEventKind::Focus,
            Self::Blur => TriggerEventKind::Blur,
            Self::Key(_) => TriggerEventKind::Key,
        }
    }
}

/// Discriminant of [`TriggerEvent`], used to key caller-supplied handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEventKind {
    MouseEnter,
    MouseMove,
    MouseLeave,
    MouseDown,
    Focus,
    Blur,
    Key,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this is a press or auto-repeat (not a release).
    #[must_use]
    pub const fn is_press(&self) -> bool {
        !matches!(self.kind, KeyEventKind::Release)
    }

    /// `Escape` pressed, the platform dismissal key.
    #[must_use]
    pub const fn is_escape(&self) -> bool {
        self.is_press() && matches!(self.code, KeyCode::Escape)
    }

    /// `Enter` or `Space` pressed, the keys that activate a focused trigger.
    #[must_use]
    pub const fn is_activation(&self) -> bool {
        self.is_press() && matches!(self.code, KeyCode::Enter | KeyCode::Char(' '))
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key. Space is `Char(' ')`.
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    /// Function key (F1-F24).
    F(u8),
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}
