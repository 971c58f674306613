#![forbid(unsafe_code)]

//! Overlay placement.
//!
//! A [`PlacementStrategy`] maps the trigger rectangle, the measured overlay
//! rectangle, the viewport size, and the scroll offset to the overlay's
//! document position. Any `Fn(Rect, Rect, Size, Offset) -> Position`
//! closure is a strategy.
//!
//! [`DefaultPlacement`] puts the overlay below the trigger, left-aligned,
//! separated by a fixed gap, and makes one independent flip decision per
//! axis:
//!
//! - vertical: above instead of below when below would overflow the
//!   viewport bottom and above would not overflow the top;
//! - horizontal: right-aligned instead of left-aligned when left-aligned
//!   would overflow the right edge and right-aligned would not overflow the
//!   left edge.
//!
//! When both options on an axis collide the default stays put.

use hovertip_core::geometry::{Offset, Position, Rect, Size};

/// Computes where an overlay goes.
pub trait PlacementStrategy {
    fn position(&self, trigger: Rect, overlay: Rect, viewport: Size, scroll: Offset) -> Position;
}

impl<F> PlacementStrategy for F
where
    F: Fn(Rect, Rect, Size, Offset) -> Position,
{
    fn position(&self, trigger: Rect, overlay: Rect, viewport: Size, scroll: Offset) -> Position {
        self(trigger, overlay, viewport, scroll)
    }
}

/// Vertical side of the trigger the overlay sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Below,
    Above,
}

/// Horizontal edge the overlay aligns with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// Configuration for [`DefaultPlacement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementConfig {
    /// Gap between trigger and overlay (default: 8).
    pub offset: i32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self { offset: 8 }
    }
}

impl PlacementConfig {
    /// Set the gap between trigger and overlay.
    #[must_use]
    pub fn offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }
}

/// Below-left placement with single-step per-axis flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DefaultPlacement {
    config: PlacementConfig,
}

impl DefaultPlacement {
    #[must_use]
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> PlacementConfig {
        self.config
    }

    /// The side and alignment the overlay will use, in viewport terms.
    #[must_use]
    pub fn decide(&self, trigger: Rect, overlay: Rect, viewport: Size) -> (Side, Align) {
        let offset = self.config.offset;

        let collides_bottom =
            viewport.height < trigger.bottom().saturating_add(offset).saturating_add(overlay.height);
        let fits_above = trigger.top().saturating_sub(offset).saturating_sub(overlay.height) >= 0;
        let side = if collides_bottom && fits_above {
            Side::Above
        } else {
            Side::Below
        };

        let collides_right = viewport.width < trigger.left().saturating_add(overlay.width);
        let fits_right_aligned = trigger.right().saturating_sub(overlay.width) >= 0;
        let align = if collides_right && fits_right_aligned {
            Align::Right
        } else {
            Align::Left
        };

        (side, align)
    }
}

impl PlacementStrategy for DefaultPlacement {
    fn position(&self, trigger: Rect, overlay: Rect, viewport: Size, scroll: Offset) -> Position {
        let offset = self.config.offset;
        let (side, align) = self.decide(trigger, overlay, viewport);

        let left = match align {
            Align::Left => trigger.left(),
            Align::Right => trigger.right().saturating_sub(overlay.width),
        };
        let top = match side {
            Side::Below => trigger.bottom().saturating_add(offset),
            Side::Above => trigger.top().saturating_sub(offset).saturating_sub(overlay.height),
        };

        Position::new(left.saturating_add(scroll.x), top.saturating_add(scroll.y))
    }
}

/// [`DefaultPlacement`] with the default gap.
#[must_use]
pub fn position_default(trigger: Rect, overlay: Rect, viewport: Size, scroll: Offset) -> Position {
    DefaultPlacement::default().position(trigger, overlay, viewport, scroll)
}
