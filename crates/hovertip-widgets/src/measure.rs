#![forbid(unsafe_code)]

//! Element measurement.
//!
//! The host reports element rectangles through [`Measure`]. A [`RectTracker`]
//! caches the last measurement and only measures while observing, so a
//! trigger whose tooltip is hidden costs nothing on resize or scroll.

use hovertip_core::geometry::Rect;

/// Source of an element's current rectangle in viewport coordinates.
///
/// Returns `None` when the element is not rendered or cannot be measured.
pub trait Measure {
    fn measure(&self) -> Option<Rect>;
}

impl<F> Measure for F
where
    F: Fn() -> Option<Rect>,
{
    fn measure(&self) -> Option<Rect> {
        self()
    }
}

/// Cached, switchable measurement of one element.
#[derive(Debug)]
pub struct RectTracker<M> {
    source: M,
    observing: bool,
    rect: Option<Rect>,
}

impl<M: Measure> RectTracker<M> {
    /// Create a tracker that is not yet observing.
    pub fn new(source: M) -> Self {
        Self {
            source,
            observing: false,
            rect: None,
        }
    }

    /// Start or stop observing. Starting measures immediately; stopping
    /// forgets the cached rectangle.
    pub fn set_observing(&mut self, observing: bool) {
        if observing == self.observing {
            return;
        }
        self.observing = observing;
        self.rect = if observing {
            self.source.measure()
        } else {
            None
        };
    }

    #[inline]
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Last measured rectangle, if observing and measurable.
    #[inline]
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// Re-measure after a resize or scroll. Returns `true` if the
    /// rectangle changed.
    pub fn on_layout_change(&mut self) -> bool {
        if !self.observing {
            return false;
        }
        let next = self.source.measure();
        let changed = next != self.rect;
        self.rect = next;
        changed
    }

    #[must_use]
    pub fn source(&self) -> &M {
        &self.source
    }
}
