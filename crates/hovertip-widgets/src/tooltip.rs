#![forbid(unsafe_code)]

//! Tooltip overlay component.
//!
//! [`Tooltip`] turns a binding's visibility, the trigger's measured
//! rectangle, and the overlay's own measured size into calls on an
//! [`OverlayLayer`], the host's top-level layer that renders content outside
//! the normal hierarchy.
//!
//! A visible tooltip goes through two phases. Until both rectangles are
//! known it is presented as [`OverlayPlacement::Measuring`]: mounted so the
//! host can measure it, but with zero opacity and no position, so it never
//! flashes in the wrong place. Once both are known it is
//! [`OverlayPlacement::Placed`]. A trigger that never becomes measurable
//! simply stays in the measuring phase.

use std::collections::HashMap;

use hovertip_core::geometry::{Offset, Position, Rect, Size};

use crate::label::AccessibleLabel;
use crate::placement::{DefaultPlacement, PlacementStrategy};
use crate::trigger::TriggerBinding;

/// Where, if anywhere, an overlay is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayPlacement {
    /// Not mounted.
    #[default]
    Hidden,
    /// Mounted with zero opacity so it can be measured.
    Measuring,
    /// Shown at a document position.
    Placed(Position),
}

impl OverlayPlacement {
    #[must_use]
    pub fn is_mounted(self) -> bool {
        !matches!(self, OverlayPlacement::Hidden)
    }

    #[must_use]
    pub fn position(self) -> Option<Position> {
        match self {
            OverlayPlacement::Placed(position) => Some(position),
            _ => None,
        }
    }
}

/// Decide an overlay's placement from what is currently known.
pub fn resolve_placement<P: PlacementStrategy + ?Sized>(
    visible: bool,
    anchor: Option<Rect>,
    overlay: Option<Size>,
    viewport: Size,
    scroll: Offset,
    strategy: &P,
) -> OverlayPlacement {
    if !visible {
        return OverlayPlacement::Hidden;
    }
    match (anchor, overlay) {
        (Some(anchor), Some(size)) => OverlayPlacement::Placed(strategy.position(
            anchor,
            Rect::from_size(size),
            viewport,
            scroll,
        )),
        _ => OverlayPlacement::Measuring,
    }
}

/// What a tooltip asks the overlay layer to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayView {
    /// Element id; matches the trigger's `aria-describedby`.
    pub id: String,
    pub text: String,
    pub placement: OverlayPlacement,
    /// Hide the visible text from assistive technology because an
    /// announced label carries the accessible text instead.
    pub hidden_from_a11y: bool,
}

/// The host's top-level rendering layer.
pub trait OverlayLayer {
    /// Mount or update the overlay described by `view`.
    fn present(&mut self, view: &OverlayView);
    /// Unmount the overlay with element id `id`. Unknown ids are ignored.
    fn withdraw(&mut self, id: &str);
    /// Measured size of a mounted overlay, once the host has laid it out.
    fn measured_size(&self, id: &str) -> Option<Size>;
}

/// A tooltip attached to one trigger.
#[derive(Debug, Clone)]
pub struct Tooltip<P = DefaultPlacement> {
    label: String,
    aria_label: Option<String>,
    strategy: P,
}

impl Tooltip {
    /// Tooltip showing `label`, placed with [`DefaultPlacement`].
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            aria_label: None,
            strategy: DefaultPlacement::default(),
        }
    }
}

impl<P: PlacementStrategy> Tooltip<P> {
    /// Set separate text for assistive technology.
    #[must_use]
    pub fn aria_label(mut self, text: impl Into<String>) -> Self {
        self.aria_label = Some(text.into());
        self
    }

    /// Use a different placement strategy.
    #[must_use]
    pub fn placement<Q: PlacementStrategy>(self, strategy: Q) -> Tooltip<Q> {
        Tooltip {
            label: self.label,
            aria_label: self.aria_label,
            strategy,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Accessible naming for this tooltip on `binding`.
    #[must_use]
    pub fn accessibility(&self, binding: &TriggerBinding) -> AccessibleLabel {
        let label = AccessibleLabel::new(binding.dom_id(), self.label.clone());
        match &self.aria_label {
            Some(text) => label.aria_label(text.clone()),
            None => label,
        }
    }

    /// Bring `layer` in line with the binding's current visibility.
    ///
    /// `anchor` is the trigger's rectangle (see
    /// [`TriggerBinding::anchor_rect`]). Returns the placement presented.
    pub fn sync<L: OverlayLayer + ?Sized>(
        &self,
        binding: &TriggerBinding,
        anchor: Option<Rect>,
        layer: &mut L,
        viewport: Size,
        scroll: Offset,
    ) -> OverlayPlacement {
        let id = binding.dom_id();
        let placement = resolve_placement(
            binding.is_visible(),
            anchor,
            layer.measured_size(id),
            viewport,
            scroll,
            &self.strategy,
        );

        if !placement.is_mounted() {
            layer.withdraw(id);
            return placement;
        }

        let accessibility = self.accessibility(binding);
        layer.present(&OverlayView {
            id: id.to_string(),
            text: self.label.clone(),
            placement,
            hidden_from_a11y: accessibility.hides_visible_text(),
        });
        placement
    }
}

/// In-memory [`OverlayLayer`] that lays every overlay out at a fixed size.
///
/// Useful for headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayer {
    size: Option<Size>,
    mounted: HashMap<String, OverlayView>,
}

impl MemoryLayer {
    /// A layer that has not measured anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer that reports `size` for every mounted overlay.
    #[must_use]
    pub fn with_size(size: Size) -> Self {
        Self {
            size: Some(size),
            mounted: HashMap::new(),
        }
    }

    /// Start (or stop) reporting a measured size.
    pub fn set_size(&mut self, size: Option<Size>) {
        self.size = size;
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&OverlayView> {
        self.mounted.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }
}

impl OverlayLayer for MemoryLayer {
    fn present(&mut self, view: &OverlayView) {
        self.mounted.insert(view.id.clone(), view.clone());
    }

    fn withdraw(&mut self, id: &str) {
        self.mounted.remove(id);
    }

    fn measured_size(&self, id: &str) -> Option<Size> {
        self.mounted.get(id).and(self.size)
    }
}
