#![forbid(unsafe_code)]

//! Accessible naming for tooltips.
//!
//! The trigger points at its tooltip through `aria-describedby`. When the
//! text screen readers should hear differs from the visible tooltip text,
//! the visible overlay is hidden from assistive technology and the
//! accessible text is exposed through an announced element that sits off
//! screen but carries the describing id.

/// Off-screen element announced in place of the visible tooltip text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncedLabel {
    /// Matches the trigger's `aria-describedby`.
    pub id: String,
    pub text: String,
}

/// Visible and accessible text for one tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibleLabel {
    id: String,
    label: String,
    aria_label: Option<String>,
}

impl AccessibleLabel {
    /// Label with `id` as the describing element id.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let label = Self {
            id: id.into(),
            label: label.into(),
            aria_label: None,
        };
        label.check();
        label
    }

    /// Set separate text for assistive technology.
    #[must_use]
    pub fn aria_label(mut self, text: impl Into<String>) -> Self {
        self.aria_label = Some(text.into());
        self
    }

    /// Value for the trigger's `aria-describedby`.
    #[must_use]
    pub fn described_by(&self) -> &str {
        &self.id
    }

    /// Text shown in the overlay.
    #[must_use]
    pub fn visible_text(&self) -> &str {
        &self.label
    }

    /// Text a screen reader announces.
    #[must_use]
    pub fn accessible_text(&self) -> &str {
        self.aria_label.as_deref().unwrap_or(&self.label)
    }

    /// The announced element, needed only when the accessible text differs.
    #[must_use]
    pub fn announced(&self) -> Option<AnnouncedLabel> {
        match &self.aria_label {
            Some(text) if *text != self.label => Some(AnnouncedLabel {
                id: self.id.clone(),
                text: text.clone(),
            }),
            _ => None,
        }
    }

    /// Whether the visible overlay should be hidden from assistive technology.
    #[must_use]
    pub fn hides_visible_text(&self) -> bool {
        self.announced().is_some()
    }

    fn check(&self) {
        #[cfg(debug_assertions)]
        if self.label.trim().is_empty() {
            hovertip_core::warn!(id = %self.id, "tooltip label is empty");
        }
    }
}
