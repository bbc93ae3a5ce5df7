#![forbid(unsafe_code)]

//! Input events a host feeds to the ribbon.
//!
//! All events are delivered on the UI thread. A [`Event::Resize`] may arrive
//! while a scale pass is measuring; the runtime drops those through its
//! resize latch instead of recursing.

use crate::geometry::Size;

/// A host-originated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The viewport changed size.
    Resize(Size),
    /// The user switched to the tab with this component id.
    SelectTab(String),
    /// Ribbon data was reloaded; any persisted scale decision may be stale.
    DataRefreshed,
    /// Keyboard focus moved to the control with this id.
    Focus(String),
}

impl Event {
    /// Whether handling this event requires a new scale pass.
    #[must_use]
    pub fn requires_scale(&self) -> bool {
        matches!(
            self,
            Self::Resize(_) | Self::SelectTab(_) | Self::DataRefreshed
        )
    }
}
