#![forbid(unsafe_code)]

//! Ribbon toolbar engine.
//!
//! A ribbon is a row of tabs, each holding groups of controls. Every group
//! offers several layouts from roomy to compact (and finally a single
//! popup button), and each tab carries an ordered list of scaling steps
//! that say which group shrinks next. The engine picks, for the current
//! viewport, the roomiest point in that list where everything fits, and
//! rebuilds only the host elements that changed.
//!
//! # Example
//!
//! ```
//! use ribbon::prelude::*;
//! use ribbon::layout::{
//!     ControlDefinition, GroupDefinition, LayoutDefinition, MaxSizeDefinition, RowDefinition,
//!     RowItem, ScaleStepDefinition, ScalingDefinition, SectionDefinition,
//! };
//!
//! fn layout(title: &str, section_type: SectionType) -> LayoutDefinition {
//!     let rows = (0..section_type.row_count())
//!         .map(|r| RowDefinition {
//!             items: vec![RowItem::Control(ControlDefinition {
//!                 id: format!("Home.Paste.{r}"),
//!                 label: "Paste".into(),
//!                 command: Some("Paste".into()),
//!                 width: None,
//!                 height: None,
//!             })],
//!         })
//!         .collect();
//!     LayoutDefinition {
//!         title: title.into(),
//!         sections: vec![SectionDefinition { section_type, rows }],
//!     }
//! }
//!
//! let tab = TabDefinition {
//!     id: "Home".into(),
//!     title: "Home".into(),
//!     contextual_group: None,
//!     command: None,
//!     groups: vec![GroupDefinition {
//!         id: "Home.Clipboard".into(),
//!         title: "Clipboard".into(),
//!         popup_source: None,
//!         layouts: vec![
//!             layout("Large", SectionType::OneRow),
//!             layout("Small", SectionType::ThreeRow),
//!         ],
//!     }],
//!     scaling: ScalingDefinition {
//!         max_sizes: vec![MaxSizeDefinition {
//!             group_id: "Home.Clipboard".into(),
//!             size: "Large".into(),
//!         }],
//!         steps: vec![ScaleStepDefinition {
//!             group_id: "Home.Clipboard".into(),
//!             size: "Small".into(),
//!             popup_size: None,
//!             warning_message: None,
//!         }],
//!     },
//! };
//!
//! let ribbon = Ribbon::from_definitions(RibbonConfig::default(), &[tab]).unwrap();
//! assert!(ribbon.selected_tab().is_some());
//! ```

pub use ribbon_core::event::Event;
pub use ribbon_core::geometry::{Rect, Size};
pub use ribbon_core::latch::ResizeLatch;

pub use ribbon_layout::{
    ComponentKind, ComponentTree, ElementHandle, Host, LayoutError, Measure, NodeId, NodeView,
    POPUP_LAYOUT_TITLE, RenderHost, ScalePosition, Scaling, ScalingStep, SectionType,
    TabDefinition,
};

#[cfg(feature = "runtime")]
pub use ribbon_runtime::{
    CommandHandler, Ribbon, RibbonConfig, RibbonEvent, RuntimeError, ScaleOutcome, ScaleStore,
};

pub mod prelude {
    pub use crate::{
        ComponentKind, ComponentTree, ElementHandle, Event, Host, Measure, NodeId, NodeView, Rect,
        RenderHost, SectionType, Size, TabDefinition,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{CommandHandler, Ribbon, RibbonConfig, RibbonEvent, ScaleOutcome};

    pub use crate::{core, layout};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use ribbon_core as core;
pub use ribbon_layout as layout;
#[cfg(feature = "runtime")]
pub use ribbon_runtime as runtime;
