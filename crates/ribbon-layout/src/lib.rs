#![forbid(unsafe_code)]

//! Component tree and scaling state machine for the ribbon engine.
//!
//! The tree owns every node in an arena and tracks which nodes need their
//! host elements rebuilt. Groups pick one layout at a time; tabs walk an
//! ordered list of scaling steps to shrink or grow their groups.
//!
//! # Role in the workspace
//! - **Pure state**: no host access beyond the [`RenderHost`] and
//!   [`Measure`] seams.
//! - **Measured by**: `ribbon-runtime`, which drives the scale search.
//!
//! # Example
//!
//! ```
//! use ribbon_layout::{ComponentTree, NodeData, RibbonData, SectionType, ScalingStep};
//!
//! let mut tree = ComponentTree::new();
//! let ribbon = tree.insert_root(NodeData::Ribbon(RibbonData::default()), "Ribbon", "");
//! let tab = tree.add_tab(ribbon, "Home", "Home").unwrap();
//! let font = tree.add_group(tab, "Font", "Font").unwrap();
//! for title in ["Large", "Small"] {
//!     let layout = tree.add_layout(font, title).unwrap();
//!     tree.add_section(layout, SectionType::TwoRow).unwrap();
//! }
//! tree.edit_scaling(tab, |s| {
//!     s.set_group_max_size("Font", "Large");
//!     s.add_scaling_step(ScalingStep::new("Font", "Small").unwrap().into_ref())
//! })
//! .unwrap()
//! .unwrap();
//!
//! tree.scale_max(tab).unwrap();
//! assert!(tree.scale_down(tab).unwrap());
//! assert_eq!(tree.selected_layout_title(font).unwrap(), Some("Small"));
//! ```

pub mod component;
pub mod definition;
pub mod error;
pub mod group;
pub mod host;
pub mod refresh;
pub mod scaling;
pub mod section;
pub mod tab;
pub mod tree;

pub use component::{
    ComponentKind, ComponentNode, ControlProps, DelayedInit, ElementHandle, InitState, NodeData,
    NodeId, NodeView, RibbonData,
};
pub use definition::{
    ControlDefinition, GroupDefinition, LayoutDefinition, RowDefinition, RowItem,
    SectionDefinition, TabDefinition,
};
pub use error::{LayoutError, Result};
pub use group::{GroupData, GroupPopupData, POPUP_LAYOUT_TITLE, PopupParts};
pub use host::{Host, Measure, RenderHost};
pub use refresh::RefreshStats;
pub use scaling::{
    MaxSizeDefinition, ScaleStepDefinition, Scaling, ScalingDefinition, ScalingId, ScalingStep,
    StepRef,
};
pub use section::SectionType;
pub use tab::{ScalePosition, TabData};
pub use tree::ComponentTree;
