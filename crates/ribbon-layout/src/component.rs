#![forbid(unsafe_code)]

//! Node identity, kinds, and per-node payloads.
//!
//! Container rules are data: [`ComponentKind::allowed_children`] is a static
//! table consulted on every insertion, so no runtime type probing is needed
//! to tell a popup layout from a regular one.

use std::fmt;

use ribbon_core::geometry::Size;
use serde::{Deserialize, Serialize};

use crate::group::{GroupData, GroupPopupData};
use crate::section::SectionType;
use crate::tab::TabData;
use crate::tree::ComponentTree;

// ============================================================================
// NodeId / ElementHandle
// ============================================================================

/// Handle into a [`ComponentTree`].
///
/// Slots are recycled after removal, so a stale id may address a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a NodeId from a raw u32 index.
    #[must_use]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw u32 index.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Opaque handle to an element owned by the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(u64);

impl ElementHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

// ============================================================================
// ComponentKind
// ============================================================================

/// Closed set of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Ribbon,
    Tab,
    Group,
    Layout,
    /// Single-control layout shown when a group collapses into a flyout.
    PopupLayout,
    Section,
    Row,
    Strip,
    Control,
    /// Flyout menu owned by a group; outside the normal refresh traversal.
    Menu,
    /// Menu content holding a data clone of the popup-source layout.
    GroupPopup,
}

impl ComponentKind {
    /// Kinds that may be inserted directly under this kind.
    #[must_use]
    pub const fn allowed_children(self) -> &'static [ComponentKind] {
        use ComponentKind::*;
        match self {
            Ribbon => &[Tab],
            Tab => &[Group],
            Group => &[Layout, PopupLayout, Menu],
            Layout | GroupPopup => &[Section],
            PopupLayout => &[Control],
            Section => &[Row],
            Row => &[Strip, Control],
            Strip => &[Control],
            Menu => &[GroupPopup],
            Control => &[],
        }
    }

    /// Whether `child` may be inserted under this kind.
    #[must_use]
    pub fn allows(self, child: ComponentKind) -> bool {
        self.allowed_children().contains(&child)
    }

    /// Stable lowercase name for logs and snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ribbon => "ribbon",
            Self::Tab => "tab",
            Self::Group => "group",
            Self::Layout => "layout",
            Self::PopupLayout => "popup_layout",
            Self::Section => "section",
            Self::Row => "row",
            Self::Strip => "strip",
            Self::Control => "control",
            Self::Menu => "menu",
            Self::GroupPopup => "group_popup",
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Visible properties of a leaf control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlProps {
    /// Stable id shared by every copy of this control across layouts.
    pub control_id: String,
    pub label: String,
    pub command_id: Option<String>,
    pub enabled: bool,
    /// Preferred size forwarded to the host; `None` lets the host decide.
    pub size_hint: Option<Size>,
}

impl ControlProps {
    #[must_use]
    pub fn new(control_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            label: label.into(),
            command_id: None,
            enabled: true,
            size_hint: None,
        }
    }

    #[must_use]
    pub fn command(mut self, command_id: impl Into<String>) -> Self {
        self.command_id = Some(command_id.into());
        self
    }

    #[must_use]
    pub fn size_hint(mut self, size: Size) -> Self {
        self.size_hint = Some(size);
        self
    }
}

/// Root payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RibbonData {
    pub(crate) selected_tab: Option<NodeId>,
}

impl RibbonData {
    #[must_use]
    pub fn selected_tab(&self) -> Option<NodeId> {
        self.selected_tab
    }
}

/// Typed payload carried by every node. The variant determines the kind.
#[derive(Debug)]
pub enum NodeData {
    Ribbon(RibbonData),
    Tab(Box<TabData>),
    Group(Box<GroupData>),
    Layout,
    PopupLayout,
    Section(SectionType),
    Row,
    Strip,
    Control(ControlProps),
    Menu,
    GroupPopup(GroupPopupData),
}

impl NodeData {
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Ribbon(_) => ComponentKind::Ribbon,
            Self::Tab(_) => ComponentKind::Tab,
            Self::Group(_) => ComponentKind::Group,
            Self::Layout => ComponentKind::Layout,
            Self::PopupLayout => ComponentKind::PopupLayout,
            Self::Section(_) => ComponentKind::Section,
            Self::Row => ComponentKind::Row,
            Self::Strip => ComponentKind::Strip,
            Self::Control(_) => ComponentKind::Control,
            Self::Menu => ComponentKind::Menu,
            Self::GroupPopup(_) => ComponentKind::GroupPopup,
        }
    }

    /// Copy of the payload for subtree cloning. Stateful kinds refuse.
    pub(crate) fn clone_for_copy(&self) -> Option<Self> {
        match self {
            Self::Layout => Some(Self::Layout),
            Self::Section(t) => Some(Self::Section(*t)),
            Self::Row => Some(Self::Row),
            Self::Strip => Some(Self::Strip),
            Self::Control(props) => Some(Self::Control(props.clone())),
            _ => None,
        }
    }
}

// ============================================================================
// Delayed init
// ============================================================================

/// Builder that materializes a node's children on first use.
pub type DelayedInit = Box<dyn FnOnce(&mut ComponentTree, NodeId) -> crate::Result<()>>;

pub(crate) enum InitStatus {
    Uninitialized(DelayedInit),
    Initializing,
    Ready,
}

impl fmt::Debug for InitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized(_) => "Uninitialized",
            Self::Initializing => "Initializing",
            Self::Ready => "Ready",
        })
    }
}

/// Public view of a node's init status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Initializing,
    Ready,
}

// ============================================================================
// ComponentNode
// ============================================================================

/// One node of the component tree.
#[derive(Debug)]
pub struct ComponentNode {
    pub(crate) component_id: String,
    pub(crate) title: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
    pub(crate) dirty: bool,
    pub(crate) element: Option<ElementHandle>,
    pub(crate) init: InitStatus,
}

impl ComponentNode {
    pub(crate) fn new(
        data: NodeData,
        component_id: String,
        title: String,
        parent: Option<NodeId>,
    ) -> Self {
        // New nodes start dirty (no element yet).
        Self {
            component_id,
            title,
            parent,
            children: Vec::new(),
            data,
            dirty: true,
            element: None,
            init: InitStatus::Ready,
        }
    }

    #[must_use]
    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.data.kind()
    }

    #[must_use]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn element(&self) -> Option<ElementHandle> {
        self.element
    }

    #[must_use]
    pub fn init_state(&self) -> InitState {
        match self.init {
            InitStatus::Uninitialized(_) => InitState::Uninitialized,
            InitStatus::Initializing => InitState::Initializing,
            InitStatus::Ready => InitState::Ready,
        }
    }

    /// Control payload, if this is a control.
    #[must_use]
    pub fn control(&self) -> Option<&ControlProps> {
        match &self.data {
            NodeData::Control(props) => Some(props),
            _ => None,
        }
    }

    /// Borrowed description handed to the host.
    #[must_use]
    pub fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView {
            id,
            kind: self.kind(),
            component_id: &self.component_id,
            title: &self.title,
            control: self.control(),
            section_type: match self.data {
                NodeData::Section(t) => Some(t),
                _ => None,
            },
        }
    }
}

/// What the host needs to create or rebuild an element.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    pub id: NodeId,
    pub kind: ComponentKind,
    pub component_id: &'a str,
    pub title: &'a str,
    pub control: Option<&'a ControlProps>,
    pub section_type: Option<SectionType>,
}
