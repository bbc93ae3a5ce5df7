use thiserror::Error;

use crate::component::{ComponentKind, NodeId};
use crate::section::SectionType;

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Invariant violations and lookups that failed.
///
/// Every variant is raised before any mutation, so the tree and the scaling
/// registry are unchanged when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("scaling step field `{field}` must not be empty")]
    EmptyStepField { field: &'static str },

    #[error("no max size registered for group `{group_id}`")]
    MissingMaxSize { group_id: String },

    #[error("scaling step `{group_id}` -> `{layout_name}` is already present")]
    DuplicateStep {
        group_id: String,
        layout_name: String,
    },

    #[error("scaling step for `{group_id}` already belongs to another registry")]
    StepOwnedElsewhere { group_id: String },

    #[error("scaling step index {index} out of range (len {len})")]
    StepIndexOutOfRange { index: usize, len: usize },

    #[error("`Popup` is reserved and cannot title a layout or popup source")]
    PopupTitleReserved,

    #[error("section {section} has a fixed row arity")]
    SectionArityFixed { section: NodeId },

    #[error("{section_type:?} section holds {max} rows, got {got}")]
    SectionArityExceeded {
        section_type: SectionType,
        max: usize,
        got: usize,
    },

    #[error("popup layout {layout} already holds its control")]
    PopupLayoutFull { layout: NodeId },

    #[error("{child:?} cannot be a child of {parent:?}")]
    ChildNotAllowed {
        parent: ComponentKind,
        child: ComponentKind,
    },

    #[error("{0:?} nodes cannot be cloned")]
    NotCloneable(ComponentKind),

    #[error("group `{group_id}` has no layout titled `{title}`")]
    LayoutNotFound { group_id: String, title: String },

    #[error("group `{group_id}` already has a layout titled `{title}`")]
    DuplicateLayoutTitle { group_id: String, title: String },

    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("node {id} is a {found:?}, expected {expected:?}")]
    WrongKind {
        id: NodeId,
        expected: ComponentKind,
        found: ComponentKind,
    },

    #[error("delayed init of node {0} re-entered itself")]
    InitReentered(NodeId),
}
