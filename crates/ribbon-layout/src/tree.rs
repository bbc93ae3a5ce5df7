#![forbid(unsafe_code)]

//! Arena-backed component tree with upward dirty propagation.
//!
//! # Invariants
//!
//! 1. Every child's `parent` points back at the node listing it.
//! 2. A dirty node's ancestors are dirty too: [`ComponentTree::invalidate`]
//!    walks to the root, so a clean parent implies a clean rendered subtree.
//! 3. A node in the `Uninitialized` state is resolved before any operation
//!    reads its children.
//! 4. Freed slots are recycled through a free list.
//!
//! # Failure Modes
//!
//! - Invalid insertions (kind not allowed, fixed section arity, popup layout
//!   already holding its control) are refused before any mutation.
//! - A delayed-init builder that reaches back into its own node yields
//!   [`LayoutError::InitReentered`].

use crate::component::{
    ComponentKind, ComponentNode, ElementHandle, InitState, InitStatus, NodeData, NodeId,
};
use crate::error::{LayoutError, Result};
use crate::group::POPUP_LAYOUT_TITLE;
use crate::refresh::RefreshStats;

/// Owner of every component node.
#[derive(Debug, Default)]
pub struct ComponentTree {
    nodes: Vec<Option<ComponentNode>>,
    free_list: Vec<u32>,
    pub(crate) stats: RefreshStats,
    pub(crate) force_full: bool,
}

impl ComponentTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn alloc(&mut self, node: ComponentNode) -> NodeId {
        if let Some(slot) = self.free_list.pop() {
            self.nodes[slot as usize] = Some(node);
            NodeId::from_raw(slot)
        } else {
            let id = NodeId::from_raw(self.nodes.len() as u32);
            self.nodes.push(Some(node));
            id
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ComponentNode> {
        self.nodes.get(id.raw() as usize).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut ComponentNode> {
        self.nodes.get_mut(id.raw() as usize).and_then(Option::as_mut)
    }

    /// Node or [`LayoutError::NodeNotFound`].
    pub fn get(&self, id: NodeId) -> Result<&ComponentNode> {
        self.node(id).ok_or(LayoutError::NodeNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut ComponentNode> {
        self.node_mut(id).ok_or(LayoutError::NodeNotFound(id))
    }

    pub fn kind(&self, id: NodeId) -> Result<ComponentKind> {
        Ok(self.get(id)?.kind())
    }

    /// Fail with [`LayoutError::WrongKind`] unless `id` is `expected`.
    pub fn expect_kind(&self, id: NodeId, expected: ComponentKind) -> Result<&ComponentNode> {
        let node = self.get(id)?;
        if node.kind() == expected {
            Ok(node)
        } else {
            Err(LayoutError::WrongKind {
                id,
                expected,
                found: node.kind(),
            })
        }
    }

    /// Loaded children of `id` (empty for missing nodes).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], ComponentNode::children)
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(ComponentNode::parent)
    }

    /// Topmost ancestor of `id`.
    #[must_use]
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Children of `id` with the given kind, resolving delayed init first.
    pub fn children_of_kind(&mut self, id: NodeId, kind: ComponentKind) -> Result<Vec<NodeId>> {
        self.ensure_ready(id)?;
        Ok(self
            .children(id)
            .iter()
            .copied()
            .filter(|c| self.node(*c).is_some_and(|n| n.kind() == kind))
            .collect())
    }

    /// First child of `parent` with the given kind and title.
    pub fn find_child_by_title(
        &mut self,
        parent: NodeId,
        kind: ComponentKind,
        title: &str,
    ) -> Result<Option<NodeId>> {
        self.ensure_ready(parent)?;
        Ok(self.children(parent).iter().copied().find(|c| {
            self.node(*c)
                .is_some_and(|n| n.kind() == kind && n.title() == title)
        }))
    }

    /// Depth-first search for a component id, resolving delayed init.
    pub fn find_component(&mut self, root: NodeId, component_id: &str) -> Result<Option<NodeId>> {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            self.ensure_ready(current)?;
            let node = self.get(current)?;
            if node.component_id() == component_id {
                return Ok(Some(current));
            }
            stack.extend(node.children().iter().rev().copied());
        }
        Ok(None)
    }

    /// Pre-order walk of already-loaded nodes under `root`.
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children().iter().rev().copied());
        }
        out
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Insert a parentless node.
    pub fn insert_root(
        &mut self,
        data: NodeData,
        component_id: impl Into<String>,
        title: impl Into<String>,
    ) -> NodeId {
        let id = self.alloc(ComponentNode::new(
            data,
            component_id.into(),
            title.into(),
            None,
        ));
        self.materialize_section_rows(id);
        id
    }

    /// Insert `data` under `parent` after validating the container rules.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        data: NodeData,
        component_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<NodeId> {
        self.resolve_for_insert(parent)?;
        let title = title.into();
        let child_kind = data.kind();
        let parent_node = self.get(parent)?;
        let parent_kind = parent_node.kind();

        if parent_kind == ComponentKind::Section {
            return Err(LayoutError::SectionArityFixed { section: parent });
        }
        if !parent_kind.allows(child_kind) {
            return Err(LayoutError::ChildNotAllowed {
                parent: parent_kind,
                child: child_kind,
            });
        }
        if parent_kind == ComponentKind::PopupLayout && !parent_node.children().is_empty() {
            return Err(LayoutError::PopupLayoutFull { layout: parent });
        }
        if child_kind == ComponentKind::PopupLayout || child_kind == ComponentKind::Menu {
            // Popup parts are created by the group itself.
            return Err(LayoutError::ChildNotAllowed {
                parent: parent_kind,
                child: child_kind,
            });
        }
        if child_kind == ComponentKind::Layout {
            if title == POPUP_LAYOUT_TITLE {
                return Err(LayoutError::PopupTitleReserved);
            }
            let duplicate = parent_node.children().iter().any(|c| {
                self.node(*c)
                    .is_some_and(|n| n.kind() == ComponentKind::Layout && n.title() == title)
            });
            if duplicate {
                return Err(LayoutError::DuplicateLayoutTitle {
                    group_id: parent_node.component_id().to_owned(),
                    title,
                });
            }
        }

        Ok(self.insert_child_unchecked(parent, data, component_id.into(), title))
    }

    /// Insert without validation. Callers uphold the container rules.
    pub(crate) fn insert_child_unchecked(
        &mut self,
        parent: NodeId,
        data: NodeData,
        component_id: String,
        title: String,
    ) -> NodeId {
        let id = self.alloc(ComponentNode::new(data, component_id, title, Some(parent)));
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        self.materialize_section_rows(id);
        self.invalidate(parent);
        id
    }

    /// Remove `child` and its subtree from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.get(parent)?;
        if parent_node.kind() == ComponentKind::Section {
            return Err(LayoutError::SectionArityFixed { section: parent });
        }
        if !parent_node.children().contains(&child) {
            return Err(LayoutError::NodeNotFound(child));
        }

        let mut doomed = vec![child];
        match &mut self.get_mut(parent)?.data {
            NodeData::Ribbon(ribbon) => {
                if ribbon.selected_tab == Some(child) {
                    ribbon.selected_tab = None;
                }
            }
            NodeData::Group(group) => {
                if group.selected == Some(child) {
                    group.selected = None;
                }
                // Popup layout and menu live and die together.
                if let Some(parts) = group.popup
                    && (parts.layout == child || parts.menu == child)
                {
                    group.popup = None;
                    if group.selected == Some(parts.layout) {
                        group.selected = None;
                    }
                    doomed = vec![parts.layout, parts.menu];
                }
            }
            _ => {}
        }

        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| !doomed.contains(c));
        }
        for id in doomed {
            self.free_subtree(id);
        }
        self.invalidate(parent);
        Ok(())
    }

    fn free_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current.raw() as usize).and_then(Option::take)
            else {
                continue;
            };
            stack.extend(node.children);
            self.free_list.push(current.raw());
        }
    }

    /// Change a node's title. Titles are visible, so a change dirties it.
    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> Result<bool> {
        let title = title.into();
        let node = self.get_mut(id)?;
        if node.title == title {
            return Ok(false);
        }
        node.title = title;
        self.invalidate(id);
        Ok(true)
    }

    // ========================================================================
    // Dirty tracking
    // ========================================================================

    /// Mark `id` dirty and every ancestor up to the root.
    pub fn invalidate(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(node) = self.node_mut(cur) else {
                break;
            };
            node.dirty = true;
            current = node.parent;
        }
    }

    /// Mark the whole subtree under `id` dirty, then bubble to the root.
    pub fn mark_dirty_recursive(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node_mut(current) {
                node.dirty = true;
                stack.extend(node.children.iter().copied());
            }
        }
        self.invalidate(id);
    }

    #[must_use]
    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(ComponentNode::is_dirty)
    }

    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<ElementHandle> {
        self.node(id).and_then(ComponentNode::element)
    }

    // ========================================================================
    // Delayed init
    // ========================================================================

    /// Defer building `id`'s children until something first needs them.
    pub fn set_delayed_init<F>(&mut self, id: NodeId, builder: F) -> Result<()>
    where
        F: FnOnce(&mut ComponentTree, NodeId) -> Result<()> + 'static,
    {
        self.get_mut(id)?.init = InitStatus::Uninitialized(Box::new(builder));
        Ok(())
    }

    pub fn init_state(&self, id: NodeId) -> Result<InitState> {
        Ok(self.get(id)?.init_state())
    }

    /// Run the pending builder of `id`, if any.
    pub fn ensure_ready(&mut self, id: NodeId) -> Result<()> {
        let node = self.get_mut(id)?;
        match std::mem::replace(&mut node.init, InitStatus::Initializing) {
            InitStatus::Ready => {
                node.init = InitStatus::Ready;
                Ok(())
            }
            InitStatus::Initializing => Err(LayoutError::InitReentered(id)),
            InitStatus::Uninitialized(builder) => {
                tracing::trace!(node = %id, "resolving delayed init");
                let result = builder(self, id);
                // The builder is spent either way.
                if let Some(node) = self.node_mut(id) {
                    node.init = InitStatus::Ready;
                }
                result?;
                self.stats.resolved += 1;
                self.mark_dirty_recursive(id);
                Ok(())
            }
        }
    }

    /// Like [`ensure_ready`](Self::ensure_ready), but a builder may add
    /// children to its own node while it runs.
    fn resolve_for_insert(&mut self, id: NodeId) -> Result<()> {
        match self.get(id)?.init {
            InitStatus::Initializing | InitStatus::Ready => Ok(()),
            InitStatus::Uninitialized(_) => self.ensure_ready(id),
        }
    }

    // ========================================================================
    // Cloning
    // ========================================================================

    /// Copy the data of `source` and its subtree under `new_parent`.
    ///
    /// Only payloads are copied; the copies have no elements and start dirty.
    pub fn clone_subtree(&mut self, source: NodeId, new_parent: NodeId) -> Result<NodeId> {
        self.ensure_ready(source)?;
        let parent_kind = self.kind(new_parent)?;
        if parent_kind == ComponentKind::Section {
            return Err(LayoutError::SectionArityFixed {
                section: new_parent,
            });
        }
        let src = self.get(source)?;
        let data = src
            .data()
            .clone_for_copy()
            .ok_or(LayoutError::NotCloneable(src.kind()))?;
        if !parent_kind.allows(data.kind()) {
            return Err(LayoutError::ChildNotAllowed {
                parent: parent_kind,
                child: data.kind(),
            });
        }
        let component_id = src.component_id().to_owned();
        let title = src.title().to_owned();
        let children = src.children().to_vec();
        let is_section = data.kind() == ComponentKind::Section;

        let copy = self.insert_child_unchecked(new_parent, data, component_id, title);
        if is_section {
            // Rows already exist; fill them pairwise.
            let rows = self.children(copy).to_vec();
            for (src_row, dst_row) in children.into_iter().zip(rows) {
                for item in self.children(src_row).to_vec() {
                    self.clone_subtree(item, dst_row)?;
                }
            }
        } else {
            for child in children {
                self.clone_subtree(child, copy)?;
            }
        }
        Ok(copy)
    }
}
