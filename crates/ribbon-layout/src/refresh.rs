#![forbid(unsafe_code)]

//! Bottom-up refresh and attach.
//!
//! `refresh` visits only *render children*: the selected tab of a ribbon,
//! every group of a tab, and the selected layout of a group. Menus are
//! refreshed on their own when a popup opens. A clean node is skipped along
//! with its subtree; the dirty-bubbling invariant of the tree guarantees
//! nothing dirty hides beneath it.
//!
//! # Failure Modes
//!
//! - Delayed-init errors propagate out of `refresh` and leave the partially
//!   refreshed subtree dirty.

use serde::Serialize;

use crate::component::{ElementHandle, NodeData, NodeId};
use crate::error::Result;
use crate::host::RenderHost;
use crate::tree::ComponentTree;

/// Counters accumulated across refresh and attach passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStats {
    /// Elements whose content was rebuilt.
    pub rebuilt: u64,
    /// Clean nodes skipped together with their subtree.
    pub skipped: u64,
    /// Elements created.
    pub created: u64,
    /// Elements bound from pre-rendered markup.
    pub attached: u64,
    /// Delayed-init builders run.
    pub resolved: u64,
}

impl ComponentTree {
    /// Nodes whose elements appear inside `id`'s element.
    #[must_use]
    pub fn render_children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        match node.data() {
            NodeData::Ribbon(ribbon) => ribbon.selected_tab.into_iter().collect(),
            NodeData::Group(group) => group.selected.into_iter().collect(),
            _ => node.children().to_vec(),
        }
    }

    /// Rebuild `id` and its dirty render descendants, bottom-up.
    pub fn refresh<H: RenderHost + ?Sized>(
        &mut self,
        id: NodeId,
        host: &mut H,
    ) -> Result<ElementHandle> {
        self.ensure_ready(id)?;

        let element = match self.get(id)?.element() {
            Some(element) => element,
            None => {
                let element = host.create_element(&self.get(id)?.view(id));
                let node = self.get_mut(id)?;
                node.element = Some(element);
                node.dirty = true;
                self.stats.created += 1;
                element
            }
        };

        if !self.get(id)?.is_dirty() && !self.force_full {
            self.stats.skipped += 1;
            return Ok(element);
        }

        let children = self.render_children(id);
        let mut child_elements = Vec::with_capacity(children.len());
        for child in children {
            child_elements.push(self.refresh(child, host)?);
        }

        host.rebuild(element, &self.get(id)?.view(id), &child_elements);
        self.get_mut(id)?.dirty = false;
        self.stats.rebuilt += 1;
        tracing::trace!(node = %id, children = child_elements.len(), "rebuilt");
        Ok(element)
    }

    /// Refresh `root` only if something under it changed.
    pub fn flush_if_dirty<H: RenderHost + ?Sized>(
        &mut self,
        root: NodeId,
        host: &mut H,
    ) -> Result<bool> {
        if !self.is_dirty(root) && !self.force_full {
            return Ok(false);
        }
        self.refresh(root, host)?;
        Ok(true)
    }

    /// Refresh a group's popup menu, which the normal traversal skips.
    pub fn refresh_menu<H: RenderHost + ?Sized>(
        &mut self,
        group: NodeId,
        host: &mut H,
    ) -> Result<Option<ElementHandle>> {
        let Some(parts) = self.popup_parts(group)? else {
            return Ok(None);
        };
        self.sync_group_popup(group)?;
        let element = self.refresh(parts.menu, host)?;
        Ok(Some(element))
    }

    /// Bind `id` and its render descendants to pre-rendered elements.
    ///
    /// Nodes the host cannot find stay unbound and dirty, so the next
    /// refresh creates them. Returns how many nodes were bound.
    pub fn attach<H: RenderHost + ?Sized>(&mut self, id: NodeId, host: &mut H) -> Result<usize> {
        self.ensure_ready(id)?;
        let mut bound = 0;
        if self.get(id)?.element().is_none()
            && let Some(element) = host.find_existing(&self.get(id)?.view(id))
        {
            let node = self.get_mut(id)?;
            node.element = Some(element);
            node.dirty = false;
            self.stats.attached += 1;
            bound += 1;
        }

        let children = self.render_children(id);
        for child in &children {
            bound += self.attach(*child, host)?;
        }
        if children.iter().any(|c| self.is_dirty(*c)) || self.get(id)?.element().is_none() {
            self.get_mut(id)?.dirty = true;
        }
        Ok(bound)
    }

    #[must_use]
    pub fn stats(&self) -> RefreshStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RefreshStats::default();
    }

    /// Force every refresh to rebuild regardless of dirty state.
    pub fn set_force_full(&mut self, enabled: bool) {
        self.force_full = enabled;
    }

    #[must_use]
    pub fn force_full(&self) -> bool {
        self.force_full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ControlProps, NodeView, RibbonData};
    use crate::section::SectionType;

    #[derive(Default)]
    struct CountingHost {
        next: u64,
        rebuilt: Vec<String>,
        existing: Vec<String>,
    }

    impl RenderHost for CountingHost {
        fn create_element(&mut self, _node: &NodeView<'_>) -> ElementHandle {
            self.next += 1;
            ElementHandle::new(self.next)
        }

        fn rebuild(&mut self, _: ElementHandle, node: &NodeView<'_>, _: &[ElementHandle]) {
            self.rebuilt.push(node.component_id.to_owned());
        }

        fn find_existing(&mut self, node: &NodeView<'_>) -> Option<ElementHandle> {
            if self.existing.iter().any(|c| c == node.component_id) {
                self.next += 1;
                Some(ElementHandle::new(self.next))
            } else {
                None
            }
        }

        fn set_hidden(&mut self, _: ElementHandle, _: bool) {}
    }

    fn fixture() -> (ComponentTree, NodeId, NodeId, NodeId) {
        let mut tree = ComponentTree::new();
        let root = tree.insert_root(NodeData::Ribbon(RibbonData::default()), "Ribbon", "");
        let tab = tree.add_tab(root, "Home", "Home").unwrap();
        let group = tree.add_group(tab, "Font", "Font").unwrap();
        for title in ["Large", "Small"] {
            let layout = tree.add_layout(group, title).unwrap();
            let section = tree.add_section(layout, SectionType::OneRow).unwrap();
            let row = tree.section_rows(section).unwrap()[0];
            tree.add_control(row, ControlProps::new("Font.Bold", "Bold"))
                .unwrap();
        }
        tree.select_tab(root, Some(tab)).unwrap();
        tree.select_layout(group, Some("Large"), None).unwrap();
        (tree, root, tab, group)
    }

    #[test]
    fn clean_tree_is_not_rebuilt() {
        let (mut tree, root, _, _) = fixture();
        let mut host = CountingHost::default();
        tree.refresh(root, &mut host).unwrap();
        let first = host.rebuilt.len();
        assert!(first > 0);
        assert!(!tree.flush_if_dirty(root, &mut host).unwrap());
        assert_eq!(host.rebuilt.len(), first);
    }

    #[test]
    fn unselected_layout_is_not_rendered() {
        let (mut tree, root, _, _) = fixture();
        let mut host = CountingHost::default();
        tree.refresh(root, &mut host).unwrap();
        assert!(host.rebuilt.iter().any(|c| c == "Font.Large"));
        assert!(!host.rebuilt.iter().any(|c| c == "Font.Small"));
    }

    #[test]
    fn only_dirty_path_rebuilds() {
        let (mut tree, root, _, group) = fixture();
        let mut host = CountingHost::default();
        tree.refresh(root, &mut host).unwrap();
        host.rebuilt.clear();
        tree.select_layout(group, Some("Small"), None).unwrap();
        tree.refresh(root, &mut host).unwrap();
        assert!(host.rebuilt.contains(&"Font.Small".to_owned()));
        assert!(host.rebuilt.contains(&"Font".to_owned()));
        assert!(host.rebuilt.contains(&"Ribbon".to_owned()));
        assert!(!host.rebuilt.contains(&"Font.Large".to_owned()));
    }

    #[test]
    fn force_full_rebuilds_everything() {
        let (mut tree, root, _, _) = fixture();
        let mut host = CountingHost::default();
        tree.refresh(root, &mut host).unwrap();
        let first = host.rebuilt.len();
        tree.set_force_full(true);
        tree.refresh(root, &mut host).unwrap();
        assert_eq!(host.rebuilt.len(), first * 2);
    }

    #[test]
    fn attach_binds_known_and_leaves_rest_dirty() {
        let (mut tree, root, tab, group) = fixture();
        let mut host = CountingHost {
            existing: vec!["Ribbon".into(), "Home".into()],
            ..CountingHost::default()
        };
        let bound = tree.attach(root, &mut host).unwrap();
        assert_eq!(bound, 2);
        assert!(tree.element(tab).is_some());
        assert!(tree.element(group).is_none());
        assert!(tree.is_dirty(group));
        assert!(tree.is_dirty(tab));
        assert!(tree.is_dirty(root));
        assert_eq!(tree.stats().attached, 2);
    }
}
