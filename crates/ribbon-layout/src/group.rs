#![forbid(unsafe_code)]

//! Groups: layout selection and the collapsed popup.
//!
//! A group shows at most one of its layouts. Selecting the reserved title
//! [`POPUP_LAYOUT_TITLE`] collapses the group into a single anchor control
//! whose menu displays a data clone of the *popup source* layout. The popup
//! parts (anchor layout, menu, menu content) are built on first use.
//!
//! # Invariants
//!
//! 1. Selecting the layout already shown changes nothing and dirties nothing.
//! 2. A newly shown layout is dirtied in full, since its elements may be
//!    stale from the last time it was visible.
//! 3. The menu content is re-cloned only when the popup source changed or
//!    was marked stale.

use ribbon_core::geometry::Rect;

use crate::component::{ComponentKind, ControlProps, NodeData, NodeId};
use crate::error::{LayoutError, Result};
use crate::host::Measure;
use crate::tree::ComponentTree;

/// Reserved layout title that selects the collapsed popup.
pub const POPUP_LAYOUT_TITLE: &str = "Popup";

/// Lazily built popup parts of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupParts {
    /// The single-control layout shown in place of the group.
    pub layout: NodeId,
    /// Control inside `layout` that opens the menu.
    pub anchor: NodeId,
    pub menu: NodeId,
    /// Menu content holding the cloned sections.
    pub content: NodeId,
}

/// Group payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupData {
    pub(crate) selected: Option<NodeId>,
    pub(crate) popup_source: Option<String>,
    pub(crate) popup: Option<PopupParts>,
}

impl GroupData {
    #[must_use]
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Explicit popup source title, if one was set.
    #[must_use]
    pub fn popup_source(&self) -> Option<&str> {
        self.popup_source.as_deref()
    }

    #[must_use]
    pub fn popup(&self) -> Option<PopupParts> {
        self.popup
    }
}

/// Payload of a popup menu's content node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPopupData {
    pub(crate) cloned_from: Option<String>,
    pub(crate) stale: bool,
}

impl GroupPopupData {
    /// Title of the layout the current content was cloned from.
    #[must_use]
    pub fn cloned_from(&self) -> Option<&str> {
        self.cloned_from.as_deref()
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale || self.cloned_from.is_none()
    }
}

impl ComponentTree {
    /// Append a group to a tab.
    pub fn add_group(
        &mut self,
        tab: NodeId,
        component_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<NodeId> {
        self.add_child(
            tab,
            NodeData::Group(Box::default()),
            component_id,
            title,
        )
    }

    /// Append a layout to a group. Its component id derives from the title.
    pub fn add_layout(&mut self, group: NodeId, title: impl Into<String>) -> Result<NodeId> {
        let title = title.into();
        let group_cid = self.get(group)?.component_id().to_owned();
        self.add_child(group, NodeData::Layout, format!("{group_cid}.{title}"), title)
    }

    /// Append a strip to a row.
    pub fn add_strip(&mut self, row: NodeId) -> Result<NodeId> {
        let index = self.children(row).len() + 1;
        let row_cid = self.get(row)?.component_id().to_owned();
        self.add_child(row, NodeData::Strip, format!("{row_cid}.St{index}"), String::new())
    }

    /// Append a control to a row or strip.
    pub fn add_control(&mut self, parent: NodeId, props: ControlProps) -> Result<NodeId> {
        let component_id = props.control_id.clone();
        let title = props.label.clone();
        self.add_child(parent, NodeData::Control(props), component_id, title)
    }

    /// Toggle a control; returns whether the state changed.
    pub fn set_control_enabled(&mut self, control: NodeId, enabled: bool) -> Result<bool> {
        let node = self.get_mut(control)?;
        let found = node.kind();
        let NodeData::Control(props) = &mut node.data else {
            return Err(LayoutError::WrongKind {
                id: control,
                expected: ComponentKind::Control,
                found,
            });
        };
        if props.enabled == enabled {
            return Ok(false);
        }
        props.enabled = enabled;
        self.invalidate(control);
        Ok(true)
    }

    pub fn group_data(&self, group: NodeId) -> Result<&GroupData> {
        match self.get(group)?.data() {
            NodeData::Group(data) => Ok(data),
            other => Err(LayoutError::WrongKind {
                id: group,
                expected: ComponentKind::Group,
                found: other.kind(),
            }),
        }
    }

    fn group_data_mut(&mut self, group: NodeId) -> Result<&mut GroupData> {
        let node = self.get_mut(group)?;
        let found = node.kind();
        match &mut node.data {
            NodeData::Group(data) => Ok(data),
            _ => Err(LayoutError::WrongKind {
                id: group,
                expected: ComponentKind::Group,
                found,
            }),
        }
    }

    fn group_popup_data_mut(&mut self, content: NodeId) -> Result<&mut GroupPopupData> {
        let node = self.get_mut(content)?;
        let found = node.kind();
        match &mut node.data {
            NodeData::GroupPopup(data) => Ok(data),
            _ => Err(LayoutError::WrongKind {
                id: content,
                expected: ComponentKind::GroupPopup,
                found,
            }),
        }
    }

    pub fn selected_layout(&self, group: NodeId) -> Result<Option<NodeId>> {
        Ok(self.group_data(group)?.selected)
    }

    /// Title of the shown layout (`Popup` when collapsed).
    pub fn selected_layout_title(&self, group: NodeId) -> Result<Option<&str>> {
        Ok(match self.group_data(group)?.selected {
            Some(layout) => Some(self.get(layout)?.title()),
            None => None,
        })
    }

    pub fn popup_parts(&self, group: NodeId) -> Result<Option<PopupParts>> {
        Ok(self.group_data(group)?.popup)
    }

    /// Layout titled `title` among the group's regular layouts.
    pub fn find_layout(&mut self, group: NodeId, title: &str) -> Result<Option<NodeId>> {
        self.group_data(group)?;
        self.find_child_by_title(group, ComponentKind::Layout, title)
    }

    /// Title the popup menu is cloned from: the explicit source, else the
    /// group's first layout.
    pub fn effective_popup_source(&mut self, group: NodeId) -> Result<Option<String>> {
        if let Some(source) = self.group_data(group)?.popup_source.clone() {
            return Ok(Some(source));
        }
        let layouts = self.children_of_kind(group, ComponentKind::Layout)?;
        Ok(layouts
            .first()
            .and_then(|l| self.node(*l))
            .map(|n| n.title().to_owned()))
    }

    /// Set the layout the popup menu shows. Returns whether it changed.
    pub fn set_popup_source(&mut self, group: NodeId, title: &str) -> Result<bool> {
        if title == POPUP_LAYOUT_TITLE {
            return Err(LayoutError::PopupTitleReserved);
        }
        let data = self.group_data_mut(group)?;
        if data.popup_source.as_deref() == Some(title) {
            return Ok(false);
        }
        data.popup_source = Some(title.to_owned());
        if let Some(parts) = data.popup {
            self.group_popup_data_mut(parts.content)?.stale = true;
            self.mark_dirty_recursive(parts.menu);
        }
        Ok(true)
    }

    /// Show `name` in `group`.
    ///
    /// `None` or an empty name deselects. The reserved `Popup` title
    /// collapses the group; a non-empty `popup_size_hint` first replaces the
    /// popup source. Returns whether the shown layout changed.
    pub fn select_layout(
        &mut self,
        group: NodeId,
        name: Option<&str>,
        popup_size_hint: Option<&str>,
    ) -> Result<bool> {
        self.ensure_ready(group)?;
        self.group_data(group)?;

        let target = match name.filter(|n| !n.is_empty()) {
            None => None,
            Some(POPUP_LAYOUT_TITLE) => {
                if let Some(hint) = popup_size_hint.filter(|h| !h.is_empty()) {
                    self.set_popup_source(group, hint)?;
                }
                Some(self.ensure_popup(group)?.layout)
            }
            Some(title) => Some(self.find_layout(group, title)?.ok_or_else(|| {
                LayoutError::LayoutNotFound {
                    group_id: self
                        .node(group)
                        .map(|n| n.component_id().to_owned())
                        .unwrap_or_default(),
                    title: title.to_owned(),
                }
            })?),
        };

        let data = self.group_data_mut(group)?;
        if data.selected == target {
            return Ok(false);
        }
        data.selected = target;
        let popup = data.popup;

        if let Some(layout) = target {
            self.mark_dirty_recursive(layout);
            if let Some(parts) = popup
                && parts.layout == layout
            {
                self.mark_dirty_recursive(parts.menu);
            }
        }
        self.invalidate(group);
        tracing::debug!(group = %group, layout = ?name, "layout selected");
        Ok(true)
    }

    fn ensure_popup(&mut self, group: NodeId) -> Result<PopupParts> {
        if let Some(parts) = self.group_data(group)?.popup {
            return Ok(parts);
        }
        let node = self.get(group)?;
        let cid = node.component_id().to_owned();
        let title = node.title().to_owned();

        let layout = self.insert_child_unchecked(
            group,
            NodeData::PopupLayout,
            format!("{cid}.Popup"),
            POPUP_LAYOUT_TITLE.to_owned(),
        );
        let anchor = self.insert_child_unchecked(
            layout,
            NodeData::Control(ControlProps::new(format!("{cid}.Popup.Anchor"), &title)),
            format!("{cid}.Popup.Anchor"),
            title.clone(),
        );
        let menu = self.insert_child_unchecked(
            group,
            NodeData::Menu,
            format!("{cid}.Popup.Menu"),
            title.clone(),
        );
        let content = self.insert_child_unchecked(
            menu,
            NodeData::GroupPopup(GroupPopupData::default()),
            format!("{cid}.Popup.Content"),
            title,
        );
        let parts = PopupParts {
            layout,
            anchor,
            menu,
            content,
        };
        self.group_data_mut(group)?.popup = Some(parts);
        tracing::trace!(group = %group, "popup parts built");
        Ok(parts)
    }

    /// Bring the menu content in line with the popup source.
    ///
    /// Returns the content node, or `None` when the group never collapsed.
    pub fn sync_group_popup(&mut self, group: NodeId) -> Result<Option<NodeId>> {
        let Some(parts) = self.group_data(group)?.popup else {
            return Ok(None);
        };
        let Some(source_title) = self.effective_popup_source(group)? else {
            return Ok(Some(parts.content));
        };
        let fresh = match self.get(parts.content)?.data() {
            NodeData::GroupPopup(data) => {
                !data.is_stale() && data.cloned_from.as_deref() == Some(source_title.as_str())
            }
            _ => false,
        };
        if fresh {
            return Ok(Some(parts.content));
        }

        let source = self.find_layout(group, &source_title)?.ok_or_else(|| {
            LayoutError::LayoutNotFound {
                group_id: self
                    .node(group)
                    .map(|n| n.component_id().to_owned())
                    .unwrap_or_default(),
                title: source_title.clone(),
            }
        })?;
        self.ensure_ready(source)?;

        for old in self.children(parts.content).to_vec() {
            self.remove_child(parts.content, old)?;
        }
        for section in self.children(source).to_vec() {
            self.clone_subtree(section, parts.content)?;
        }
        let data = self.group_popup_data_mut(parts.content)?;
        data.cloned_from = Some(source_title);
        data.stale = false;
        self.mark_dirty_recursive(parts.menu);
        Ok(Some(parts.content))
    }

    /// Whether the shown layout's box extends past the group's box.
    pub fn is_overflowing<M: Measure + ?Sized>(&self, group: NodeId, measure: &M) -> Result<bool> {
        let Some(group_box) = self.element_box(group, measure) else {
            return Ok(false);
        };
        let Some(layout) = self.group_data(group)?.selected else {
            return Ok(false);
        };
        Ok(self
            .element_box(layout, measure)
            .is_some_and(|layout_box| layout_box.exceeds(&group_box)))
    }

    /// Host box of `id`'s element, if it has one.
    pub fn element_box<M: Measure + ?Sized>(&self, id: NodeId, measure: &M) -> Option<Rect> {
        self.element(id).and_then(|el| measure.element_box(el))
    }
}
