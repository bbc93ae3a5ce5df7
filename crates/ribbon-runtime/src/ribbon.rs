#![forbid(unsafe_code)]

//! The ribbon root.
//!
//! [`Ribbon`] owns the component tree and everything that sits above a
//! single tab: which tab is selected, which contextual groups are shown,
//! the persisted scale decisions, the resize latch, focus, the open popup,
//! and a queue of [`RibbonEvent`] notifications for the host.
//!
//! # Invariants
//!
//! 1. The selected tab, if any, is enabled and its contextual group (if it
//!    has one) is visible at the time it was selected.
//! 2. At most one group popup is open, and only while that group shows its
//!    popup layout.
//! 3. Every state change a host may react to is queued exactly once.

use std::collections::VecDeque;

use ribbon_core::event::Event;
use ribbon_core::latch::ResizeLatch;
use ribbon_layout::{
    ComponentKind, ComponentTree, ElementHandle, Host, NodeData, NodeId, RenderHost, RibbonData,
    TabDefinition,
};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::commands::CommandHandler;
use crate::config::RibbonConfig;
use crate::error::{Result, RuntimeError};
use crate::scale_cache::{MemoryScaleStore, ScaleStore};
use crate::scale_search::{ScaleEvidence, ScaleOutcome};

/// Component id of the ribbon root.
pub const RIBBON_ID: &str = "Ribbon";

/// Notifications queued for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RibbonEvent {
    /// A scale pass changed the selected tab's scale index.
    ScaleOccurred { tab: String, index: i32 },
    TabSelected { tab: Option<String> },
    /// The ribbon was hidden for lack of width, or shown again.
    VisibilityChanged { hidden: bool },
    ContextualGroupChanged { group: String, visible: bool },
    PopupOpened { group: String },
    PopupClosed { group: String },
}

/// Root of a ribbon and its interaction state.
pub struct Ribbon {
    pub(crate) tree: ComponentTree,
    pub(crate) root: NodeId,
    pub(crate) config: RibbonConfig,
    pub(crate) store: Box<dyn ScaleStore>,
    visible_contextual: FxHashSet<String>,
    pub(crate) hidden: bool,
    pub(crate) latch: ResizeLatch,
    pub(crate) events: VecDeque<RibbonEvent>,
    focused_control: Option<String>,
    pub(crate) open_popup: Option<NodeId>,
    pub(crate) last_evidence: Option<ScaleEvidence>,
}

impl std::fmt::Debug for Ribbon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ribbon")
            .field("root", &self.root)
            .field("nodes", &self.tree.len())
            .field("config", &self.config)
            .field("hidden", &self.hidden)
            .field("open_popup", &self.open_popup)
            .field("focused_control", &self.focused_control)
            .finish_non_exhaustive()
    }
}

impl Ribbon {
    /// Empty ribbon with an in-memory scale cache.
    #[must_use]
    pub fn new(config: RibbonConfig) -> Self {
        Self::with_store(config, MemoryScaleStore::new())
    }

    /// Empty ribbon persisting scale decisions to `store`.
    #[must_use]
    pub fn with_store(config: RibbonConfig, store: impl ScaleStore + 'static) -> Self {
        let mut tree = ComponentTree::new();
        tree.set_force_full(config.refresh.force_full);
        let root = tree.insert_root(NodeData::Ribbon(RibbonData::default()), RIBBON_ID, RIBBON_ID);
        debug!(config = %config.to_jsonl(), "ribbon created");
        Self {
            tree,
            root,
            config,
            store: Box::new(store),
            visible_contextual: FxHashSet::default(),
            hidden: false,
            latch: ResizeLatch::new(),
            events: VecDeque::new(),
            focused_control: None,
            open_popup: None,
            last_evidence: None,
        }
    }

    /// Build every tab eagerly and select the first selectable one.
    pub fn from_definitions(config: RibbonConfig, tabs: &[TabDefinition]) -> Result<Self> {
        let mut ribbon = Self::new(config);
        for def in tabs {
            ribbon.add_tab(def)?;
        }
        if let Some(first) = ribbon.first_selectable_tab() {
            ribbon.select_node(Some(first))?;
        }
        Ok(ribbon)
    }

    pub fn add_tab(&mut self, def: &TabDefinition) -> Result<NodeId> {
        Ok(self.tree.build_tab(self.root, def)?)
    }

    /// Add a tab whose groups are built the first time it is needed.
    pub fn add_tab_lazy(&mut self, def: TabDefinition) -> Result<NodeId> {
        Ok(self.tree.build_tab_lazy(self.root, def)?)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ComponentTree {
        &mut self.tree
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn config(&self) -> &RibbonConfig {
        &self.config
    }

    /// A handle on the resize latch, for event sources that must drop
    /// resize notifications raised during a scale pass.
    #[must_use]
    pub fn latch(&self) -> ResizeLatch {
        self.latch.clone()
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Evidence of the most recent scale pass.
    #[must_use]
    pub fn last_evidence(&self) -> Option<&ScaleEvidence> {
        self.last_evidence.as_ref()
    }

    #[must_use]
    pub fn last_outcome(&self) -> Option<&ScaleOutcome> {
        self.last_evidence.as_ref().map(|e| &e.outcome)
    }

    pub fn drain_events(&mut self) -> Vec<RibbonEvent> {
        self.events.drain(..).collect()
    }

    pub(crate) fn emit(&mut self, event: RibbonEvent) {
        trace!(?event, "ribbon event");
        self.events.push_back(event);
    }

    fn component_id(&self, id: NodeId) -> String {
        self.tree
            .node(id)
            .map(|n| n.component_id().to_owned())
            .unwrap_or_default()
    }

    // ========================================================================
    // Tabs
    // ========================================================================

    /// Tab with component id `id`.
    #[must_use]
    pub fn find_tab(&self, id: &str) -> Option<NodeId> {
        self.tree.children(self.root).iter().copied().find(|t| {
            self.tree
                .node(*t)
                .is_some_and(|n| n.kind() == ComponentKind::Tab && n.component_id() == id)
        })
    }

    /// Enabled, and either not contextual or in a shown contextual group.
    #[must_use]
    pub fn is_tab_selectable(&self, tab: NodeId) -> bool {
        self.tree.tab_data(tab).is_ok_and(|data| {
            data.enabled
                && data
                    .contextual_group_id
                    .as_ref()
                    .is_none_or(|g| self.visible_contextual.contains(g))
        })
    }

    /// Tabs the host should show a header for, in order.
    #[must_use]
    pub fn visible_tabs(&self) -> Vec<NodeId> {
        self.tree
            .children(self.root)
            .iter()
            .copied()
            .filter(|t| {
                self.tree.tab_data(*t).is_ok_and(|data| {
                    data.contextual_group_id
                        .as_ref()
                        .is_none_or(|g| self.visible_contextual.contains(g))
                })
            })
            .collect()
    }

    #[must_use]
    pub fn selected_tab(&self) -> Option<NodeId> {
        self.tree.selected_tab(self.root).ok().flatten()
    }

    fn first_selectable_tab(&self) -> Option<NodeId> {
        self.tree
            .children(self.root)
            .iter()
            .copied()
            .find(|t| self.is_tab_selectable(*t))
    }

    /// Select the tab with component id `id`. Returns whether it changed.
    pub fn select_tab(&mut self, id: &str) -> Result<bool> {
        let tab = self
            .find_tab(id)
            .ok_or_else(|| RuntimeError::TabNotFound(id.to_owned()))?;
        if !self.is_tab_selectable(tab) {
            return Err(RuntimeError::TabNotSelectable(id.to_owned()));
        }
        self.select_node(Some(tab))
    }

    fn select_node(&mut self, tab: Option<NodeId>) -> Result<bool> {
        if !self.tree.select_tab(self.root, tab)? {
            return Ok(false);
        }
        let tab = tab.map(|t| self.component_id(t));
        debug!(tab = ?tab, "tab selected");
        self.emit(RibbonEvent::TabSelected { tab });
        Ok(true)
    }

    // ========================================================================
    // Contextual groups
    // ========================================================================

    fn has_contextual_group(&self, group: &str) -> bool {
        self.tree.children(self.root).iter().any(|t| {
            self.tree
                .tab_data(*t)
                .is_ok_and(|d| d.contextual_group_id.as_deref() == Some(group))
        })
    }

    #[must_use]
    pub fn is_contextual_group_visible(&self, group: &str) -> bool {
        self.visible_contextual.contains(group)
    }

    /// Show the tabs of contextual group `group`. Returns whether it changed.
    pub fn show_contextual_group(&mut self, group: &str) -> Result<bool> {
        if !self.has_contextual_group(group) {
            return Err(RuntimeError::ContextualGroupNotFound(group.to_owned()));
        }
        if !self.visible_contextual.insert(group.to_owned()) {
            return Ok(false);
        }
        self.tree.invalidate(self.root);
        self.emit(RibbonEvent::ContextualGroupChanged {
            group: group.to_owned(),
            visible: true,
        });
        Ok(true)
    }

    /// Hide the tabs of contextual group `group`.
    ///
    /// If the selected tab belongs to it, selection falls back to the first
    /// selectable tab.
    pub fn hide_contextual_group(&mut self, group: &str) -> Result<bool> {
        if !self.has_contextual_group(group) {
            return Err(RuntimeError::ContextualGroupNotFound(group.to_owned()));
        }
        if !self.visible_contextual.remove(group) {
            return Ok(false);
        }
        self.tree.invalidate(self.root);
        self.emit(RibbonEvent::ContextualGroupChanged {
            group: group.to_owned(),
            visible: false,
        });
        if let Some(tab) = self.selected_tab()
            && !self.is_tab_selectable(tab)
        {
            let fallback = self.first_selectable_tab();
            self.select_node(fallback)?;
        }
        Ok(true)
    }

    // ========================================================================
    // Refresh and events
    // ========================================================================

    /// Rebuild whatever changed since the last refresh.
    pub fn refresh<H: RenderHost + ?Sized>(&mut self, host: &mut H) -> Result<bool> {
        Ok(self.tree.flush_if_dirty(self.root, host)?)
    }

    /// Handle one host event, running a scale pass when it calls for one.
    pub fn handle_event<H: Host + ?Sized>(
        &mut self,
        event: Event,
        host: &mut H,
    ) -> Result<Option<ScaleOutcome>> {
        match event {
            Event::Resize(size) => {
                trace!(w = size.width, h = size.height, "resize");
            }
            Event::SelectTab(id) => {
                self.select_tab(&id)?;
            }
            Event::DataRefreshed => {
                if let Some(tab) = self.selected_tab() {
                    let id = self.component_id(tab);
                    self.store.remove(&id);
                    self.tree.mark_dirty_recursive(tab);
                }
            }
            Event::Focus(control) => {
                self.set_focus(Some(control));
                return Ok(None);
            }
        }
        self.scale(host).map(Some)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Query `handler` for every tab and every shown control with a command.
    ///
    /// Only nodes whose enablement changed are dirtied. Returns the number
    /// of changes.
    pub fn poll_commands(&mut self, handler: &dyn CommandHandler) -> Result<usize> {
        let mut changed = 0;
        for tab in self.tree.children(self.root).to_vec() {
            let command = self
                .tree
                .tab_data(tab)
                .ok()
                .and_then(|d| d.command_id.clone());
            if let Some(command) = command
                && self.tree.set_tab_enabled(tab, handler.is_enabled(&command))?
            {
                changed += 1;
            }
        }
        for node in self.shown_nodes() {
            let command = self
                .tree
                .node(node)
                .and_then(|n| n.control())
                .and_then(|c| c.command_id.clone());
            if let Some(command) = command
                && self
                    .tree
                    .set_control_enabled(node, handler.is_enabled(&command))?
            {
                changed += 1;
            }
        }
        debug!(changed, "commands polled");
        Ok(changed)
    }

    /// Nodes on the rendered path: the selected tab's shown layouts plus
    /// the open popup menu.
    pub(crate) fn shown_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        if let Some(parts) = self
            .open_popup
            .and_then(|g| self.tree.popup_parts(g).ok().flatten())
        {
            stack.push(parts.menu);
        }
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = self.tree.render_children(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    // ========================================================================
    // Focus and popups
    // ========================================================================

    /// Record the focused control by id, or clear it.
    pub fn set_focus(&mut self, control_id: Option<String>) {
        self.focused_control = control_id;
    }

    #[must_use]
    pub fn focused_control(&self) -> Option<&str> {
        self.focused_control.as_deref()
    }

    /// Node currently carrying the focused control.
    ///
    /// When the control is inside a collapsed group whose menu is closed,
    /// this is the group's popup anchor.
    #[must_use]
    pub fn focused_node(&self) -> Option<NodeId> {
        let control = self.focused_control.as_deref()?;
        let shown = self.shown_nodes();
        if let Some(node) = shown.iter().copied().find(|n| {
            self.tree
                .node(*n)
                .is_some_and(|node| node.component_id() == control)
        }) {
            return Some(node);
        }
        let tab = self.selected_tab()?;
        self.tree.children(tab).iter().copied().find_map(|group| {
            let parts = self.tree.popup_parts(group).ok().flatten()?;
            if self.tree.selected_layout(group).ok().flatten() != Some(parts.layout) {
                return None;
            }
            self.tree
                .descendants(group)
                .into_iter()
                .any(|n| {
                    self.tree
                        .node(n)
                        .is_some_and(|node| node.component_id() == control)
                })
                .then_some(parts.anchor)
        })
    }

    #[must_use]
    pub fn open_popup(&self) -> Option<NodeId> {
        self.open_popup
    }

    /// Open the menu of a collapsed group and return its element.
    ///
    /// Another open popup is closed first.
    pub fn show_popup<H: RenderHost + ?Sized>(
        &mut self,
        group: NodeId,
        host: &mut H,
    ) -> Result<ElementHandle> {
        let collapsed = match self.tree.popup_parts(group)? {
            Some(parts) => self.tree.selected_layout(group)? == Some(parts.layout),
            None => false,
        };
        if !collapsed {
            return Err(RuntimeError::PopupNotShown(self.component_id(group)));
        }
        if self.open_popup.is_some_and(|open| open != group) {
            self.close_popup(host)?;
        }
        let Some(element) = self.tree.refresh_menu(group, host)? else {
            return Err(RuntimeError::PopupNotShown(self.component_id(group)));
        };
        host.set_hidden(element, false);
        if self.open_popup != Some(group) {
            self.open_popup = Some(group);
            let group = self.component_id(group);
            debug!(group = %group, "popup opened");
            self.emit(RibbonEvent::PopupOpened { group });
        }
        Ok(element)
    }

    /// Close the open popup, if any. Returns whether one was open.
    pub fn close_popup<H: RenderHost + ?Sized>(&mut self, host: &mut H) -> Result<bool> {
        let Some(group) = self.open_popup.take() else {
            return Ok(false);
        };
        if let Some(menu) = self
            .tree
            .popup_parts(group)?
            .and_then(|parts| self.tree.element(parts.menu))
        {
            host.set_hidden(menu, true);
        }
        let group = self.component_id(group);
        debug!(group = %group, "popup closed");
        self.emit(RibbonEvent::PopupClosed { group });
        Ok(true)
    }

    /// Close the open popup if its group no longer shows the popup layout.
    pub(crate) fn reconcile_popup<H: RenderHost + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        let Some(group) = self.open_popup else {
            return Ok(());
        };
        let still_collapsed = match self.tree.popup_parts(group)? {
            Some(parts) => self.tree.selected_layout(group)? == Some(parts.layout),
            None => false,
        };
        let on_selected_tab = self.tree.parent(group) == self.selected_tab();
        if !still_collapsed || self.hidden || !on_selected_tab {
            self.close_popup(host)?;
        }
        Ok(())
    }

    /// Hide or show the whole ribbon. Returns whether it changed.
    pub(crate) fn set_hidden<H: RenderHost + ?Sized>(&mut self, hidden: bool, host: &mut H) -> bool {
        if self.hidden == hidden {
            return false;
        }
        self.hidden = hidden;
        if let Some(element) = self.tree.element(self.root) {
            host.set_hidden(element, hidden);
        }
        debug!(hidden, "ribbon visibility changed");
        self.emit(RibbonEvent::VisibilityChanged { hidden });
        true
    }
}
