#![forbid(unsafe_code)]

//! In-memory render host with deterministic geometry.
//!
//! Natural sizes are computed bottom-up when an element is rebuilt:
//!
//! | Kind | Width | Height |
//! |------|-------|--------|
//! | Control | size hint, else label width + padding | size hint, else `control_height` |
//! | Row, Strip | sum of children | max of children |
//! | Section | max of rows (divider: `divider_width`) | sum of rows |
//! | Layout, popup content | sum of sections plus gaps | max of sections |
//! | Popup layout | `popup_anchor_width` | `control_height` |
//! | Group | child + padding (box capped at `max_group_width`) | child + title |
//! | Tab | viewport width | `body_height` |
//!
//! A clean element keeps the size from its last rebuild, so geometry goes
//! stale exactly when the dirty tracking would leave a real document stale.

use std::cell::Cell;

use ribbon_core::geometry::{Rect, Size};
use ribbon_core::latch::ResizeLatch;
use ribbon_layout::{ComponentKind, ElementHandle, Measure, NodeView, RenderHost, SectionType};
use rustc_hash::{FxHashMap, FxHashSet};

/// Pixel constants used by [`SyntheticHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticMetrics {
    pub char_width: u32,
    pub control_padding: u32,
    pub control_height: u32,
    pub divider_width: u32,
    pub section_gap: u32,
    pub group_padding: u32,
    pub group_title_height: u32,
    pub popup_anchor_width: u32,
    /// Height of the tab body box.
    pub body_height: u32,
    /// Cap applied to group boxes; content wider than this overflows.
    pub max_group_width: Option<u32>,
}

impl Default for SyntheticMetrics {
    fn default() -> Self {
        Self {
            char_width: 7,
            control_padding: 16,
            control_height: 22,
            divider_width: 6,
            section_gap: 0,
            group_padding: 8,
            group_title_height: 18,
            popup_anchor_width: 48,
            body_height: 96,
            max_group_width: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Element {
    kind: ComponentKind,
    component_id: String,
    parent: Option<ElementHandle>,
    natural: Size,
    hidden: bool,
}

/// Render host and measurement layer backed by plain data.
#[derive(Debug)]
pub struct SyntheticHost {
    viewport: Size,
    metrics: SyntheticMetrics,
    elements: Vec<Element>,
    prerendered: FxHashSet<String>,
    rebuilds: FxHashMap<String, u32>,
    rebuild_log: Vec<String>,
    resize_echo: Option<ResizeLatch>,
    echoes_fired: Cell<u32>,
    echoes_suppressed: Cell<u32>,
}

impl SyntheticHost {
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        Self::with_metrics(viewport, SyntheticMetrics::default())
    }

    #[must_use]
    pub fn with_metrics(viewport: Size, metrics: SyntheticMetrics) -> Self {
        Self {
            viewport,
            metrics,
            elements: Vec::new(),
            prerendered: FxHashSet::default(),
            rebuilds: FxHashMap::default(),
            rebuild_log: Vec::new(),
            resize_echo: None,
            echoes_fired: Cell::new(0),
            echoes_suppressed: Cell::new(0),
        }
    }

    /// Component ids whose markup already exists, for attach.
    #[must_use]
    pub fn with_prerendered<I, S>(mut self, component_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerendered
            .extend(component_ids.into_iter().map(Into::into));
        self
    }

    /// Fire a resize notification on every tab-box read, gated by `latch`.
    ///
    /// Models hosts where reading layout geometry reflows the document.
    #[must_use]
    pub fn with_resize_echo(mut self, latch: ResizeLatch) -> Self {
        self.resize_echo = Some(latch);
        self
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    #[must_use]
    pub fn metrics(&self) -> &SyntheticMetrics {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut SyntheticMetrics {
        &mut self.metrics
    }

    /// Rebuilds recorded for `component_id`.
    #[must_use]
    pub fn rebuild_count(&self, component_id: &str) -> u32 {
        self.rebuilds.get(component_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_rebuilds(&self) -> u32 {
        self.rebuilds.values().sum()
    }

    /// Rebuilt component ids since the last call, in order.
    pub fn take_rebuild_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.rebuild_log)
    }

    /// Resize notifications that reached the ribbon.
    #[must_use]
    pub fn echoes_fired(&self) -> u32 {
        self.echoes_fired.get()
    }

    /// Resize notifications dropped by the latch.
    #[must_use]
    pub fn echoes_suppressed(&self) -> u32 {
        self.echoes_suppressed.get()
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_hidden(&self, element: ElementHandle) -> bool {
        self.element(element).is_some_and(|e| e.hidden)
    }

    fn element(&self, handle: ElementHandle) -> Option<&Element> {
        let index = usize::try_from(handle.raw()).ok()?.checked_sub(1)?;
        self.elements.get(index)
    }

    fn element_mut(&mut self, handle: ElementHandle) -> Option<&mut Element> {
        let index = usize::try_from(handle.raw()).ok()?.checked_sub(1)?;
        self.elements.get_mut(index)
    }

    fn push(&mut self, node: &NodeView<'_>) -> ElementHandle {
        self.elements.push(Element {
            kind: node.kind,
            component_id: node.component_id.to_owned(),
            parent: None,
            natural: Size::default(),
            hidden: false,
        });
        ElementHandle::new(self.elements.len() as u64)
    }

    fn natural(&self, handle: ElementHandle) -> Size {
        self.element(handle).map(|e| e.natural).unwrap_or_default()
    }

    fn control_size(&self, node: &NodeView<'_>) -> Size {
        let m = &self.metrics;
        let label_width = || {
            let chars = node.control.map_or(0, |c| c.label.chars().count()) as u32;
            chars * m.char_width + m.control_padding
        };
        match node.control.and_then(|c| c.size_hint) {
            Some(hint) => Size::new(
                if hint.width == 0 { label_width() } else { hint.width },
                if hint.height == 0 {
                    m.control_height
                } else {
                    hint.height
                },
            ),
            None => Size::new(label_width(), m.control_height),
        }
    }

    fn compute_natural(&self, node: &NodeView<'_>, children: &[ElementHandle]) -> Size {
        let m = &self.metrics;
        let sizes: Vec<Size> = children.iter().map(|c| self.natural(*c)).collect();
        let sum_w: u32 = sizes.iter().map(|s| s.width).sum();
        let sum_h: u32 = sizes.iter().map(|s| s.height).sum();
        let max_w = sizes.iter().map(|s| s.width).max().unwrap_or(0);
        let max_h = sizes.iter().map(|s| s.height).max().unwrap_or(0);
        match node.kind {
            ComponentKind::Control => self.control_size(node),
            ComponentKind::Row => Size::new(sum_w, max_h.max(m.control_height)),
            ComponentKind::Strip => Size::new(sum_w, max_h),
            ComponentKind::Section if node.section_type == Some(SectionType::Divider) => Size::new(m.divider_width, 0),
            ComponentKind::Section => Size::new(max_w, sum_h),
            ComponentKind::Layout | ComponentKind::GroupPopup => {
                let gaps = m.section_gap * (children.len().saturating_sub(1) as u32);
                Size::new(sum_w + gaps, max_h)
            }
            ComponentKind::PopupLayout => Size::new(m.popup_anchor_width, m.control_height),
            ComponentKind::Group => Size::new(
                max_w + 2 * m.group_padding,
                max_h + m.group_title_height,
            ),
            ComponentKind::Tab => Size::new(sum_w, max_h),
            ComponentKind::Ribbon | ComponentKind::Menu => Size::new(max_w, max_h),
        }
    }

    fn hidden_in_chain(&self, handle: ElementHandle) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            match self.element(h) {
                Some(e) if e.hidden => return true,
                Some(e) => current = e.parent,
                None => return false,
            }
        }
        false
    }

    fn echo_resize(&self) {
        if let Some(latch) = &self.resize_echo {
            if latch.is_engaged() {
                self.echoes_suppressed.set(self.echoes_suppressed.get() + 1);
            } else {
                self.echoes_fired.set(self.echoes_fired.get() + 1);
            }
        }
    }
}

impl RenderHost for SyntheticHost {
    fn create_element(&mut self, node: &NodeView<'_>) -> ElementHandle {
        self.push(node)
    }

    fn rebuild(&mut self, element: ElementHandle, node: &NodeView<'_>, children: &[ElementHandle]) {
        let natural = self.compute_natural(node, children);
        for child in children {
            if let Some(c) = self.element_mut(*child) {
                c.parent = Some(element);
            }
        }
        if let Some(e) = self.element_mut(element) {
            e.natural = natural;
            e.component_id = node.component_id.to_owned();
        }
        *self.rebuilds.entry(node.component_id.to_owned()).or_default() += 1;
        self.rebuild_log.push(node.component_id.to_owned());
        tracing::trace!(component = node.component_id, w = natural.width, h = natural.height, "synthetic rebuild");
    }

    fn find_existing(&mut self, node: &NodeView<'_>) -> Option<ElementHandle> {
        if self.prerendered.contains(node.component_id) {
            Some(self.push(node))
        } else {
            None
        }
    }

    fn set_hidden(&mut self, element: ElementHandle, hidden: bool) {
        if let Some(e) = self.element_mut(element) {
            e.hidden = hidden;
        }
    }
}

impl Measure for SyntheticHost {
    fn viewport(&self) -> Size {
        self.viewport
    }

    fn element_box(&self, element: ElementHandle) -> Option<Rect> {
        if self.hidden_in_chain(element) {
            return None;
        }
        let e = self.element(element)?;
        let size = match e.kind {
            ComponentKind::Tab => {
                self.echo_resize();
                Size::new(self.viewport.width, self.metrics.body_height)
            }
            ComponentKind::Group => Size::new(
                self.metrics
                    .max_group_width
                    .map_or(e.natural.width, |cap| e.natural.width.min(cap)),
                e.natural.height,
            ),
            _ => e.natural,
        };
        Some(Rect::from_size(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ribbon_layout::{ControlProps, NodeId};

    fn view<'a>(kind: ComponentKind, cid: &'a str, control: Option<&'a ControlProps>) -> NodeView<'a> {
        NodeView {
            id: NodeId::from_raw(0),
            kind,
            component_id: cid,
            title: "",
            control,
            section_type: None,
        }
    }

    #[test]
    fn row_sums_controls() {
        let mut host = SyntheticHost::new(Size::new(800, 120));
        let a = ControlProps::new("a", "Cut").size_hint(Size::new(40, 0));
        let b = ControlProps::new("b", "Copy");
        let ea = host.create_element(&view(ComponentKind::Control, "a", Some(&a)));
        let eb = host.create_element(&view(ComponentKind::Control, "b", Some(&b)));
        host.rebuild(ea, &view(ComponentKind::Control, "a", Some(&a)), &[]);
        host.rebuild(eb, &view(ComponentKind::Control, "b", Some(&b)), &[]);
        let row = host.create_element(&view(ComponentKind::Row, "r", None));
        host.rebuild(row, &view(ComponentKind::Row, "r", None), &[ea, eb]);
        let size = host.element_box(row).unwrap().size();
        assert_eq!(size, Size::new(40 + 4 * 7 + 16, 22));
    }

    #[test]
    fn divider_section_has_fixed_width() {
        let mut host = SyntheticHost::new(Size::new(800, 120));
        let mut v = view(ComponentKind::Section, "s", None);
        v.section_type = Some(SectionType::Divider);
        let s = host.create_element(&v);
        host.rebuild(s, &v, &[]);
        assert_eq!(host.element_box(s).unwrap().width, 6);
    }

    #[test]
    fn hidden_ancestor_hides_descendants() {
        let mut host = SyntheticHost::new(Size::new(800, 120));
        let child = host.create_element(&view(ComponentKind::Row, "r", None));
        host.rebuild(child, &view(ComponentKind::Row, "r", None), &[]);
        let parent = host.create_element(&view(ComponentKind::Section, "s", None));
        host.rebuild(parent, &view(ComponentKind::Section, "s", None), &[child]);
        assert!(host.element_box(child).is_some());
        host.set_hidden(parent, true);
        assert!(host.element_box(child).is_none());
    }

    #[test]
    fn echo_respects_latch() {
        let latch = ResizeLatch::new();
        let mut host = SyntheticHost::new(Size::new(800, 120)).with_resize_echo(latch.clone());
        let tab = host.create_element(&view(ComponentKind::Tab, "t", None));
        let _ = host.element_box(tab);
        {
            let _guard = latch.try_engage().unwrap();
            let _ = host.element_box(tab);
        }
        assert_eq!(host.echoes_fired(), 1);
        assert_eq!(host.echoes_suppressed(), 1);
    }
}
