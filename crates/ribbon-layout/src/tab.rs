#![forbid(unsafe_code)]

//! Tabs and the per-tab scale cursor.
//!
//! The cursor is a [`ScalePosition`]: never scaled, at max, or just after
//! applying step `i`. Scaling down applies the next step; scaling up
//! reverts the current one by restoring the layout its group showed before.
//!
//! # Invariants
//!
//! 1. `At(i)` always names an existing step and steps `0..=i` are the ones
//!    applied; edits through [`ComponentTree::edit_scaling`] clamp the
//!    cursor and replay the new step list up to it.
//! 2. A step whose group is not in the tab still advances the cursor.

use std::rc::Rc;

use crate::component::{ComponentKind, NodeData, NodeId};
use crate::error::{LayoutError, Result};
use crate::scaling::Scaling;
use crate::tree::ComponentTree;

/// Where a tab sits in its scaling sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalePosition {
    #[default]
    NeverScaled,
    /// Every group at its max size.
    Max,
    /// Step `i` is the last applied.
    At(usize),
}

impl ScalePosition {
    pub const NEVER_SCALED_INDEX: i32 = -2;
    pub const MAX_INDEX: i32 = -1;

    /// Integer form: `-2`, `-1`, or the step index.
    #[must_use]
    pub fn index(self) -> i32 {
        match self {
            Self::NeverScaled => Self::NEVER_SCALED_INDEX,
            Self::Max => Self::MAX_INDEX,
            Self::At(i) => i32::try_from(i).unwrap_or(i32::MAX),
        }
    }

    /// Inverse of [`index`](Self::index).
    #[must_use]
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            Self::NEVER_SCALED_INDEX => Some(Self::NeverScaled),
            Self::MAX_INDEX => Some(Self::Max),
            i => usize::try_from(i).ok().map(Self::At),
        }
    }
}

/// Tab payload.
#[derive(Debug, Default)]
pub struct TabData {
    pub(crate) scaling: Scaling,
    pub(crate) position: ScalePosition,
    /// Contextual group this tab belongs to, if any.
    pub contextual_group_id: Option<String>,
    pub command_id: Option<String>,
    pub enabled: bool,
}

impl TabData {
    #[must_use]
    pub fn scaling(&self) -> &Scaling {
        &self.scaling
    }

    #[must_use]
    pub fn position(&self) -> ScalePosition {
        self.position
    }
}

impl ComponentTree {
    /// Append a tab to a ribbon.
    pub fn add_tab(
        &mut self,
        ribbon: NodeId,
        component_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<NodeId> {
        let data = TabData {
            enabled: true,
            ..TabData::default()
        };
        self.add_child(ribbon, NodeData::Tab(Box::new(data)), component_id, title)
    }

    /// Show `tab` (or nothing) in `ribbon`. Returns whether it changed.
    pub fn select_tab(&mut self, ribbon: NodeId, tab: Option<NodeId>) -> Result<bool> {
        if let Some(tab) = tab {
            self.expect_kind(tab, ComponentKind::Tab)?;
            if self.parent(tab) != Some(ribbon) {
                return Err(LayoutError::NodeNotFound(tab));
            }
        }
        let node = self.get_mut(ribbon)?;
        let found = node.kind();
        let NodeData::Ribbon(data) = &mut node.data else {
            return Err(LayoutError::WrongKind {
                id: ribbon,
                expected: ComponentKind::Ribbon,
                found,
            });
        };
        if data.selected_tab == tab {
            return Ok(false);
        }
        data.selected_tab = tab;
        if let Some(tab) = tab {
            self.mark_dirty_recursive(tab);
        }
        self.invalidate(ribbon);
        Ok(true)
    }

    /// Tab shown by `ribbon`.
    pub fn selected_tab(&self, ribbon: NodeId) -> Result<Option<NodeId>> {
        match self.get(ribbon)?.data() {
            NodeData::Ribbon(data) => Ok(data.selected_tab),
            other => Err(LayoutError::WrongKind {
                id: ribbon,
                expected: ComponentKind::Ribbon,
                found: other.kind(),
            }),
        }
    }

    pub fn tab_data(&self, tab: NodeId) -> Result<&TabData> {
        match self.get(tab)?.data() {
            NodeData::Tab(data) => Ok(data),
            other => Err(LayoutError::WrongKind {
                id: tab,
                expected: ComponentKind::Tab,
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn tab_data_mut(&mut self, tab: NodeId) -> Result<&mut TabData> {
        let node = self.get_mut(tab)?;
        let found = node.kind();
        match &mut node.data {
            NodeData::Tab(data) => Ok(data),
            _ => Err(LayoutError::WrongKind {
                id: tab,
                expected: ComponentKind::Tab,
                found,
            }),
        }
    }

    /// Set the contextual group a tab belongs to.
    pub fn set_tab_contextual_group(&mut self, tab: NodeId, group_id: Option<String>) -> Result<()> {
        self.tab_data_mut(tab)?.contextual_group_id = group_id;
        Ok(())
    }

    /// Enable or disable a tab. Returns whether it changed.
    pub fn set_tab_enabled(&mut self, tab: NodeId, enabled: bool) -> Result<bool> {
        let data = self.tab_data_mut(tab)?;
        if data.enabled == enabled {
            return Ok(false);
        }
        data.enabled = enabled;
        self.invalidate(tab);
        Ok(true)
    }

    pub fn scaling(&self, tab: NodeId) -> Result<&Scaling> {
        Ok(&self.tab_data(tab)?.scaling)
    }

    pub fn scale_position(&self, tab: NodeId) -> Result<ScalePosition> {
        Ok(self.tab_data(tab)?.position)
    }

    /// Mutate the tab's scaling, then re-apply the cursor.
    ///
    /// When the registry changed, every step up to the (clamped) cursor is
    /// replayed from max so the groups show what the new step list implies.
    pub fn edit_scaling<R>(&mut self, tab: NodeId, f: impl FnOnce(&mut Scaling) -> R) -> Result<R> {
        let scaling = &mut self.tab_data_mut(tab)?.scaling;
        let was_dirty = scaling.is_dirty();
        scaling.clear_dirty();
        let result = f(scaling);
        let changed = scaling.is_dirty();
        scaling.set_dirty(was_dirty || changed);
        if !changed {
            return Ok(result);
        }

        let data = self.tab_data(tab)?;
        let (len, position) = (data.scaling.len(), data.position);
        match position {
            ScalePosition::NeverScaled => {}
            ScalePosition::Max => self.scale_max(tab)?,
            ScalePosition::At(_) if len == 0 => self.scale_max(tab)?,
            ScalePosition::At(i) => {
                let target = i32::try_from(i.min(len - 1)).unwrap_or(i32::MAX);
                self.scale_index(tab, target)?;
            }
        }
        Ok(result)
    }

    /// Groups of `tab`, in order.
    pub fn tab_groups(&mut self, tab: NodeId) -> Result<Vec<NodeId>> {
        self.tab_data(tab)?;
        self.children_of_kind(tab, ComponentKind::Group)
    }

    fn tab_group(&mut self, tab: NodeId, group_id: &str) -> Result<Option<NodeId>> {
        Ok(self
            .tab_groups(tab)?
            .into_iter()
            .find(|g| self.node(*g).is_some_and(|n| n.component_id() == group_id)))
    }

    fn apply_step_layout(
        &mut self,
        tab: NodeId,
        group_id: &str,
        layout: Option<&str>,
        popup_size_hint: Option<&str>,
    ) -> Result<()> {
        match self.tab_group(tab, group_id)? {
            Some(group) => {
                self.select_layout(group, layout, popup_size_hint)?;
            }
            None => {
                tracing::warn!(tab = %tab, group = group_id, "scaling step targets a missing group");
            }
        }
        Ok(())
    }

    /// Show every group at its max size.
    pub fn scale_max(&mut self, tab: NodeId) -> Result<()> {
        for group in self.tab_groups(tab)? {
            let group_id = self.get(group)?.component_id().to_owned();
            let max = self
                .tab_data(tab)?
                .scaling
                .max_size(&group_id)
                .map(str::to_owned);
            if let Some(max) = max {
                self.select_layout(group, Some(&max), None)?;
            }
        }
        self.tab_data_mut(tab)?.position = ScalePosition::Max;
        self.invalidate(tab);
        Ok(())
    }

    /// Apply the next step. Returns `false` when none is left.
    pub fn scale_down(&mut self, tab: NodeId) -> Result<bool> {
        let next = match self.tab_data(tab)?.position {
            ScalePosition::NeverScaled => {
                self.scale_max(tab)?;
                return Ok(true);
            }
            ScalePosition::Max => 0,
            ScalePosition::At(i) => i + 1,
        };
        let Some(step) = self.tab_data(tab)?.scaling.step(next).map(Rc::clone) else {
            return Ok(false);
        };
        self.apply_step_layout(
            tab,
            step.group_id(),
            Some(step.layout_name()),
            step.popup_size_hint(),
        )?;
        if let Some(message) = step.warning_message() {
            tracing::warn!(tab = %tab, group = step.group_id(), "{message}");
        }
        self.tab_data_mut(tab)?.position = ScalePosition::At(next);
        self.invalidate(tab);
        Ok(true)
    }

    /// Revert the current step. Returns `false` at max.
    pub fn scale_up(&mut self, tab: NodeId) -> Result<bool> {
        let index = match self.tab_data(tab)?.position {
            ScalePosition::NeverScaled => {
                self.scale_max(tab)?;
                return Ok(true);
            }
            ScalePosition::Max => return Ok(false),
            ScalePosition::At(i) => i,
        };
        let scaling = &self.tab_data(tab)?.scaling;
        let step = scaling
            .step(index)
            .map(Rc::clone)
            .ok_or(LayoutError::StepIndexOutOfRange {
                index,
                len: scaling.len(),
            })?;
        let (layout, hint) = match scaling.previous_step(index) {
            Some(prev) => (
                Some(prev.layout_name().to_owned()),
                prev.popup_size_hint().map(str::to_owned),
            ),
            None => (scaling.max_size(step.group_id()).map(str::to_owned), None),
        };
        self.apply_step_layout(tab, step.group_id(), layout.as_deref(), hint.as_deref())?;
        self.tab_data_mut(tab)?.position = match index {
            0 => ScalePosition::Max,
            i => ScalePosition::At(i - 1),
        };
        self.invalidate(tab);
        Ok(true)
    }

    /// Scale to max, then down until the cursor reaches `target` or no step
    /// is left. Targets below `-1` stop at max.
    pub fn scale_index(&mut self, tab: NodeId, target: i32) -> Result<ScalePosition> {
        self.scale_max(tab)?;
        while self.scale_position(tab)?.index() < target {
            if !self.scale_down(tab)? {
                break;
            }
        }
        self.scale_position(tab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ControlProps, RibbonData};
    use crate::scaling::ScalingStep;
    use crate::section::SectionType;

    struct Fixture {
        tree: ComponentTree,
        tab: NodeId,
        font: NodeId,
        clipboard: NodeId,
    }

    fn fixture() -> Fixture {
        let mut tree = ComponentTree::new();
        let root = tree.insert_root(NodeData::Ribbon(RibbonData::default()), "Ribbon", "");
        let tab = tree.add_tab(root, "Home", "Home").unwrap();
        let mut groups = Vec::new();
        for gid in ["Clipboard", "Font"] {
            let group = tree.add_group(tab, gid, gid).unwrap();
            for title in ["Large", "Medium", "Small"] {
                let layout = tree.add_layout(group, title).unwrap();
                let section = tree.add_section(layout, SectionType::OneRow).unwrap();
                let row = tree.section_rows(section).unwrap()[0];
                tree.add_control(row, ControlProps::new(format!("{gid}.{title}"), title))
                    .unwrap();
            }
            groups.push(group);
        }
        tree.edit_scaling(tab, |s| {
            s.set_group_max_size("Clipboard", "Large");
            s.set_group_max_size("Font", "Large");
            for (g, l) in [
                ("Font", "Medium"),
                ("Clipboard", "Small"),
                ("Font", "Small"),
                ("Font", "Popup"),
            ] {
                s.add_scaling_step(ScalingStep::new(g, l).unwrap().into_ref())
                    .unwrap();
            }
        })
        .unwrap();
        Fixture {
            tree,
            tab,
            clipboard: groups[0],
            font: groups[1],
        }
    }

    fn shown(tree: &ComponentTree, group: NodeId) -> Option<String> {
        tree.selected_layout_title(group)
            .unwrap()
            .map(str::to_owned)
    }

    #[test]
    fn position_index_round_trips() {
        for p in [
            ScalePosition::NeverScaled,
            ScalePosition::Max,
            ScalePosition::At(0),
            ScalePosition::At(5),
        ] {
            assert_eq!(ScalePosition::from_index(p.index()), Some(p));
        }
        assert_eq!(ScalePosition::from_index(-3), None);
    }

    #[test]
    fn first_scale_down_goes_to_max() {
        let Fixture {
            mut tree, tab, font, ..
        } = fixture();
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::NeverScaled);
        assert!(tree.scale_down(tab).unwrap());
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::Max);
        assert_eq!(shown(&tree, font).as_deref(), Some("Large"));
    }

    #[test]
    fn walk_down_and_back_up() {
        let Fixture {
            mut tree,
            tab,
            font,
            clipboard,
        } = fixture();
        tree.scale_max(tab).unwrap();
        let expected_down = [
            ("Medium", "Large"),
            ("Medium", "Small"),
            ("Small", "Small"),
            ("Popup", "Small"),
        ];
        for (font_layout, clip_layout) in expected_down {
            assert!(tree.scale_down(tab).unwrap());
            assert_eq!(shown(&tree, font).as_deref(), Some(font_layout));
            assert_eq!(shown(&tree, clipboard).as_deref(), Some(clip_layout));
        }
        assert!(!tree.scale_down(tab).unwrap());
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::At(3));

        for (font_layout, clip_layout) in [
            ("Small", "Small"),
            ("Medium", "Small"),
            ("Medium", "Large"),
            ("Large", "Large"),
        ] {
            assert!(tree.scale_up(tab).unwrap());
            assert_eq!(shown(&tree, font).as_deref(), Some(font_layout));
            assert_eq!(shown(&tree, clipboard).as_deref(), Some(clip_layout));
        }
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::Max);
        assert!(!tree.scale_up(tab).unwrap());
    }

    #[test]
    fn scale_index_stops_at_target_or_end() {
        let Fixture { mut tree, tab, .. } = fixture();
        assert_eq!(tree.scale_index(tab, 1).unwrap(), ScalePosition::At(1));
        assert_eq!(tree.scale_index(tab, 99).unwrap(), ScalePosition::At(3));
        assert_eq!(tree.scale_index(tab, -1).unwrap(), ScalePosition::Max);
        assert_eq!(tree.scale_index(tab, -5).unwrap(), ScalePosition::Max);
    }

    #[test]
    fn removing_steps_clamps_cursor() {
        let Fixture {
            mut tree, tab, font, ..
        } = fixture();
        tree.scale_index(tab, 3).unwrap();
        tree.edit_scaling(tab, |s| {
            s.remove_at(3).unwrap();
            s.remove_at(2).unwrap();
        })
        .unwrap();
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::At(1));
        assert_eq!(shown(&tree, font).as_deref(), Some("Medium"));

        tree.edit_scaling(tab, |s| {
            s.remove_at(1).unwrap();
            s.remove_at(0).unwrap();
        })
        .unwrap();
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::Max);
    }

    #[test]
    fn removing_step_below_cursor_replays_new_list() {
        let Fixture {
            mut tree,
            tab,
            font,
            clipboard,
        } = fixture();
        tree.scale_index(tab, 1).unwrap();
        assert_eq!(shown(&tree, font).as_deref(), Some("Medium"));
        assert_eq!(shown(&tree, clipboard).as_deref(), Some("Small"));

        tree.edit_scaling(tab, |s| s.remove_at(0).unwrap()).unwrap();
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::At(1));
        assert_eq!(shown(&tree, clipboard).as_deref(), Some("Small"));
        assert_eq!(shown(&tree, font).as_deref(), Some("Small"));
    }

    #[test]
    fn inserting_step_below_cursor_replays_new_list() {
        let Fixture {
            mut tree,
            tab,
            font,
            clipboard,
        } = fixture();
        tree.scale_index(tab, 0).unwrap();
        tree.edit_scaling(tab, |s| {
            s.add_scaling_step_at_index(ScalingStep::new("Clipboard", "Medium").unwrap().into_ref(), 0)
                .unwrap();
        })
        .unwrap();
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::At(0));
        assert_eq!(shown(&tree, clipboard).as_deref(), Some("Medium"));
        assert_eq!(shown(&tree, font).as_deref(), Some("Large"));
    }

    #[test]
    fn unchanged_edit_keeps_layouts() {
        let Fixture {
            mut tree, tab, font, ..
        } = fixture();
        tree.scale_index(tab, 0).unwrap();
        tree.edit_scaling(tab, |s| s.set_group_max_size("Font", "Large"))
            .unwrap();
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::At(0));
        assert_eq!(shown(&tree, font).as_deref(), Some("Medium"));
        assert!(tree.scaling(tab).unwrap().is_dirty());
    }

    #[test]
    fn step_for_missing_group_is_consumed() {
        let Fixture {
            mut tree, tab, font, ..
        } = fixture();
        tree.edit_scaling(tab, |s| {
            s.set_group_max_size("Styles", "Large");
            s.add_scaling_step_at_index(ScalingStep::new("Styles", "Small").unwrap().into_ref(), 0)
                .unwrap();
        })
        .unwrap();
        tree.scale_max(tab).unwrap();
        assert!(tree.scale_down(tab).unwrap());
        assert_eq!(tree.scale_position(tab).unwrap(), ScalePosition::At(0));
        assert_eq!(shown(&tree, font).as_deref(), Some("Large"));
    }

    #[test]
    fn select_tab_requires_child() {
        let mut tree = ComponentTree::new();
        let a = tree.insert_root(NodeData::Ribbon(RibbonData::default()), "A", "");
        let b = tree.insert_root(NodeData::Ribbon(RibbonData::default()), "B", "");
        let tab = tree.add_tab(b, "T", "T").unwrap();
        assert!(tree.select_tab(a, Some(tab)).is_err());
        assert!(tree.select_tab(b, Some(tab)).unwrap());
        assert!(!tree.select_tab(b, Some(tab)).unwrap());
        assert_eq!(tree.selected_tab(b).unwrap(), Some(tab));
    }
}
