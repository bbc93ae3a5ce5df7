#![forbid(unsafe_code)]

//! Fixed-arity sections.
//!
//! A section's rows are created together with the section and can never be
//! added or removed afterwards; [`ComponentTree::add_child`] and
//! [`ComponentTree::remove_child`] refuse any Section parent.

use serde::{Deserialize, Serialize};

use crate::component::{ComponentKind, NodeData, NodeId};
use crate::error::{LayoutError, Result};
use crate::tree::ComponentTree;

/// Row arity of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    /// Visual separator; no rows.
    Divider,
    OneRow,
    TwoRow,
    ThreeRow,
}

impl SectionType {
    /// Number of rows created with the section.
    #[must_use]
    pub const fn row_count(self) -> usize {
        match self {
            Self::Divider => 0,
            Self::OneRow => 1,
            Self::TwoRow => 2,
            Self::ThreeRow => 3,
        }
    }
}

impl ComponentTree {
    /// Append a section (and its rows) to a layout or popup container.
    pub fn add_section(&mut self, parent: NodeId, section_type: SectionType) -> Result<NodeId> {
        let index = self.children(parent).len() + 1;
        let parent_cid = self.get(parent)?.component_id().to_owned();
        self.add_child(
            parent,
            NodeData::Section(section_type),
            format!("{parent_cid}.S{index}"),
            String::new(),
        )
    }

    /// Section type of `section`.
    pub fn section_type(&self, section: NodeId) -> Result<SectionType> {
        match self.get(section)?.data() {
            NodeData::Section(t) => Ok(*t),
            other => Err(LayoutError::WrongKind {
                id: section,
                expected: ComponentKind::Section,
                found: other.kind(),
            }),
        }
    }

    /// Rows of `section`, in order.
    pub fn section_rows(&self, section: NodeId) -> Result<&[NodeId]> {
        self.section_type(section)?;
        Ok(self.get(section)?.children())
    }

    /// Materialize the fixed rows for a freshly inserted section.
    pub(crate) fn materialize_section_rows(&mut self, section: NodeId) {
        let Ok(section_type) = self.section_type(section) else {
            return;
        };
        let Some(cid) = self.node(section).map(|n| n.component_id().to_owned()) else {
            return;
        };
        for row in 0..section_type.row_count() {
            self.insert_child_unchecked(
                section,
                NodeData::Row,
                format!("{cid}.R{}", row + 1),
                String::new(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ControlProps, RibbonData};

    fn layout_fixture() -> (ComponentTree, NodeId) {
        let mut tree = ComponentTree::new();
        let root = tree.insert_root(NodeData::Ribbon(RibbonData::default()), "Ribbon", "");
        let tab = tree.add_tab(root, "Ribbon.Home", "Home").unwrap();
        let group = tree.add_group(tab, "Ribbon.Home.Font", "Font").unwrap();
        let layout = tree.add_layout(group, "Large").unwrap();
        (tree, layout)
    }

    #[test]
    fn rows_match_section_type() {
        let (mut tree, layout) = layout_fixture();
        for (t, expected) in [
            (SectionType::Divider, 0),
            (SectionType::OneRow, 1),
            (SectionType::TwoRow, 2),
            (SectionType::ThreeRow, 3),
        ] {
            let section = tree.add_section(layout, t).unwrap();
            assert_eq!(tree.section_rows(section).unwrap().len(), expected);
            assert_eq!(t.row_count(), expected);
        }
    }

    #[test]
    fn direct_row_insertion_is_refused() {
        let (mut tree, layout) = layout_fixture();
        let section = tree.add_section(layout, SectionType::TwoRow).unwrap();
        let err = tree
            .add_child(section, NodeData::Row, "extra", "")
            .unwrap_err();
        assert_eq!(err, LayoutError::SectionArityFixed { section });
        assert_eq!(tree.section_rows(section).unwrap().len(), 2);
    }

    #[test]
    fn row_removal_is_refused() {
        let (mut tree, layout) = layout_fixture();
        let section = tree.add_section(layout, SectionType::OneRow).unwrap();
        let row = tree.section_rows(section).unwrap()[0];
        assert_eq!(
            tree.remove_child(section, row),
            Err(LayoutError::SectionArityFixed { section })
        );
        assert!(tree.node(row).is_some());
    }

    #[test]
    fn controls_go_into_rows() {
        let (mut tree, layout) = layout_fixture();
        let section = tree.add_section(layout, SectionType::OneRow).unwrap();
        let row = tree.section_rows(section).unwrap()[0];
        let bold = tree
            .add_control(row, ControlProps::new("Ribbon.Home.Font.Bold", "Bold"))
            .unwrap();
        assert_eq!(tree.parent(bold), Some(row));
    }
}
