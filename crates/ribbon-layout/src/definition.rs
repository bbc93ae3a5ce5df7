#![forbid(unsafe_code)]

//! Declarative tab definitions.
//!
//! Definitions deserialize from camelCase JSON and build into a
//! [`ComponentTree`] either eagerly or behind a delayed-init builder.
//!
//! ```json
//! {
//!   "id": "Ribbon.Home", "title": "Home",
//!   "groups": [{
//!     "id": "Ribbon.Home.Font", "title": "Font",
//!     "layouts": [{ "title": "Large", "sections": [
//!       { "type": "TwoRow", "rows": [
//!         { "items": [{ "kind": "control", "id": "Bold", "label": "Bold" }] }
//!       ]}
//!     ]}]
//!   }],
//!   "scaling": {
//!     "maxSizes": [{ "groupId": "Ribbon.Home.Font", "size": "Large" }],
//!     "steps": [{ "groupId": "Ribbon.Home.Font", "size": "Popup", "popupSize": "Large" }]
//!   }
//! }
//! ```

use ribbon_core::geometry::Size;
use serde::{Deserialize, Serialize};

use crate::component::{ControlProps, NodeId};
use crate::error::{LayoutError, Result};
use crate::scaling::{Scaling, ScalingDefinition};
use crate::section::SectionType;
use crate::tree::ComponentTree;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDefinition {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub groups: Vec<GroupDefinition>,
    #[serde(default)]
    pub scaling: ScalingDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDefinition {
    pub id: String,
    pub title: String,
    /// Layout the collapsed popup shows; defaults to the first layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup_source: Option<String>,
    #[serde(default)]
    pub layouts: Vec<LayoutDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDefinition {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDefinition {
    #[serde(rename = "type")]
    pub section_type: SectionType,
    /// At most `section_type.row_count()` rows; missing rows stay empty.
    #[serde(default)]
    pub rows: Vec<RowDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDefinition {
    #[serde(default)]
    pub items: Vec<RowItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RowItem {
    Control(ControlDefinition),
    Strip { controls: Vec<ControlDefinition> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlDefinition {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ControlDefinition {
    #[must_use]
    pub fn to_props(&self) -> ControlProps {
        let mut props = ControlProps::new(&self.id, &self.label);
        props.command_id = self.command.clone();
        if self.width.is_some() || self.height.is_some() {
            props.size_hint = Some(Size::new(
                self.width.unwrap_or(0),
                self.height.unwrap_or(0),
            ));
        }
        props
    }
}

impl LayoutDefinition {
    fn validate(&self) -> Result<()> {
        for section in &self.sections {
            let max = section.section_type.row_count();
            if section.rows.len() > max {
                return Err(LayoutError::SectionArityExceeded {
                    section_type: section.section_type,
                    max,
                    got: section.rows.len(),
                });
            }
        }
        Ok(())
    }
}

impl ComponentTree {
    /// Build a tab and its whole subtree now.
    pub fn build_tab(&mut self, ribbon: NodeId, def: &TabDefinition) -> Result<NodeId> {
        let tab = self.build_tab_shell(ribbon, def)?;
        self.populate_tab(tab, def)?;
        Ok(tab)
    }

    /// Build a tab whose groups materialize on first use.
    pub fn build_tab_lazy(&mut self, ribbon: NodeId, def: TabDefinition) -> Result<NodeId> {
        let tab = self.build_tab_shell(ribbon, &def)?;
        self.set_delayed_init(tab, move |tree, id| tree.populate_tab(id, &def))?;
        Ok(tab)
    }

    fn build_tab_shell(&mut self, ribbon: NodeId, def: &TabDefinition) -> Result<NodeId> {
        let scaling = Scaling::from_definition(&def.scaling)?;
        for group in &def.groups {
            for layout in &group.layouts {
                layout.validate()?;
            }
        }
        let tab = self.add_tab(ribbon, &def.id, &def.title)?;
        let data = self.tab_data_mut(tab)?;
        data.scaling = scaling;
        data.contextual_group_id = def.contextual_group.clone();
        data.command_id = def.command.clone();
        Ok(tab)
    }

    fn populate_tab(&mut self, tab: NodeId, def: &TabDefinition) -> Result<()> {
        for group in &def.groups {
            self.build_group(tab, group)?;
        }
        Ok(())
    }

    /// Build a group and its layouts under `tab`.
    pub fn build_group(&mut self, tab: NodeId, def: &GroupDefinition) -> Result<NodeId> {
        for layout in &def.layouts {
            layout.validate()?;
        }
        let group = self.add_group(tab, &def.id, &def.title)?;
        if let Some(source) = &def.popup_source {
            self.set_popup_source(group, source)?;
        }
        for layout in &def.layouts {
            self.build_layout(group, layout)?;
        }
        Ok(group)
    }

    /// Build one layout under `group`.
    pub fn build_layout(&mut self, group: NodeId, def: &LayoutDefinition) -> Result<NodeId> {
        def.validate()?;
        let layout = self.add_layout(group, &def.title)?;
        for section_def in &def.sections {
            let section = self.add_section(layout, section_def.section_type)?;
            let rows = self.section_rows(section)?.to_vec();
            for (row, row_def) in rows.into_iter().zip(&section_def.rows) {
                for item in &row_def.items {
                    match item {
                        RowItem::Control(control) => {
                            self.add_control(row, control.to_props())?;
                        }
                        RowItem::Strip { controls } => {
                            let strip = self.add_strip(row)?;
                            for control in controls {
                                self.add_control(strip, control.to_props())?;
                            }
                        }
                    }
                }
            }
        }
        Ok(layout)
    }
}
