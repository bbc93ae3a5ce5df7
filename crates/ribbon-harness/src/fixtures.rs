#![forbid(unsafe_code)]

//! Tab definitions with predictable geometry under [`SyntheticMetrics`].
//!
//! With default metrics the `home_tab` widths per scale index are:
//!
//! | index | width |
//! |-------|-------|
//! | max | 828 |
//! | 0 | 708 |
//! | 1 | 528 |
//! | 2 | 388 |
//! | 3 | 328 |
//! | 4 | 264 |
//! | 5 | 224 |
//! | 6 | 216 |
//! | 7 | 204 |
//! | 8 | 192 |
//!
//! [`SyntheticMetrics`]: crate::synthetic::SyntheticMetrics

use ribbon_layout::{
    ComponentTree, ControlDefinition, GroupDefinition, LayoutDefinition, MaxSizeDefinition,
    NodeData, NodeId, RibbonData, RowDefinition, RowItem, ScaleStepDefinition, ScalingDefinition,
    SectionDefinition, SectionType, TabDefinition,
};

/// Layout with one section holding `count` controls of `width`, dealt
/// round-robin across the section's rows.
#[must_use]
pub fn uniform_layout(
    group_id: &str,
    title: &str,
    section_type: SectionType,
    count: usize,
    width: u32,
) -> LayoutDefinition {
    let row_count = section_type.row_count().max(1);
    let mut rows = vec![RowDefinition::default(); section_type.row_count()];
    for i in 0..count {
        if let Some(row) = rows.get_mut(i % row_count) {
            row.items.push(RowItem::Control(ControlDefinition {
                id: format!("{group_id}.B{i}"),
                label: format!("B{i}"),
                command: Some(format!("{group_id}.Cmd{i}")),
                width: Some(width),
                height: None,
            }));
        }
    }
    LayoutDefinition {
        title: title.to_owned(),
        sections: vec![SectionDefinition { section_type, rows }],
    }
}

/// Group with Large/Medium/Small layouts of the given shapes.
#[must_use]
pub fn sized_group(id: &str, title: &str, shapes: [(SectionType, usize, u32); 3]) -> GroupDefinition {
    let layouts = ["Large", "Medium", "Small"]
        .into_iter()
        .zip(shapes)
        .map(|(name, (t, count, width))| uniform_layout(id, name, t, count, width))
        .collect();
    GroupDefinition {
        id: id.to_owned(),
        title: title.to_owned(),
        popup_source: Some("Medium".to_owned()),
        layouts,
    }
}

fn step(group_id: &str, size: &str) -> ScaleStepDefinition {
    ScaleStepDefinition {
        group_id: group_id.to_owned(),
        size: size.to_owned(),
        popup_size: None,
        warning_message: None,
    }
}

/// Three groups, nine steps, ending with every group collapsed.
#[must_use]
pub fn home_tab() -> TabDefinition {
    let clipboard = "Ribbon.Home.Clipboard";
    let font = "Ribbon.Home.Font";
    let paragraph = "Ribbon.Home.Paragraph";
    let groups = vec![
        sized_group(
            clipboard,
            "Clipboard",
            [
                (SectionType::OneRow, 4, 60),
                (SectionType::TwoRow, 4, 50),
                (SectionType::ThreeRow, 4, 30),
            ],
        ),
        sized_group(
            font,
            "Font",
            [
                (SectionType::OneRow, 6, 50),
                (SectionType::TwoRow, 6, 40),
                (SectionType::ThreeRow, 6, 28),
            ],
        ),
        sized_group(
            paragraph,
            "Paragraph",
            [
                (SectionType::OneRow, 5, 48),
                (SectionType::TwoRow, 5, 40),
                (SectionType::ThreeRow, 5, 30),
            ],
        ),
    ];
    let mut font_popup = step(font, "Popup");
    font_popup.popup_size = Some("Small".to_owned());
    font_popup.warning_message = Some("Font group collapsed".to_owned());
    TabDefinition {
        id: "Ribbon.Home".to_owned(),
        title: "Home".to_owned(),
        contextual_group: None,
        command: Some("Ribbon.Home".to_owned()),
        groups,
        scaling: ScalingDefinition {
            max_sizes: [clipboard, font, paragraph]
                .into_iter()
                .map(|g| MaxSizeDefinition {
                    group_id: g.to_owned(),
                    size: "Large".to_owned(),
                })
                .collect(),
            steps: vec![
                step(paragraph, "Medium"),
                step(font, "Medium"),
                step(clipboard, "Medium"),
                step(paragraph, "Small"),
                step(font, "Small"),
                step(clipboard, "Small"),
                font_popup,
                step(paragraph, "Popup"),
                step(clipboard, "Popup"),
            ],
        },
    }
}

/// Contextual tab in the `PictureTools` group.
#[must_use]
pub fn picture_tab() -> TabDefinition {
    let adjust = "Ribbon.PictureFormat.Adjust";
    TabDefinition {
        id: "Ribbon.PictureFormat".to_owned(),
        title: "Picture Format".to_owned(),
        contextual_group: Some("PictureTools".to_owned()),
        command: Some("Ribbon.PictureFormat".to_owned()),
        groups: vec![sized_group(
            adjust,
            "Adjust",
            [
                (SectionType::OneRow, 3, 60),
                (SectionType::TwoRow, 3, 40),
                (SectionType::ThreeRow, 3, 30),
            ],
        )],
        scaling: ScalingDefinition {
            max_sizes: vec![MaxSizeDefinition {
                group_id: adjust.to_owned(),
                size: "Large".to_owned(),
            }],
            steps: vec![step(adjust, "Medium"), step(adjust, "Small")],
        },
    }
}

/// A ribbon root with `tabs` built eagerly, first tab selected.
pub fn ribbon_with(tabs: &[TabDefinition]) -> ribbon_layout::Result<(ComponentTree, NodeId)> {
    let mut tree = ComponentTree::new();
    let root = tree.insert_root(NodeData::Ribbon(RibbonData::default()), "Ribbon", "Ribbon");
    let mut first = None;
    for def in tabs {
        let tab = tree.build_tab(root, def)?;
        first.get_or_insert(tab);
    }
    tree.select_tab(root, first)?;
    Ok((tree, root))
}
