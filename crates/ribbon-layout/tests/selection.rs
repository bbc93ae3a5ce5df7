//! Layout selection, dirty marking, and refresh interplay.

use ribbon_layout::{
    ComponentTree, ControlProps, ElementHandle, NodeData, NodeId, NodeView, POPUP_LAYOUT_TITLE,
    RenderHost, RibbonData, SectionType,
};

#[derive(Default)]
struct RecordingHost {
    next: u64,
    rebuilt: Vec<String>,
}

impl RenderHost for RecordingHost {
    fn create_element(&mut self, _node: &NodeView<'_>) -> ElementHandle {
        self.next += 1;
        ElementHandle::new(self.next)
    }

    fn rebuild(&mut self, _element: ElementHandle, node: &NodeView<'_>, _children: &[ElementHandle]) {
        self.rebuilt.push(node.component_id.to_owned());
    }

    fn set_hidden(&mut self, _element: ElementHandle, _hidden: bool) {}
}

struct Fixture {
    tree: ComponentTree,
    root: NodeId,
    group: NodeId,
}

fn fixture() -> Fixture {
    let mut tree = ComponentTree::new();
    let root = tree.insert_root(NodeData::Ribbon(RibbonData::default()), "Ribbon", "");
    let tab = tree.add_tab(root, "Home", "Home").unwrap();
    let group = tree.add_group(tab, "Clipboard", "Clipboard").unwrap();
    for title in ["Large", "Small"] {
        let layout = tree.add_layout(group, title).unwrap();
        let section = tree.add_section(layout, SectionType::TwoRow).unwrap();
        let rows = tree.section_rows(section).unwrap().to_vec();
        tree.add_control(rows[0], ControlProps::new("Clipboard.Paste", "Paste"))
            .unwrap();
        let strip = tree.add_strip(rows[1]).unwrap();
        tree.add_control(strip, ControlProps::new("Clipboard.Cut", "Cut"))
            .unwrap();
    }
    tree.select_tab(root, Some(tab)).unwrap();
    Fixture { tree, root, group }
}

#[test]
fn repeated_select_rebuilds_once() {
    let Fixture {
        mut tree,
        root,
        group,
    } = fixture();
    let mut host = RecordingHost::default();
    tree.refresh(root, &mut host).unwrap();

    assert!(tree.select_layout(group, Some("Small"), None).unwrap());
    tree.reset_stats();
    tree.refresh(root, &mut host).unwrap();
    let first = tree.stats().rebuilt;
    assert!(first > 0);

    assert!(!tree.select_layout(group, Some("Small"), None).unwrap());
    assert!(!tree.is_dirty(root));
    tree.reset_stats();
    assert!(!tree.flush_if_dirty(root, &mut host).unwrap());
    assert_eq!(tree.stats().rebuilt, 0);
}

#[test]
fn reselected_layout_is_fully_dirty() {
    let Fixture {
        mut tree,
        root,
        group,
    } = fixture();
    let mut host = RecordingHost::default();
    tree.select_layout(group, Some("Large"), None).unwrap();
    tree.refresh(root, &mut host).unwrap();
    tree.select_layout(group, Some("Small"), None).unwrap();
    tree.refresh(root, &mut host).unwrap();

    let large = tree.find_layout(group, "Large").unwrap().unwrap();
    assert!(tree.descendants(large).iter().all(|n| !tree.is_dirty(*n)));

    tree.select_layout(group, Some("Large"), None).unwrap();
    assert!(tree.descendants(large).iter().all(|n| tree.is_dirty(*n)));

    host.rebuilt.clear();
    tree.refresh(root, &mut host).unwrap();
    assert!(host.rebuilt.iter().any(|c| c == "Clipboard.Paste"));
    assert!(host.rebuilt.iter().any(|c| c == "Clipboard.Cut"));
}

#[test]
fn popup_menu_refreshes_only_on_demand() {
    let Fixture {
        mut tree,
        root,
        group,
    } = fixture();
    let mut host = RecordingHost::default();
    tree.select_layout(group, Some(POPUP_LAYOUT_TITLE), Some("Small"))
        .unwrap();
    tree.refresh(root, &mut host).unwrap();
    let parts = tree.popup_parts(group).unwrap().unwrap();
    assert!(tree.element(parts.anchor).is_some());
    assert!(tree.element(parts.menu).is_none());
    assert!(tree.is_dirty(parts.menu));

    let menu_element = tree.refresh_menu(group, &mut host).unwrap();
    assert_eq!(menu_element, tree.element(parts.menu));
    assert!(!tree.is_dirty(parts.menu));
    assert!(host.rebuilt.iter().any(|c| c == "Clipboard.Paste"));
}

#[test]
fn refresh_resolves_lazy_tab() {
    let mut tree = ComponentTree::new();
    let root = tree.insert_root(NodeData::Ribbon(RibbonData::default()), "Ribbon", "");
    let tab = tree.add_tab(root, "Insert", "Insert").unwrap();
    tree.set_delayed_init(tab, |tree, id| {
        let group = tree.add_group(id, "Tables", "Tables")?;
        let layout = tree.add_layout(group, "Large")?;
        tree.add_section(layout, SectionType::OneRow)?;
        tree.select_layout(group, Some("Large"), None)?;
        Ok(())
    })
    .unwrap();
    tree.select_tab(root, Some(tab)).unwrap();

    let mut host = RecordingHost::default();
    tree.refresh(root, &mut host).unwrap();
    assert!(host.rebuilt.iter().any(|c| c == "Tables.Large"));
    assert_eq!(tree.stats().resolved, 1);
}
