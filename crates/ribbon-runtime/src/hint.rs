#![forbid(unsafe_code)]

//! Scaling hint: a fingerprint of the data shape a scale decision was
//! made against.
//!
//! A persisted decision is replayed only when the hint still matches, so
//! anything that can change which layouts a scale index selects feeds the
//! hash:
//!
//! - the tab's component id,
//! - each `(group id, max size)` pair, sorted by group id,
//! - each step in order as `(group id, layout, popup size hint)`,
//! - each group's component id and the titles of its layouts, in order.
//!
//! Fields are length-prefixed so adjacent strings cannot run together.

use ribbon_layout::{ComponentKind, ComponentTree, NodeId};

use crate::error::Result;

/// Hex digest width kept in records.
const HINT_LEN: usize = 16;

struct Fingerprint(blake3::Hasher);

impl Fingerprint {
    fn new(domain: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain.as_bytes());
        Self(hasher)
    }

    fn field(&mut self, value: &str) {
        self.0.update(&(value.len() as u64).to_le_bytes());
        self.0.update(value.as_bytes());
    }

    fn tag(&mut self, tag: u8) {
        self.0.update(&[tag]);
    }

    fn finish(&self) -> String {
        let hex = self.0.finalize().to_hex();
        hex.as_str()[..HINT_LEN].to_owned()
    }
}

/// Fingerprint the data shape of `tab`.
///
/// The tab must be initialized; a lazy tab that was never resolved hashes
/// as if it had no groups.
pub fn scaling_hint(tree: &ComponentTree, tab: NodeId) -> Result<String> {
    let node = tree.get(tab)?;
    let scaling = tree.scaling(tab)?;
    let mut fp = Fingerprint::new("ribbon-scaling-hint-v1");
    fp.field(node.component_id());

    fp.tag(b'M');
    for (group, size) in scaling.max_sizes_sorted() {
        fp.field(group);
        fp.field(size);
    }

    fp.tag(b'S');
    for step in scaling.steps() {
        fp.field(step.group_id());
        fp.field(step.layout_name());
        fp.field(step.popup_size_hint().unwrap_or_default());
    }

    fp.tag(b'G');
    for group in tree.children(tab) {
        let Some(group) = tree.node(*group).filter(|n| n.kind() == ComponentKind::Group) else {
            continue;
        };
        fp.field(group.component_id());
        for layout in group.children() {
            if let Some(layout) = tree.node(*layout).filter(|n| n.kind() == ComponentKind::Layout) {
                fp.field(layout.title());
            }
        }
    }
    Ok(fp.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ribbon_harness::{home_tab, ribbon_with};

    #[test]
    fn hint_is_stable_for_equal_data() {
        let (a, root_a) = ribbon_with(&[home_tab()]).unwrap();
        let (b, root_b) = ribbon_with(&[home_tab()]).unwrap();
        let tab_a = a.selected_tab(root_a).unwrap().unwrap();
        let tab_b = b.selected_tab(root_b).unwrap().unwrap();
        let hint = scaling_hint(&a, tab_a).unwrap();
        assert_eq!(hint.len(), HINT_LEN);
        assert_eq!(hint, scaling_hint(&b, tab_b).unwrap());
    }

    #[test]
    fn hint_tracks_step_changes() {
        let (mut tree, root) = ribbon_with(&[home_tab()]).unwrap();
        let tab = tree.selected_tab(root).unwrap().unwrap();
        let before = scaling_hint(&tree, tab).unwrap();
        tree.edit_scaling(tab, |s| s.remove_at(8)).unwrap().unwrap();
        assert_ne!(before, scaling_hint(&tree, tab).unwrap());
    }

    #[test]
    fn hint_tracks_layout_titles() {
        let mut def = home_tab();
        let (tree, root) = ribbon_with(&[def.clone()]).unwrap();
        let tab = tree.selected_tab(root).unwrap().unwrap();
        let before = scaling_hint(&tree, tab).unwrap();

        let mut tiny = def.groups[0].layouts[2].clone();
        tiny.title = "Tiny".to_owned();
        def.groups[0].layouts.push(tiny);
        let (tree, root) = ribbon_with(&[def]).unwrap();
        let tab = tree.selected_tab(root).unwrap().unwrap();
        assert_ne!(before, scaling_hint(&tree, tab).unwrap());
    }
}
