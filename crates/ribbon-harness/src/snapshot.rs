#![forbid(unsafe_code)]

//! Deterministic snapshots and a JSONL case log.
//!
//! A snapshot is a plain-text dump of every loaded tab's scale position and
//! every group's shown layout. Equal trees always produce byte-equal
//! snapshots, so checksums can be compared across runs.
//!
//! # JSONL Schema
//!
//! ```json
//! {"event":"start","case":"home_shrink"}
//! {"event":"pass","viewport":{"width":400,"height":120},"evidence":{...}}
//! {"event":"snapshot","checksum":"blake3:..."}
//! {"event":"complete","outcome":"pass","checksums":["blake3:..."]}
//! ```

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use ribbon_core::geometry::Size;
use ribbon_layout::{ComponentKind, ComponentTree, NodeId};
use serde::Serialize;
use serde_json::json;

/// Prefix marking the checksum algorithm in logs.
pub const CHECKSUM_PREFIX: &str = "blake3:";

/// Text dump of tab positions and shown layouts under `root`.
#[must_use]
pub fn layout_snapshot(tree: &ComponentTree, root: NodeId) -> String {
    let mut out = String::new();
    let selected = tree.selected_tab(root).ok().flatten();
    for &tab in tree.children(root) {
        let Some(node) = tree.node(tab) else {
            continue;
        };
        let index = tree
            .scale_position(tab)
            .map_or(i32::MIN, |p| p.index());
        let marker = if Some(tab) == selected { "*" } else { " " };
        let _ = writeln!(out, "{marker}tab {} index={index}", node.component_id());
        for &group in tree.children(tab) {
            let Some(group_node) = tree.node(group) else {
                continue;
            };
            if group_node.kind() != ComponentKind::Group {
                continue;
            }
            let shown = tree
                .selected_layout_title(group)
                .ok()
                .flatten()
                .unwrap_or("-");
            let _ = writeln!(out, "  group {} -> {shown}", group_node.component_id());
        }
    }
    out
}

/// Prefixed blake3 checksum of `text`.
#[must_use]
pub fn snapshot_checksum(text: &str) -> String {
    format!("{CHECKSUM_PREFIX}{}", blake3::hash(text.as_bytes()).to_hex())
}

/// Case outcome recorded by [`CaseLog::log_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOutcome {
    Pass,
    Fail,
}

impl CaseOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

/// In-memory JSONL log for one test case.
#[derive(Debug, Clone, Default)]
pub struct CaseLog {
    case: String,
    lines: Vec<String>,
    checksums: Vec<String>,
}

impl CaseLog {
    #[must_use]
    pub fn new(case: impl Into<String>) -> Self {
        let case = case.into();
        let start = json!({"event": "start", "case": &case}).to_string();
        Self {
            case,
            lines: vec![start],
            checksums: Vec::new(),
        }
    }

    fn push(&mut self, value: serde_json::Value) {
        self.lines.push(value.to_string());
    }

    /// Record one scale pass with its evidence payload.
    pub fn log_pass<E: Serialize>(&mut self, viewport: Size, evidence: &E) {
        let evidence = serde_json::to_value(evidence).unwrap_or(serde_json::Value::Null);
        self.push(json!({
            "event": "pass",
            "viewport": viewport,
            "evidence": evidence,
        }));
    }

    /// Snapshot the tree and record its checksum. Returns the checksum.
    pub fn log_snapshot(&mut self, tree: &ComponentTree, root: NodeId) -> String {
        let checksum = snapshot_checksum(&layout_snapshot(tree, root));
        self.push(json!({"event": "snapshot", "checksum": checksum}));
        self.checksums.push(checksum.clone());
        checksum
    }

    pub fn log_complete(&mut self, outcome: CaseOutcome) {
        let checksums = self.checksums.clone();
        self.push(json!({
            "event": "complete",
            "outcome": outcome.as_str(),
            "checksums": checksums,
        }));
    }

    #[must_use]
    pub fn case(&self) -> &str {
        &self.case
    }

    #[must_use]
    pub fn checksums(&self) -> &[String] {
        &self.checksums
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_jsonl())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{home_tab, picture_tab, ribbon_with};

    #[test]
    fn snapshot_lists_tabs_and_layouts() {
        let (mut tree, root) = ribbon_with(&[home_tab(), picture_tab()]).unwrap();
        let tab = tree.selected_tab(root).unwrap().unwrap();
        tree.scale_index(tab, 1).unwrap();
        let text = layout_snapshot(&tree, root);
        assert!(text.starts_with("*tab Ribbon.Home index=1\n"));
        assert!(text.contains("  group Ribbon.Home.Font -> Medium\n"));
        assert!(text.contains("  group Ribbon.Home.Clipboard -> Large\n"));
        assert!(text.contains(" tab Ribbon.PictureFormat index=-2\n"));
        assert!(text.contains("  group Ribbon.PictureFormat.Adjust -> -\n"));
    }

    #[test]
    fn checksum_is_stable() {
        let a = snapshot_checksum("tab x");
        assert_eq!(a, snapshot_checksum("tab x"));
        assert_ne!(a, snapshot_checksum("tab y"));
        assert!(a.starts_with(CHECKSUM_PREFIX));
    }

    #[test]
    fn case_log_emits_jsonl() {
        let (tree, root) = ribbon_with(&[home_tab()]).unwrap();
        let mut log = CaseLog::new("home");
        log.log_pass(Size::new(400, 120), &json!({"index": 2}));
        log.log_snapshot(&tree, root);
        log.log_complete(CaseOutcome::Pass);
        let parsed: Vec<serde_json::Value> = log
            .to_jsonl()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0]["event"], "start");
        assert_eq!(parsed[1]["viewport"]["width"], 400);
        assert_eq!(parsed[3]["outcome"], "pass");
        assert_eq!(parsed[3]["checksums"].as_array().unwrap().len(), 1);
    }
}
