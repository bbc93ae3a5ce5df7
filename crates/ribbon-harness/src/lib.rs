#![forbid(unsafe_code)]

//! Test harness for the ribbon engine.
//!
//! - [`synthetic::SyntheticHost`]: an in-memory host that lays out elements
//!   from declared control sizes, so scale passes can be measured without a
//!   real document.
//! - [`fixtures`]: ready-made tab definitions with known geometry.
//! - [`snapshot`]: deterministic text snapshots, blake3 checksums, and a
//!   JSONL case log.

pub mod fixtures;
pub mod snapshot;
pub mod synthetic;

pub use fixtures::{home_tab, picture_tab, ribbon_with};
pub use snapshot::{CaseLog, CaseOutcome, layout_snapshot, snapshot_checksum};
pub use synthetic::{SyntheticHost, SyntheticMetrics};
