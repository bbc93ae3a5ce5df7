#![forbid(unsafe_code)]

//! Ribbon root and scale search.
//!
//! [`Ribbon`] sits on top of a [`ComponentTree`](ribbon_layout::ComponentTree)
//! and fits the selected tab to the viewport by walking its scaling steps,
//! measuring through the host after every change. Decisions are persisted
//! per tab in a [`ScaleStore`] and replayed when the viewport and data shape
//! match.
//!
//! # Role in the workspace
//! - **Drives**: `ribbon-layout` for all tree mutation and refresh.
//! - **Consumes**: a host implementing [`Host`](ribbon_layout::Host).
//!
//! # Feature Flags
//!
//! - `policy-config` (default): load [`RibbonConfig`] from TOML.
//! - `state-persistence` (default): [`FileScaleStore`] on disk.

pub mod commands;
pub mod config;
pub mod error;
pub mod hint;
pub mod ribbon;
pub mod scale_cache;
pub mod scale_search;

pub use commands::{AllEnabled, CommandHandler};
pub use config::{RefreshPolicyConfig, RibbonConfig, ScalePolicyConfig};
pub use error::{ConfigError, Result, RuntimeError};
pub use hint::scaling_hint;
pub use ribbon::{RIBBON_ID, Ribbon, RibbonEvent};
#[cfg(feature = "state-persistence")]
pub use scale_cache::FileScaleStore;
pub use scale_cache::{MemoryScaleStore, ScaleRecord, ScaleStore};
pub use scale_search::{Room, ScaleEvidence, ScaleOutcome};
