use std::io;

use ribbon_layout::LayoutError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised by the ribbon root.
///
/// Scale-search shortfalls (no room, retry budget spent) are not errors;
/// they are reported on [`ScaleOutcome`](crate::ScaleOutcome).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no tab with id `{0}`")]
    TabNotFound(String),

    #[error("no tab belongs to contextual group `{0}`")]
    ContextualGroupNotFound(String),

    #[error("tab `{0}` is disabled or its contextual group is hidden")]
    TabNotSelectable(String),

    #[error("group `{0}` is not collapsed into its popup")]
    PopupNotShown(String),
}

/// Errors loading a [`RibbonConfig`](crate::RibbonConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[cfg(feature = "policy-config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
