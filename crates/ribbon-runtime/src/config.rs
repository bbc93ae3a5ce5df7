#![forbid(unsafe_code)]

//! Tunable ribbon behavior as data.
//!
//! ```toml
//! [scale]
//! retry_budget = 25
//! min_visible_width = 100
//! scale_up_margin = 10
//! use_cache = true
//!
//! [refresh]
//! force_full = false
//! ```
//!
//! Every field has a default, so a partial file is fine. Environment
//! overrides are applied on top with [`RibbonConfig::apply_env_overrides`].

#[cfg(feature = "policy-config")]
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Forces every refresh to rebuild (`1`/`true`/`yes`/`on`).
pub const ENV_FULL_REFRESH: &str = "RIBBON_FULL_REFRESH";
/// Disables the scale-cache fast path (`0`/`false`/`no`/`off`).
pub const ENV_SCALE_CACHE: &str = "RIBBON_SCALE_CACHE";
/// Overrides the scale-search iteration bound.
pub const ENV_RETRY_BUDGET: &str = "RIBBON_SCALE_RETRY_BUDGET";

/// Top-level ribbon configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonConfig {
    pub scale: ScalePolicyConfig,
    pub refresh: RefreshPolicyConfig,
}

/// Scale-search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalePolicyConfig {
    /// Upper bound on scale steps tried in one pass.
    pub retry_budget: u32,
    /// Below this viewport width the ribbon is hidden instead of scaled.
    pub min_visible_width: u32,
    /// Horizontal slack required before attempting to scale up.
    pub scale_up_margin: u32,
    /// Replay persisted decisions when viewport and data shape match.
    pub use_cache: bool,
}

impl Default for ScalePolicyConfig {
    fn default() -> Self {
        Self {
            retry_budget: 25,
            min_visible_width: 100,
            scale_up_margin: 10,
            use_cache: true,
        }
    }
}

/// Refresh parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshPolicyConfig {
    /// Rebuild every visited node regardless of dirty state.
    pub force_full: bool,
}

fn retry_budget_error(budget: u32) -> Option<String> {
    match budget {
        0 => Some("scale.retry_budget must be > 0".into()),
        b if b > 1000 => Some(format!("scale.retry_budget must be <= 1000, got {b}")),
        _ => None,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl RibbonConfig {
    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Validate parameter ranges. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(retry_budget_error(self.scale.retry_budget));
        if self.scale.min_visible_width == 0 {
            errors.push("scale.min_visible_width must be > 0".into());
        }
        errors
    }

    /// Fail with [`ConfigError::Validation`] unless [`validate`](Self::validate) is clean.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`.
    ///
    /// Unparseable values and retry budgets [`validate`](Self::validate)
    /// would reject are logged and ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(flag) = lookup(ENV_FULL_REFRESH).as_deref().and_then(parse_flag) {
            self.refresh.force_full = flag;
        }
        if let Some(flag) = lookup(ENV_SCALE_CACHE).as_deref().and_then(parse_flag) {
            self.scale.use_cache = flag;
        }
        if let Some(raw) = lookup(ENV_RETRY_BUDGET) {
            match raw.trim().parse::<u32>() {
                Ok(budget) => match retry_budget_error(budget) {
                    None => self.scale.retry_budget = budget,
                    Some(error) => tracing::warn!(value = %raw, "ignoring {ENV_RETRY_BUDGET}: {error}"),
                },
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid {ENV_RETRY_BUDGET}"),
            }
        }
    }

    /// Format as a JSONL line for structured logging.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        format!(
            r#"{{"schema":"ribbon-config-v1","retry_budget":{},"min_visible_width":{},"scale_up_margin":{},"use_cache":{},"force_full":{}}}"#,
            self.scale.retry_budget,
            self.scale.min_visible_width,
            self.scale.scale_up_margin,
            self.scale.use_cache,
            self.refresh.force_full,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let config = RibbonConfig::default();
        assert_eq!(config.scale.retry_budget, 25);
        assert_eq!(config.scale.min_visible_width, 100);
        assert_eq!(config.scale.scale_up_margin, 10);
        assert!(config.scale.use_cache);
        assert!(!config.refresh.force_full);
        assert!(config.validate().is_empty());
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RibbonConfig::from_toml_str("[scale]\nretry_budget = 8\n").unwrap();
        assert_eq!(config.scale.retry_budget, 8);
        assert_eq!(config.scale.min_visible_width, 100);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ribbon.toml");
        std::fs::write(&path, "[refresh]\nforce_full = true\n").unwrap();
        let config = RibbonConfig::from_toml_file(&path).unwrap();
        assert!(config.refresh.force_full);
    }

    #[test]
    fn json_round_trip() {
        let config = RibbonConfig::from_json_str(r#"{"scale":{"use_cache":false}}"#).unwrap();
        assert!(!config.scale.use_cache);
        assert_eq!(config.scale.retry_budget, 25);
    }

    #[test]
    fn validation_reports_every_problem() {
        let mut config = RibbonConfig::default();
        config.scale.retry_budget = 0;
        config.scale.min_visible_width = 0;
        assert_eq!(config.validate().len(), 2);
        assert!(matches!(
            config.validated(),
            Err(ConfigError::Validation(errors)) if errors.len() == 2
        ));
    }

    #[test]
    fn overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            (ENV_FULL_REFRESH, "1"),
            (ENV_SCALE_CACHE, "off"),
            (ENV_RETRY_BUDGET, "many"),
        ]
        .into_iter()
        .collect();
        let mut config = RibbonConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| (*v).to_owned()));
        assert!(config.refresh.force_full);
        assert!(!config.scale.use_cache);
        assert_eq!(config.scale.retry_budget, 25);
    }

    #[test]
    fn out_of_range_budget_override_is_ignored() {
        for raw in ["0", "1001"] {
            let mut config = RibbonConfig::default();
            config.apply_overrides_from(|k| (k == ENV_RETRY_BUDGET).then(|| raw.to_owned()));
            assert_eq!(config.scale.retry_budget, 25, "{raw}");
            assert!(config.validate().is_empty());
        }
        let mut config = RibbonConfig::default();
        config.apply_overrides_from(|k| (k == ENV_RETRY_BUDGET).then(|| " 40 ".to_owned()));
        assert_eq!(config.scale.retry_budget, 40);
    }

    #[test]
    fn full_refresh_flag_words() {
        for (raw, expected) in [("yes", true), ("ON", true), ("1", true), ("off", false), ("No", false)] {
            let mut config = RibbonConfig::default();
            config.refresh.force_full = !expected;
            config.apply_overrides_from(|k| (k == ENV_FULL_REFRESH).then(|| raw.to_owned()));
            assert_eq!(config.refresh.force_full, expected, "{raw}");
        }
    }

    #[test]
    fn jsonl_is_valid_json() {
        let line = RibbonConfig::default().to_jsonl();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["schema"], "ribbon-config-v1");
        assert_eq!(value["retry_budget"], 25);
    }
}
