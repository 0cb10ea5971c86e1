// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tunable heuristics for ingestion
//!
//! Every numeric constant the extractors rely on lives here so that it can
//! be adjusted per authoring convention without a rebuild:
//!
//! ```toml
//! [dxf]
//! floor_tokens = ["level", "floor", "storey", "story", "geschoss"]
//! millimetre_threshold = 1000.0
//! area_efficiency = 0.82
//!
//! [placeholder]
//! padding = 1.5
//!
//! [labels]
//! unassigned = "Unassigned"
//! ```

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV: &str = "PLAN_LITE_CONFIG";

/// Root of the ingestion configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub dxf: DxfConfig,
    #[serde(default)]
    pub placeholder: PlaceholderConfig,
    #[serde(default)]
    pub labels: LabelConfig,
}

impl IngestConfig {
    /// Load from an explicit path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|source| ConfigError::Parse { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `PLAN_LITE_CONFIG`, or fall back to defaults
    pub fn discover() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => {
                log::debug!("Loading ingest config from {:?}", path);
                Self::from_file(PathBuf::from(path))
            }
            None => Ok(Self::default()),
        }
    }

    /// Reject values no extractor can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dxf = &self.dxf;
        if !(dxf.area_efficiency > 0.0 && dxf.area_efficiency <= 1.0) {
            return Err(ConfigError::invalid("dxf.area_efficiency", "must be in (0, 1]"));
        }
        if !(dxf.default_scale > 0.0) {
            return Err(ConfigError::invalid("dxf.default_scale", "must be positive"));
        }
        if !(dxf.millimetre_threshold > 0.0) {
            return Err(ConfigError::invalid("dxf.millimetre_threshold", "must be positive"));
        }
        if dxf.closure_tolerance < 0.0 {
            return Err(ConfigError::invalid("dxf.closure_tolerance", "must not be negative"));
        }
        let placeholder = &self.placeholder;
        if !(placeholder.min_side > 0.0 && placeholder.default_side > 0.0) {
            return Err(ConfigError::invalid("placeholder", "sides must be positive"));
        }
        if placeholder.padding < 0.0 {
            return Err(ConfigError::invalid("placeholder.padding", "must not be negative"));
        }
        Ok(())
    }
}

/// Vector-drawing heuristics
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DxfConfig {
    /// Layer-name tokens marking a floor outline
    pub floor_tokens: Vec<String>,
    /// Layer-name tokens marking the site / plot boundary
    pub site_tokens: Vec<String>,
    /// Largest extent at or above which undeclared units are read as millimetres
    pub millimetre_threshold: f64,
    /// Unit-to-meter factor applied when the extent heuristic picks millimetres
    pub default_scale: f64,
    /// Net-to-gross floor area ratio
    pub area_efficiency: f64,
    /// Distance under which first and last vertex count as coincident
    pub closure_tolerance: f64,
}

impl Default for DxfConfig {
    fn default() -> Self {
        Self {
            floor_tokens: ["level", "floor", "storey", "story"]
                .into_iter()
                .map(String::from)
                .collect(),
            site_tokens: ["site", "plot", "boundary"]
                .into_iter()
                .map(String::from)
                .collect(),
            millimetre_threshold: 1000.0,
            default_scale: 0.001,
            area_efficiency: 0.82,
            closure_tolerance: 1e-6,
        }
    }
}

/// Placeholder boundaries for declarative units
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Smallest side of a square synthesized from an area
    pub min_side: f64,
    /// Side used when a unit declares no area
    pub default_side: f64,
    /// Gap between neighbouring placeholders and between floor rows
    pub padding: f64,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            min_side: 3.0,
            default_side: 3.0,
            padding: 1.5,
        }
    }
}

/// Names of synthetic buckets
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Drawing outlines on layers that match no floor token
    pub unassigned: String,
    /// Every outline, when no layer matches a floor token
    pub model_space: String,
    /// Levels for spaces without a storey, and for documents without levels
    pub default_storey: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            unassigned: "Unassigned".to_string(),
            model_space: "Model Space".to_string(),
            default_storey: "Default Storey".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config{}: {source}", describe_path(path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config value {key}: {message}")]
    Invalid { key: String, message: String },
}

fn describe_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" file {:?}", p))
        .unwrap_or_default()
}

impl ConfigError {
    fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = IngestConfig::default();
        assert_eq!(cfg.dxf.millimetre_threshold, 1000.0);
        assert_eq!(cfg.dxf.default_scale, 0.001);
        assert_eq!(cfg.dxf.area_efficiency, 0.82);
        assert_eq!(cfg.placeholder.min_side, 3.0);
        assert_eq!(cfg.placeholder.padding, 1.5);
        assert_eq!(cfg.labels.model_space, "Model Space");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let cfg = IngestConfig::from_toml_str(
            r#"
            [dxf]
            area_efficiency = 0.75

            [labels]
            unassigned = "Loose"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.dxf.area_efficiency, 0.75);
        assert_eq!(cfg.dxf.floor_tokens.len(), 4);
        assert_eq!(cfg.labels.unassigned, "Loose");
        assert_eq!(cfg.labels.default_storey, "Default Storey");
        assert_eq!(cfg.placeholder, PlaceholderConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = IngestConfig::from_toml_str("[dxf]\narea_efficiency = 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { ref key, .. } if key == "dxf.area_efficiency"
        ));

        let err = IngestConfig::from_toml_str("[placeholder]\npadding = \"wide\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: None, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [dxf]
            floor_tokens = ["geschoss"]

            [placeholder]
            default_side = 4.0
            "#
        )
        .unwrap();

        let cfg = IngestConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.dxf.floor_tokens, vec!["geschoss".to_string()]);
        assert_eq!(cfg.placeholder.default_side, 4.0);
        assert_eq!(cfg.placeholder.min_side, 3.0);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = IngestConfig::from_file("/nonexistent/plan-lite.toml").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("plan-lite.toml")),
            other => panic!("expected io error, got {:?}", other),
        }
    }
}
