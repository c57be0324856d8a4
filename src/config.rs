//! Report configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! { "output_dir": "plots", "chart": { "width": 1024 }, "delete_artifacts": false }
//! ```

use crate::error::ConfigError;
use crate::layout::PageGeometry;
use crate::pdf::ArtifactReadPolicy;
use crate::render::MAX_CANVAS_SIDE;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_TITLE: &str = "Data Visualization Report";
pub const DEFAULT_REPORT_FILE: &str = "data_visualization_report.pdf";

/// Pixel size of each rendered chart
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_delete_artifacts() -> bool {
    true
}

fn default_pie_cardinality_warning() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportConfig {
    /// Where chart images are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub chart: ChartOptions,
    #[serde(default)]
    pub page: PageGeometry,
    #[serde(default = "default_title")]
    pub title: String,
    /// Remove chart images once the report is written
    #[serde(default = "default_delete_artifacts")]
    pub delete_artifacts: bool,
    /// Upper bound on auto-generated scatter plots; unbounded when absent
    #[serde(default)]
    pub max_scatter_pairs: Option<usize>,
    /// Pie charts over more distinct values than this log a warning
    #[serde(default = "default_pie_cardinality_warning")]
    pub pie_cardinality_warning: usize,
    #[serde(default)]
    pub artifact_read_policy: ArtifactReadPolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            chart: ChartOptions::default(),
            page: PageGeometry::default(),
            title: default_title(),
            delete_artifacts: default_delete_artifacts(),
            max_scatter_pairs: None,
            pie_cardinality_warning: default_pie_cardinality_warning(),
            artifact_read_policy: ArtifactReadPolicy::default(),
        }
    }
}

impl ReportConfig {
    /// Parse a JSON config string and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ReportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let side_ok = |side: u32| (1..=MAX_CANVAS_SIDE).contains(&side);
        if !side_ok(self.chart.width) || !side_ok(self.chart.height) {
            return Err(ConfigError::Invalid(format!(
                "chart size must be between 1 and {} pixels per side, got {}x{}",
                MAX_CANVAS_SIDE, self.chart.width, self.chart.height
            )));
        }
        self.page.validate().map_err(ConfigError::Invalid)?;
        if self.max_scatter_pairs == Some(0) {
            debug!("max_scatter_pairs is 0, scatter plots are disabled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::default();
        assert_eq!(config.chart, ChartOptions { width: 800, height: 600 });
        assert_eq!(config.title, "Data Visualization Report");
        assert!(config.delete_artifacts);
        assert_eq!(config.max_scatter_pairs, None);
        assert_eq!(config.artifact_read_policy, ArtifactReadPolicy::Abort);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(ReportConfig::from_json("{}").unwrap(), ReportConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = ReportConfig::from_json(
            r#"{
                "output_dir": "plots",
                "chart": { "width": 1024 },
                "max_scatter_pairs": 3,
                "artifact_read_policy": "skip"
            }"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("plots"));
        assert_eq!(config.chart.width, 1024);
        assert_eq!(config.chart.height, 600);
        assert_eq!(config.max_scatter_pairs, Some(3));
        assert_eq!(config.artifact_read_policy, ArtifactReadPolicy::Skip);
    }

    #[test]
    fn test_invalid_chart_size() {
        let err = ReportConfig::from_json(r#"{ "chart": { "height": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_oversized_chart_rejected() {
        let err = ReportConfig::from_json(r#"{ "chart": { "width": 40000, "height": 40000 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("40000x40000"));

        let config =
            ReportConfig::from_json(r#"{ "chart": { "width": 10000, "height": 10000 } }"#).unwrap();
        assert_eq!(config.chart.width, MAX_CANVAS_SIDE);
    }

    #[test]
    fn test_invalid_geometry() {
        let err = ReportConfig::from_json(r#"{ "page": { "image_height": -5 } }"#).unwrap_err();
        assert!(err.to_string().contains("image_height"));
    }

    #[test]
    fn test_malformed_json() {
        let err = ReportConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ReportConfig::from_json_file(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
