//! Configuration file handling.
//!
//! Settings come from an optional `coop_report.toml`; command-line flags
//! override individual values afterwards.

use crate::loader::DataPaths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "coop_report.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Location of the CSV files.
    #[serde(default)]
    pub data: DataConfig,

    /// Report generation settings.
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding both the catalog and the record directories.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_catalogs_dir")]
    pub catalogs_dir: String,

    #[serde(default = "default_records_dir")]
    pub records_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            catalogs_dir: default_catalogs_dir(),
            records_dir: default_records_dir(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("datos")
}

fn default_catalogs_dir() -> String {
    "catalogos".to_string()
}

fn default_records_dir() -> String {
    "datos".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Where CSV exports and `summary.json` are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Departments kept in the portfolio ranking.
    #[serde(default = "default_top")]
    pub top_departments: usize,

    /// Departments kept in the affiliates-by-department table.
    #[serde(default = "default_top")]
    pub department_chart_limit: usize,

    /// Rows shown in each console preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Women-in-boards share (percent) below which the KPI is flagged.
    #[serde(default = "default_parity_threshold")]
    pub board_parity_threshold: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            top_departments: default_top(),
            department_chart_limit: default_top(),
            preview_rows: default_preview_rows(),
            board_parity_threshold: default_parity_threshold(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_top() -> usize {
    10
}

fn default_preview_rows() -> usize {
    5
}

fn default_parity_threshold() -> f64 {
    40.0
}

impl Config {
    /// Load from `path`. A missing default file yields the defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !path.exists() {
            if explicit {
                anyhow::bail!("config file not found: {}", path.display());
            }
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    pub fn data_paths(&self) -> DataPaths {
        DataPaths {
            catalogs: self.data.root.join(&self.data.catalogs_dir),
            records: self.data.root.join(&self.data.records_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.data.root, PathBuf::from("datos"));
        assert_eq!(config.report.top_departments, 10);
        assert_eq!(config.report.board_parity_threshold, 40.0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [data]
            root = "/srv/consucoop"

            [report]
            top_departments = 18
            "#,
        )
        .unwrap();
        assert_eq!(config.data.catalogs_dir, "catalogos");
        assert_eq!(config.report.top_departments, 18);
        assert_eq!(config.report.department_chart_limit, 10);

        let paths = config.data_paths();
        assert_eq!(paths.catalogs, PathBuf::from("/srv/consucoop/catalogos"));
        assert_eq!(paths.records, PathBuf::from("/srv/consucoop/datos"));
    }

    #[test]
    fn default_toml_round_trips() {
        let text = Config::default_toml().unwrap();
        let config = Config::from_toml(&text).unwrap();
        assert_eq!(config.report.preview_rows, 5);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn loads_file_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("coop_report.toml");
        std::fs::write(&path, "[report]\npreview_rows = 2\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.report.preview_rows, 2);
    }
}
