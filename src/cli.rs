//! Command-line arguments.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Cooperative sector report generator.
///
/// Loads the catalog and record CSV files once, then prints and exports the
/// dashboard, credit, diversity and geographic views.
///
/// Examples:
///   coop_report
///   coop_report --batch --data-root ./datos --output-dir ./out
///   coop_report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for coop_report.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory containing the catalogos/ and datos/ folders
    #[arg(long, value_name = "DIR", env = "COOP_REPORT_DATA")]
    pub data_root: Option<PathBuf>,

    /// Directory where CSV exports and summary.json are written
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of departments in the portfolio ranking
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Load and generate once without the interactive menu
    #[arg(long)]
    pub batch: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Write a default coop_report.toml and exit
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Apply flag overrides on top of the file configuration.
    pub fn merge_into(&self, mut config: Config) -> Config {
        if let Some(root) = &self.data_root {
            config.data.root = root.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.report.output_dir = dir.clone();
        }
        if let Some(top) = self.top {
            config.report.top_departments = top;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "coop_report",
            "--data-root",
            "/tmp/d",
            "--top",
            "18",
            "--batch",
        ]);
        let config = args.merge_into(Config::default());
        assert!(args.batch);
        assert_eq!(config.data.root, PathBuf::from("/tmp/d"));
        assert_eq!(config.report.top_departments, 18);
        assert_eq!(config.report.output_dir, PathBuf::from("reports"));
    }

    #[test]
    fn no_flags_keep_config() {
        let args = Args::parse_from(["coop_report"]);
        let mut base = Config::default();
        base.report.top_departments = 7;
        let config = args.merge_into(base);
        assert_eq!(config.report.top_departments, 7);
        assert!(!args.batch && !args.verbose);
    }
}
