//! Command-line interface for benchcomp.

use crate::config::{Config, ReportFormat};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "benchcomp")]
#[command(about = "Run benchmarks against several builds and compare the results")]
#[command(version)]
pub struct Cli {
    /// Build to test: a directory optionally followed by key=value prefs
    /// (repeatable; the first build is the baseline)
    #[arg(short = 'b', long = "build", value_name = "SPEC", required = true)]
    pub builds: Vec<String>,

    /// Only run the named benchmark (repeatable)
    #[arg(short = 't', long = "test", value_name = "NAME")]
    pub tests: Vec<String>,

    /// Number of measured runs per benchmark and build
    #[arg(short = 'n', long)]
    pub runs: Option<u32>,

    /// Number of discarded warmup runs
    #[arg(long)]
    pub warmup_runs: Option<u32>,

    /// Confidence level for highlighting changes (0.0-1.0)
    #[arg(long)]
    pub confidence_level: Option<f64>,

    /// Plot individual samples under each range box
    #[arg(short, long)]
    pub show_samples: bool,

    /// Only show mean, variation and change columns
    #[arg(long)]
    pub compact: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the final report to a file instead of the terminal
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,

    /// Path to config file (defaults to .benchcomp.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values. Flags only ever
    /// switch a setting on; an absent flag leaves the file's value alone.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(runs) = self.runs {
            config.orchestration.runs = runs;
        }

        if let Some(warmup_runs) = self.warmup_runs {
            config.orchestration.warmup_runs = warmup_runs;
        }

        if let Some(confidence_level) = self.confidence_level {
            config.hypothesis.confidence_level = confidence_level;
        }

        if self.show_samples {
            config.report.show_samples = true;
        }
        if self.compact {
            config.report.compact = true;
        }
        if self.json {
            config.report.format = ReportFormat::Json;
        }
        if self.no_color || self.output.is_some() {
            config.report.colors = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        let cli = Cli::parse_from([
            "benchcomp",
            "-b",
            "obj-base",
            "--build",
            "obj-patched gc.zeal=2",
            "-t",
            "octane",
            "-n",
            "10",
            "--warmup-runs",
            "2",
            "-s",
            "--verbose",
        ]);

        assert_eq!(cli.builds, vec!["obj-base", "obj-patched gc.zeal=2"]);
        assert_eq!(cli.tests, vec!["octane"]);
        assert_eq!(cli.runs, Some(10));
        assert_eq!(cli.warmup_runs, Some(2));
        assert!(cli.show_samples);
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_parse_minimal() {
        let cli = Cli::parse_from(["benchcomp", "-b", "obj"]);

        assert_eq!(cli.builds, vec!["obj"]);
        assert!(cli.tests.is_empty());
        assert_eq!(cli.runs, None);
        assert_eq!(cli.warmup_runs, None);
        assert_eq!(cli.confidence_level, None);
        assert!(cli.config.is_none());
        assert!(cli.output.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_requires_build() {
        assert!(Cli::try_parse_from(["benchcomp"]).is_err());
    }

    #[test]
    fn test_cli_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["benchcomp", "-b", "obj", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_apply_to_config_with_overrides() {
        let cli = Cli::parse_from([
            "benchcomp",
            "-b",
            "obj",
            "-n",
            "20",
            "--warmup-runs",
            "3",
            "--confidence-level",
            "0.99",
            "--compact",
            "--json",
            "--no-color",
        ]);

        let mut config = Config::default();
        cli.apply_to_config(&mut config);

        assert_eq!(config.orchestration.runs, 20);
        assert_eq!(config.orchestration.warmup_runs, 3);
        assert_eq!(config.hypothesis.confidence_level, 0.99);
        assert!(config.report.compact);
        assert_eq!(config.report.format, ReportFormat::Json);
        assert!(!config.report.colors);
    }

    #[test]
    fn test_apply_to_config_without_overrides() {
        let cli = Cli::parse_from(["benchcomp", "-b", "obj"]);

        let mut config = Config::default();
        config.report.show_samples = true;
        config.orchestration.runs = 7;
        cli.apply_to_config(&mut config);

        // Values from the file should remain unchanged
        assert!(config.report.show_samples);
        assert_eq!(config.orchestration.runs, 7);
        assert_eq!(config.hypothesis.confidence_level, 0.95);
        assert!(config.report.colors);
        assert_eq!(config.report.format, ReportFormat::Table);
    }

    #[test]
    fn test_output_file_disables_colors() {
        let cli = Cli::parse_from(["benchcomp", "-b", "obj", "-o", "report.txt"]);

        let mut config = Config::default();
        cli.apply_to_config(&mut config);

        assert_eq!(cli.output, Some(PathBuf::from("report.txt")));
        assert!(!config.report.colors);
    }
}
