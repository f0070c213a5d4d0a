//! Configuration loading for benchcomp.
//!
//! Settings come from a TOML file, with sensible defaults for everything
//! except the benchmark definitions themselves.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Top-level configuration for benchcomp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for significance testing.
    pub hypothesis: HypothesisConfig,
    /// Settings for running benchmarks.
    pub orchestration: OrchestrationConfig,
    /// Settings for the results report.
    pub report: ReportConfig,
    /// Benchmarks to run against every build.
    #[serde(rename = "benchmark")]
    pub benchmarks: Vec<BenchmarkConfig>,
}

/// Configuration for significance testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HypothesisConfig {
    /// Confidence level for highlighting changes (e.g., 0.95 for 95% confidence).
    pub confidence_level: f64,
}

/// Configuration for running benchmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Number of measured runs of every benchmark on every build.
    pub runs: u32,
    /// Number of runs to execute and discard before measuring.
    pub warmup_runs: u32,
}

/// Configuration for the results report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Plot individual samples under each range box.
    pub show_samples: bool,
    /// Highlight significant changes and headings with colors.
    pub colors: bool,
    /// Only show the mean, variation and change columns.
    pub compact: bool,
    /// Output format of the report.
    pub format: ReportFormat,
}

/// Output format of the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Fixed-width table, refreshed after every run on a terminal.
    #[default]
    Table,
    /// Pretty-printed JSON, written once at the end.
    Json,
}

/// A benchmark command and how to read results from its output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Name used to select the benchmark with `--test`.
    pub name: String,
    /// Program and arguments. `{build}` is replaced by the build directory.
    pub command: Vec<String>,
    /// Working directory for the command. `{build}` is replaced as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Regex matched against each stdout line, capturing metric name and value.
    #[serde(default = "default_result_pattern")]
    pub result_pattern: String,
}

/// Matches lines such as `  total time: 123.4`.
pub const DEFAULT_RESULT_PATTERN: &str = r"^\s*([^:]+?)\s*:\s*(\S+)\s*$";

fn default_result_pattern() -> String {
    DEFAULT_RESULT_PATTERN.to_string()
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            runs: 5,
            warmup_runs: 0,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show_samples: false,
            colors: true,
            compact: false,
            format: ReportFormat::Table,
        }
    }
}

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".benchcomp.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from `.benchcomp.toml` in the current directory, or
    /// use defaults when there is no such file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load_or_default() -> Result<Config> {
        let path = Path::new(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from the specified path, or try the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the specified file cannot be read or parsed.
    pub fn load_from(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load_or_default(),
        }
    }

    /// Check settings that the file format cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        let level = self.hypothesis.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            bail!("confidence_level must be between 0 and 1, got {level}");
        }

        if self.orchestration.runs == 0 {
            bail!("runs must be at least 1");
        }

        let mut names = HashSet::new();
        for benchmark in &self.benchmarks {
            if benchmark.name.is_empty() {
                bail!("Benchmark with an empty name");
            }
            if !names.insert(benchmark.name.as_str()) {
                bail!("Duplicate benchmark name: {}", benchmark.name);
            }
            if benchmark.command.is_empty() {
                bail!("Benchmark {} has an empty command", benchmark.name);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.hypothesis.confidence_level, 0.95);
        assert_eq!(config.orchestration.runs, 5);
        assert_eq!(config.orchestration.warmup_runs, 0);
        assert!(!config.report.show_samples);
        assert!(config.report.colors);
        assert!(!config.report.compact);
        assert_eq!(config.report.format, ReportFormat::Table);
        assert!(config.benchmarks.is_empty());
    }

    #[test]
    fn test_load_partial_config() {
        let file = write_config(
            r#"
[hypothesis]
confidence_level = 0.99

[orchestration]
runs = 10
"#,
        );

        let config = Config::load(file.path()).unwrap();

        // Overridden values
        assert_eq!(config.hypothesis.confidence_level, 0.99);
        assert_eq!(config.orchestration.runs, 10);

        // Default values
        assert_eq!(config.orchestration.warmup_runs, 0);
        assert!(config.report.colors);
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
[hypothesis]
confidence_level = 0.9

[orchestration]
runs = 3
warmup_runs = 1

[report]
show_samples = true
colors = false
compact = true
format = "json"

[[benchmark]]
name = "octane"
command = ["{build}/dist/bin/js", "run.js"]
cwd = "bench/octane"
env = { JS_GC_ZEAL = "0" }

[[benchmark]]
name = "startup"
command = ["./startup.sh"]
result_pattern = '^(\w+)=(\d+)$'
"#,
        );

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.hypothesis.confidence_level, 0.9);
        assert_eq!(config.orchestration.runs, 3);
        assert_eq!(config.orchestration.warmup_runs, 1);
        assert!(config.report.show_samples);
        assert!(!config.report.colors);
        assert!(config.report.compact);
        assert_eq!(config.report.format, ReportFormat::Json);

        assert_eq!(config.benchmarks.len(), 2);
        let octane = &config.benchmarks[0];
        assert_eq!(octane.name, "octane");
        assert_eq!(octane.command, vec!["{build}/dist/bin/js", "run.js"]);
        assert_eq!(octane.cwd, Some(PathBuf::from("bench/octane")));
        assert_eq!(octane.env.get("JS_GC_ZEAL").map(String::as_str), Some("0"));
        assert_eq!(octane.result_pattern, DEFAULT_RESULT_PATTERN);

        let startup = &config.benchmarks[1];
        assert!(startup.cwd.is_none());
        assert!(startup.env.is_empty());
        assert_eq!(startup.result_pattern, r"^(\w+)=(\d+)$");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = write_config("this is not valid toml {{{{");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_unknown_format() {
        let file = write_config("[report]\nformat = \"html\"\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let file = write_config("[orchestration]\nwarmup_runs = 2\n");
        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.orchestration.warmup_runs, 2);
    }

    #[test]
    fn test_load_or_default_no_file() {
        // Either loads a file from the working directory or returns defaults.
        assert!(Config::load_or_default().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.hypothesis.confidence_level = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.orchestration.runs = 0;
        assert!(config.validate().is_err());

        let benchmark = BenchmarkConfig {
            name: "a".to_string(),
            command: vec!["true".to_string()],
            cwd: None,
            env: BTreeMap::new(),
            result_pattern: default_result_pattern(),
        };

        let mut config = Config::default();
        config.benchmarks = vec![benchmark.clone(), benchmark.clone()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate benchmark name"));

        let mut config = Config::default();
        config.benchmarks = vec![BenchmarkConfig {
            command: Vec::new(),
            ..benchmark
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.hypothesis.confidence_level,
            parsed.hypothesis.confidence_level
        );
        assert_eq!(config.orchestration.runs, parsed.orchestration.runs);
        assert_eq!(config.report.format, parsed.report.format);
    }
}
