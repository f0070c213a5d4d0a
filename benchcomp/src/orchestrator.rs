//! Benchmark orchestration.
//!
//! The orchestrator runs every selected benchmark against every build,
//! interleaving the builds within each run so that drift on the machine
//! affects them all alike. Each run's output is parsed into the build's
//! result set and the live report is refreshed.

use std::path::PathBuf;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use benchcomp_core::{BuildResults, DisplaySink, ReportError, Reporter, ResultSet};

use crate::build::Build;
use crate::config::BenchmarkConfig;
use crate::runner::{CommandSpec, ProcessRunner, RunnerError};

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Running a command failed or was interrupted.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// A benchmark exited unsuccessfully.
    #[error(
        "Error running benchmark {benchmark} for build {build} ({}):\n{command}\nstdout:\n{stdout}\nstderr:\n{stderr}",
        exit_status(.exit_code)
    )]
    BenchmarkFailed {
        benchmark: String,
        build: String,
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// A result pattern is not a valid regex or lacks the capture groups.
    #[error("Invalid result pattern for benchmark {benchmark}: {reason}")]
    InvalidPattern { benchmark: String, reason: String },

    /// Rendering the live report failed.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// There is nothing to benchmark.
    #[error("No builds given")]
    NoBuilds,

    /// No benchmarks are configured or selected.
    #[error("No benchmarks to run")]
    NoBenchmarks,

    /// A requested benchmark is not configured.
    #[error("Unknown benchmark: {0}")]
    UnknownBenchmark(String),
}

impl OrchestratorError {
    /// Whether the run stopped because the user interrupted it.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Runner(RunnerError::Interrupted { .. }))
    }
}

fn exit_status(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "killed by signal".to_string(),
    }
}

/// A benchmark ready to run against any build.
#[derive(Debug, Clone)]
pub struct Benchmark {
    /// Name of the benchmark.
    pub name: String,
    command: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    pattern: Regex,
}

impl Benchmark {
    /// Create a benchmark from its command line and result pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regex with at least two
    /// capture groups.
    pub fn new<I, S>(name: &str, command: I, pattern: &str) -> Result<Self, OrchestratorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invalid = |reason: String| OrchestratorError::InvalidPattern {
            benchmark: name.to_string(),
            reason,
        };

        let pattern = Regex::new(pattern).map_err(|e| invalid(e.to_string()))?;
        // Group 0 is the whole match.
        if pattern.captures_len() < 3 {
            return Err(invalid(
                "expected capture groups for the metric name and value".to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            command: command.into_iter().map(Into::into).collect(),
            cwd: None,
            env: Vec::new(),
            pattern,
        })
    }

    /// Create a benchmark from its configuration entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the result pattern is invalid.
    pub fn from_config(config: &BenchmarkConfig) -> Result<Self, OrchestratorError> {
        let mut benchmark = Self::new(
            &config.name,
            config.command.iter().cloned(),
            &config.result_pattern,
        )?;
        benchmark.cwd = config.cwd.clone();
        benchmark.env = config
            .env
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(benchmark)
    }

    /// The command line for running this benchmark against `build`.
    pub fn command_for(&self, build: &Build) -> CommandSpec {
        let mut env = self.env.clone();
        env.extend(build.env());

        CommandSpec {
            argv: self.command.iter().map(|arg| build.expand(arg)).collect(),
            env,
            cwd: self
                .cwd
                .as_ref()
                .map(|cwd| PathBuf::from(build.expand(&cwd.to_string_lossy()))),
        }
    }

    /// Add one sample per matching line of `stdout` to `results`.
    ///
    /// Returns the number of samples added.
    pub fn parse_output(&self, stdout: &str, results: &mut ResultSet) -> usize {
        let mut added = 0;

        for line in stdout.lines() {
            let Some(captures) = self.pattern.captures(line) else {
                continue;
            };
            let (Some(metric), Some(value)) = (captures.get(1), captures.get(2)) else {
                continue;
            };

            match value.as_str().parse::<f64>() {
                Ok(value) if value.is_finite() => {
                    results.add_result(metric.as_str(), value);
                    added += 1;
                }
                _ => debug!(
                    benchmark = %self.name,
                    line,
                    "Ignoring line without a numeric value"
                ),
            }
        }

        added
    }
}

/// Pick the benchmarks named in `names`, in that order, or every configured
/// benchmark when `names` is empty.
///
/// # Errors
///
/// Returns an error for an unknown name or an invalid result pattern.
pub fn select_benchmarks(
    configs: &[BenchmarkConfig],
    names: &[String],
) -> Result<Vec<Benchmark>, OrchestratorError> {
    if names.is_empty() {
        return configs.iter().map(Benchmark::from_config).collect();
    }

    names
        .iter()
        .map(|name| {
            configs
                .iter()
                .find(|config| &config.name == name)
                .ok_or_else(|| OrchestratorError::UnknownBenchmark(name.clone()))
                .and_then(Benchmark::from_config)
        })
        .collect()
}

/// Orchestrator for running benchmarks across builds.
pub struct Orchestrator<R: ProcessRunner> {
    runner: R,
    builds: Vec<Build>,
    benchmarks: Vec<Benchmark>,
    /// Number of measured runs.
    runs: u32,
    /// Number of discarded runs before measuring.
    warmup_runs: u32,
}

impl<R: ProcessRunner> Orchestrator<R> {
    /// Create a new orchestrator. The first build is the baseline.
    pub fn new(
        runner: R,
        builds: Vec<Build>,
        benchmarks: Vec<Benchmark>,
        runs: u32,
        warmup_runs: u32,
    ) -> Self {
        Self {
            runner,
            builds,
            benchmarks,
            runs,
            warmup_runs,
        }
    }

    /// Run all benchmarks and collect their results.
    ///
    /// Warmup runs go first and their output is discarded. Then each measured
    /// run executes every benchmark on every build, and the report is
    /// re-rendered to `display` after each benchmark.
    ///
    /// # Errors
    ///
    /// Stops at the first benchmark that fails, is interrupted, or cannot be
    /// started.
    pub async fn run(
        &mut self,
        reporter: &dyn Reporter,
        display: &mut dyn DisplaySink,
    ) -> Result<Vec<BuildResults>, OrchestratorError> {
        if self.builds.is_empty() {
            return Err(OrchestratorError::NoBuilds);
        }
        if self.benchmarks.is_empty() {
            return Err(OrchestratorError::NoBenchmarks);
        }

        let mut results: Vec<BuildResults> = self
            .builds
            .iter()
            .map(|build| BuildResults::new(build.name.clone()))
            .collect();

        for warmup in 0..self.warmup_runs {
            for build in 0..self.builds.len() {
                for benchmark in 0..self.benchmarks.len() {
                    info!(
                        warmup = warmup + 1,
                        of = self.warmup_runs,
                        build = %self.builds[build].name,
                        benchmark = %self.benchmarks[benchmark].name,
                        "Warmup run"
                    );
                    self.execute(benchmark, build).await?;
                }
            }
        }

        for run in 0..self.runs {
            for build in 0..self.builds.len() {
                for benchmark in 0..self.benchmarks.len() {
                    info!(
                        run = run + 1,
                        of = self.runs,
                        build = %self.builds[build].name,
                        benchmark = %self.benchmarks[benchmark].name,
                        "Running benchmark"
                    );
                    let stdout = self.execute(benchmark, build).await?;

                    let added =
                        self.benchmarks[benchmark].parse_output(&stdout, &mut results[build].results);
                    if added == 0 {
                        warn!(
                            build = %self.builds[build].name,
                            benchmark = %self.benchmarks[benchmark].name,
                            "Benchmark produced no results"
                        );
                    }

                    reporter.report(&results, display)?;
                }
            }
        }

        Ok(results)
    }

    /// Run one benchmark against one build, returning its stdout.
    async fn execute(&mut self, benchmark: usize, build: usize) -> Result<String, OrchestratorError> {
        let benchmark = &self.benchmarks[benchmark];
        let build = &self.builds[build];
        let spec = benchmark.command_for(build);

        let output = self.runner.run(&spec).await?;
        if !output.success() {
            return Err(OrchestratorError::BenchmarkFailed {
                benchmark: benchmark.name.clone(),
                build: build.name.clone(),
                command: spec.to_string(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RESULT_PATTERN;
    use crate::runner::CommandOutput;
    use benchcomp_core::{NullDisplay, TableReporter};
    use std::collections::{BTreeMap, VecDeque};

    /// Replays canned outputs and records the commands it was asked to run.
    #[derive(Default)]
    struct ScriptedRunner {
        outputs: VecDeque<CommandOutput>,
        commands: Vec<CommandSpec>,
    }

    impl ScriptedRunner {
        fn with_stdout<'a>(stdouts: impl IntoIterator<Item = &'a str>) -> Self {
            Self {
                outputs: stdouts
                    .into_iter()
                    .map(|stdout| CommandOutput {
                        exit_code: Some(0),
                        stdout: stdout.to_string(),
                        stderr: String::new(),
                    })
                    .collect(),
                commands: Vec::new(),
            }
        }
    }

    impl ProcessRunner for ScriptedRunner {
        async fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, RunnerError> {
            self.commands.push(spec.clone());
            Ok(self.outputs.pop_front().unwrap_or_default())
        }
    }

    fn build(name: &str) -> Build {
        Build {
            name: name.to_string(),
            dir: PathBuf::from(format!("/builds/{name}")),
            prefs: Vec::new(),
        }
    }

    fn benchmark(name: &str) -> Benchmark {
        Benchmark::new(name, ["{build}/bench", name], DEFAULT_RESULT_PATTERN).unwrap()
    }

    #[test]
    fn test_parse_output_default_pattern() {
        let bench = benchmark("octane");
        let mut results = ResultSet::new();

        let added = bench.parse_output(
            "Richards: 1234\n  DeltaBlue : 56.5\nRunning suite...\nScore: n/a\nSplay: NaN\n",
            &mut results,
        );

        assert_eq!(added, 2);
        assert_eq!(results.samples("Richards"), Some(&[1234.0][..]));
        assert_eq!(results.samples("DeltaBlue"), Some(&[56.5][..]));
        assert!(!results.contains("Score"));
        assert!(!results.contains("Splay"));
    }

    #[test]
    fn test_parse_output_custom_pattern() {
        let bench = Benchmark::new("startup", ["./startup"], r"^(\w+)=(\d+)ms$").unwrap();
        let mut results = ResultSet::new();

        assert_eq!(bench.parse_output("first=10ms\nsecond=20ms\nfirst=12ms", &mut results), 3);
        assert_eq!(results.samples("first"), Some(&[10.0, 12.0][..]));
    }

    #[test]
    fn test_invalid_patterns() {
        let err = Benchmark::new("a", ["a"], "(unclosed").unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidPattern { .. }));

        let err = Benchmark::new("a", ["a"], r"^(\w+)$").unwrap_err();
        assert!(err.to_string().contains("capture groups"));
    }

    #[test]
    fn test_command_for_build() {
        let config = BenchmarkConfig {
            name: "octane".to_string(),
            command: vec!["{build}/dist/bin/js".to_string(), "run.js".to_string()],
            cwd: Some(PathBuf::from("{build}/octane")),
            env: BTreeMap::from([("MODE".to_string(), "fast".to_string())]),
            result_pattern: DEFAULT_RESULT_PATTERN.to_string(),
        };
        let bench = Benchmark::from_config(&config).unwrap();
        let mut patched = build("patched");
        patched.prefs = vec!["gc=1".to_string()];

        let spec = bench.command_for(&patched);

        assert_eq!(spec.argv, vec!["/builds/patched/dist/bin/js", "run.js"]);
        assert_eq!(spec.cwd, Some(PathBuf::from("/builds/patched/octane")));
        assert_eq!(
            spec.env,
            vec![
                ("MODE".to_string(), "fast".to_string()),
                ("BENCHCOMP_BUILD".to_string(), "/builds/patched".to_string()),
                ("BENCHCOMP_PREFS".to_string(), "gc=1".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_benchmarks() {
        let configs: Vec<BenchmarkConfig> = ["a", "b", "c"]
            .iter()
            .map(|name| BenchmarkConfig {
                name: name.to_string(),
                command: vec![name.to_string()],
                cwd: None,
                env: BTreeMap::new(),
                result_pattern: DEFAULT_RESULT_PATTERN.to_string(),
            })
            .collect();

        let all = select_benchmarks(&configs, &[]).unwrap();
        assert_eq!(all.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(), ["a", "b", "c"]);

        let picked = select_benchmarks(&configs, &["c".to_string(), "a".to_string()]).unwrap();
        assert_eq!(picked.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(), ["c", "a"]);

        let err = select_benchmarks(&configs, &["z".to_string()]).unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownBenchmark(name) if name == "z"));
    }

    #[tokio::test]
    async fn test_run_interleaves_builds() {
        let runner = ScriptedRunner::with_stdout([
            "warm: 1", "warm: 1", // warmup, discarded
            "time: 10", "time: 20", // run 1
            "time: 11", "time: 21", // run 2
        ]);
        let mut orchestrator = Orchestrator::new(
            runner,
            vec![build("base"), build("patched")],
            vec![benchmark("bench")],
            2,
            1,
        );

        let results = orchestrator
            .run(&TableReporter::without_colors(), &mut NullDisplay)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "base");
        assert_eq!(results[0].results.samples("time"), Some(&[10.0, 11.0][..]));
        assert_eq!(results[1].results.samples("time"), Some(&[20.0, 21.0][..]));
        assert!(!results[0].results.contains("warm"));

        let programs: Vec<&str> = orchestrator
            .runner
            .commands
            .iter()
            .map(|spec| spec.argv[0].as_str())
            .collect();
        assert_eq!(
            programs,
            [
                "/builds/base/bench",
                "/builds/patched/bench",
                "/builds/base/bench",
                "/builds/patched/bench",
                "/builds/base/bench",
                "/builds/patched/bench",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_failure() {
        let mut runner = ScriptedRunner::with_stdout(["time: 1"]);
        runner.outputs.push_back(CommandOutput {
            exit_code: Some(2),
            stdout: "partial".to_string(),
            stderr: "segfault".to_string(),
        });
        let mut orchestrator = Orchestrator::new(
            runner,
            vec![build("base"), build("patched")],
            vec![benchmark("bench")],
            3,
            0,
        );

        let err = orchestrator
            .run(&TableReporter::without_colors(), &mut NullDisplay)
            .await
            .unwrap_err();

        match &err {
            OrchestratorError::BenchmarkFailed {
                benchmark,
                build,
                exit_code,
                ..
            } => {
                assert_eq!(benchmark, "bench");
                assert_eq!(build, "patched");
                assert_eq!(*exit_code, Some(2));
            }
            other => panic!("expected benchmark failure, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Error running benchmark bench for build patched (exit code 2):\n\
             /builds/patched/bench bench\nstdout:\npartial\nstderr:\nsegfault"
        );
        assert_eq!(orchestrator.runner.commands.len(), 2);
        assert!(!err.is_interrupted());
    }

    #[tokio::test]
    async fn test_run_requires_builds_and_benchmarks() {
        let mut orchestrator =
            Orchestrator::new(ScriptedRunner::default(), Vec::new(), vec![benchmark("b")], 1, 0);
        let err = orchestrator
            .run(&TableReporter::without_colors(), &mut NullDisplay)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NoBuilds));

        let mut orchestrator =
            Orchestrator::new(ScriptedRunner::default(), vec![build("a")], Vec::new(), 1, 0);
        let err = orchestrator
            .run(&TableReporter::without_colors(), &mut NullDisplay)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NoBenchmarks));
    }

    #[test]
    fn test_interrupted_error() {
        let err = OrchestratorError::from(RunnerError::Interrupted {
            command: "js".to_string(),
        });
        assert!(err.is_interrupted());
        assert_eq!(err.to_string(), "Interrupted while running js");
    }
}
