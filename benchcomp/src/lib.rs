//! benchcomp: run benchmarks against several builds and compare the results
//!
//! Every benchmark runs repeatedly on every build, interleaved, and the
//! results are reported per metric with each build compared against the
//! first one.

pub mod build;
pub mod cli;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod runner;

// Re-export core types for convenience
pub use benchcomp_core::{
    compare, render, BuildResults, Comparison, DisplaySink, FileDisplay, JsonReporter,
    NullDisplay, ReportError, Reporter, ResultSet, Stats, TableReporter, TerminalDisplay,
};

// Re-export main types from this crate
pub use build::{Build, BuildError};
pub use cli::Cli;
pub use config::{Config, ReportFormat};
pub use orchestrator::{select_benchmarks, Benchmark, Orchestrator, OrchestratorError};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner, RunnerError};
