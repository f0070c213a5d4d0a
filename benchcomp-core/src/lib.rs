//! Core types and utilities for benchcomp.
//!
//! This crate holds everything that does not touch processes or the command
//! line: sample accumulation, statistics, cross-build comparison and report
//! rendering.

pub mod display;
pub mod report;
pub mod results;
pub mod stats;

// Re-export main types for convenience
pub use display::{DisplaySink, FileDisplay, NullDisplay, TerminalDisplay};
pub use report::{render, JsonReporter, ReportError, Reporter, TableReporter};
pub use results::{BuildResults, ResultSet, StatsSet};
pub use stats::{compare, Comparison, StatisticalTest, Stats, StatsError, TestResult, WelchTTest};
