use thiserror::Error;

use crate::display::DisplaySink;
use crate::results::{BuildResults, StatsSet};
use crate::stats::{Comparison, Stats, StatsError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One build's line in a metric group.
#[derive(Debug, Clone)]
pub struct BuildRow<'a> {
    pub build: &'a str,
    pub stats: &'a Stats<'a>,
    /// Comparison against the metric's baseline; absent for the baseline itself.
    pub comparison: Option<Comparison>,
}

/// All builds' statistics for one metric.
#[derive(Debug, Clone)]
pub struct MetricSummary<'a> {
    pub name: &'a str,
    /// Smallest sample of any build.
    pub min_all: f64,
    /// Largest sample of any build.
    pub max_all: f64,
    pub rows: Vec<BuildRow<'a>>,
}

/// Compute each build's statistics, keeping the build order.
pub fn stats_sets(builds: &[BuildResults]) -> Result<Vec<(&str, StatsSet<'_>)>, StatsError> {
    builds
        .iter()
        .map(|build| Ok((build.name.as_str(), build.results.create_stats_set()?)))
        .collect()
}

/// Group statistics by metric and compare every build to the metric's baseline.
///
/// Metrics are ordered by first appearance across the builds. The baseline is
/// the first build that reports the metric. Metrics whose samples are all zero
/// in every build are left out.
pub fn summarize<'a>(stats_sets: &'a [(&'a str, StatsSet<'a>)]) -> Vec<MetricSummary<'a>> {
    let mut names: Vec<&'a str> = Vec::new();
    for (_, set) in stats_sets {
        for name in set.keys() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let mut metrics = Vec::new();
    for name in names {
        let present: Vec<(&'a str, &'a Stats<'a>)> = stats_sets
            .iter()
            .filter_map(|(build, set)| set.get(name).map(|stats| (*build, stats)))
            .collect();

        let min_all = present
            .iter()
            .map(|(_, s)| s.min)
            .fold(f64::INFINITY, f64::min);
        let max_all = present
            .iter()
            .map(|(_, s)| s.max)
            .fold(f64::NEG_INFINITY, f64::max);

        // Nothing interesting: a counter that never moved.
        if min_all == 0.0 && max_all == 0.0 {
            continue;
        }

        let baseline = present.first().map(|(_, stats)| *stats);
        let rows = present
            .iter()
            .map(|&(build, stats)| BuildRow {
                build,
                stats,
                comparison: stats.compare_to(baseline),
            })
            .collect();

        metrics.push(MetricSummary {
            name,
            min_all,
            max_all,
            rows,
        });
    }

    metrics
}

/// Render the full table report for `builds`.
///
/// This is the uncoloured output of [`TableReporter`].
pub fn render(builds: &[BuildResults], show_samples: bool) -> Result<Vec<String>, ReportError> {
    TableReporter::without_colors()
        .with_samples(show_samples)
        .render(builds)
}

pub trait Reporter: Send + Sync {
    /// Replace whatever `out` currently shows with a report of `builds`.
    fn report(&self, builds: &[BuildResults], out: &mut dyn DisplaySink)
        -> Result<(), ReportError>;
}

pub mod format;
mod json;
mod table;

pub use json::JsonReporter;
pub use table::TableReporter;
