use serde::Serialize;

use super::{stats_sets, summarize, ReportError, Reporter};
use crate::display::DisplaySink;
use crate::results::BuildResults;
use crate::stats::{Comparison, Stats};

/// A reporter that prints the per-metric statistics as pretty JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter;

#[derive(Debug, Serialize)]
struct JsonMetric<'a> {
    name: &'a str,
    builds: Vec<JsonBuild<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonBuild<'a> {
    build: &'a str,
    stats: &'a Stats<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Comparison>,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize the report for `builds`.
    pub fn to_json(&self, builds: &[BuildResults]) -> Result<String, ReportError> {
        let sets = stats_sets(builds)?;
        let metrics: Vec<JsonMetric<'_>> = summarize(&sets)
            .into_iter()
            .map(|metric| JsonMetric {
                name: metric.name,
                builds: metric
                    .rows
                    .into_iter()
                    .map(|row| JsonBuild {
                        build: row.build,
                        stats: row.stats,
                        comparison: row.comparison,
                    })
                    .collect(),
            })
            .collect();

        Ok(serde_json::to_string_pretty(&metrics)?)
    }
}

impl Reporter for JsonReporter {
    fn report(
        &self,
        builds: &[BuildResults],
        out: &mut dyn DisplaySink,
    ) -> Result<(), ReportError> {
        let json = self.to_json(builds)?;

        out.clear()?;
        for line in json.lines() {
            out.print(line)?;
        }
        out.flush()?;

        Ok(())
    }
}
