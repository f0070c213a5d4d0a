use colored::Colorize;

use super::format::{
    compact_stats_header, format_box, format_compact_stats_styled, format_samples,
    format_stats_styled, stats_header, STATS_WIDTH,
};
use super::{stats_sets, summarize, BuildRow, MetricSummary, ReportError, Reporter};
use crate::display::DisplaySink;
use crate::results::BuildResults;
use crate::stats::Comparison;

/// Width of the build name column; longer names keep their last characters.
const NAME_WIDTH: usize = 20;

/// Indent of the statistics columns: two spaces, the name, two spaces.
const STATS_INDENT: usize = NAME_WIDTH + 4;

/// A reporter that prints one line per build for every metric, with an
/// optional picture of each build's spread.
#[derive(Debug, Clone)]
pub struct TableReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
    /// Plot individual samples below each row.
    show_samples: bool,
    /// Only show mean, CofV and the comparison.
    compact: bool,
    /// P-values below this are highlighted.
    significance: f64,
}

impl Default for TableReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableReporter {
    /// Create a new table reporter with default settings.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            show_samples: false,
            compact: false,
            significance: 0.05,
        }
    }

    /// Create a table reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self {
            use_colors: false,
            ..Self::new()
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_samples(mut self, show_samples: bool) -> Self {
        self.show_samples = show_samples;
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Highlight changes whose p-value is below `1 - confidence_level`.
    ///
    /// # Panics
    /// Panics if confidence_level is not in the range (0, 1).
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        assert!(
            confidence_level > 0.0 && confidence_level < 1.0,
            "confidence_level must be between 0 and 1 (exclusive)"
        );
        self.significance = 1.0 - confidence_level;
        self
    }

    /// Produce the report lines for `builds`.
    pub fn render(&self, builds: &[BuildResults]) -> Result<Vec<String>, ReportError> {
        let sets = stats_sets(builds)?;
        let metrics = summarize(&sets);

        if metrics.is_empty() {
            return Ok(vec!["No results to display".to_string()]);
        }

        let mut lines = self.header(builds.len() > 1);
        for metric in &metrics {
            lines.push(format!("{}:", metric.name));
            for row in &metric.rows {
                self.push_row(&mut lines, metric, row);
            }
        }

        Ok(lines)
    }

    fn header(&self, with_comparison: bool) -> Vec<String> {
        let columns = if self.compact {
            compact_stats_header(with_comparison)
        } else {
            stats_header()
        };
        let header = format!("{}{}", " ".repeat(STATS_INDENT), columns);
        let rule = "=".repeat(header.len());

        if self.use_colors {
            vec![header.bold().to_string(), rule]
        } else {
            vec![header, rule]
        }
    }

    fn push_row(&self, lines: &mut Vec<String>, metric: &MetricSummary<'_>, row: &BuildRow<'_>) {
        let name = last_chars(row.build, NAME_WIDTH);

        if self.compact {
            let main = format_compact_stats_styled(row.stats, row.comparison.as_ref(), |percent, c| {
                self.style_change(percent, c)
            });
            lines.push(format!("  {:>NAME_WIDTH$}  {}", name, main));
            return;
        }

        let main = format_stats_styled(row.stats, row.comparison.as_ref(), |percent, c| {
            self.style_change(percent, c)
        });

        let has_range = metric.max_all != metric.min_all;
        let boxed = if has_range && metric.rows.len() > 1 && row.stats.count > 1 {
            format_box(metric.min_all, metric.max_all, row.stats)
        } else {
            String::new()
        };

        let line = format!("  {:>NAME_WIDTH$}  {}  {}", name, main, boxed);
        lines.push(line.trim_end().to_string());

        if self.show_samples && has_range {
            let samples = format_samples(metric.min_all, metric.max_all, row.stats);
            lines.push(format!(
                "{}{}",
                " ".repeat(STATS_INDENT + STATS_WIDTH + 2),
                samples
            ));
        }
    }

    /// Color a significant change: green when the value went down, red when up.
    fn style_change(&self, percent: String, comparison: &Comparison) -> String {
        if !self.use_colors {
            return percent;
        }
        match comparison.p_value {
            Some(p) if p < self.significance => {
                if comparison.diff < 0.0 {
                    percent.green().to_string()
                } else {
                    percent.red().to_string()
                }
            }
            _ => percent,
        }
    }
}

impl Reporter for TableReporter {
    fn report(
        &self,
        builds: &[BuildResults],
        out: &mut dyn DisplaySink,
    ) -> Result<(), ReportError> {
        let lines = self.render(builds)?;

        out.clear()?;
        for line in &lines {
            out.print(line)?;
        }
        out.flush()?;

        Ok(())
    }
}

/// The last `count` characters of `s`.
fn last_chars(s: &str, count: usize) -> &str {
    let len = s.chars().count();
    if len <= count {
        return s;
    }
    match s.char_indices().nth(len - count) {
        Some((start, _)) => &s[start..],
        None => s,
    }
}
