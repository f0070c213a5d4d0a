//! Accumulation of benchmark samples per build.

use std::collections::HashMap;

use crate::stats::{Stats, StatsError};

/// The results of many benchmark runs against one build, keyed by metric name.
///
/// Metric names keep the order in which they were first recorded so reports
/// come out in a stable order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    metrics: Vec<(String, Vec<f64>)>,
    index: HashMap<String, usize>,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample for `name`, creating the metric on first use.
    pub fn add_result(&mut self, name: &str, value: f64) {
        match self.index.get(name) {
            Some(&i) => self.metrics[i].1.push(value),
            None => {
                self.index.insert(name.to_string(), self.metrics.len());
                self.metrics.push((name.to_string(), vec![value]));
            }
        }
    }

    /// Metric names in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|(name, _)| name.as_str())
    }

    /// The recorded samples for `name`, in insertion order.
    pub fn samples(&self, name: &str) -> Option<&[f64]> {
        self.index.get(name).map(|&i| self.metrics[i].1.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of distinct metrics.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Compute [`Stats`] for every metric.
    ///
    /// # Errors
    ///
    /// Only fails if a metric has no samples, which `add_result` never produces.
    pub fn create_stats_set(&self) -> Result<StatsSet<'_>, StatsError> {
        let entries = self
            .metrics
            .iter()
            .map(|(name, samples)| Ok((name.as_str(), Stats::new(samples)?)))
            .collect::<Result<Vec<_>, StatsError>>()?;
        Ok(StatsSet { entries })
    }
}

/// Per-metric statistics for one build, in the order of its [`ResultSet`].
#[derive(Debug, Clone)]
pub struct StatsSet<'a> {
    entries: Vec<(&'a str, Stats<'a>)>,
}

impl<'a> StatsSet<'a> {
    pub fn get(&self, name: &str) -> Option<&Stats<'a>> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, stats)| stats)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &Stats<'a>)> {
        self.entries.iter().map(|(name, stats)| (*name, stats))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named build together with the results collected for it.
#[derive(Debug, Clone, Default)]
pub struct BuildResults {
    pub name: String,
    pub results: ResultSet,
}

impl BuildResults {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: ResultSet::new(),
        }
    }
}
