//! Descriptive statistics over benchmark samples and pairwise comparison of
//! those statistics between builds.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The input violated a precondition of the computation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Statistics for one metric of one build, computed once from its samples.
///
/// `samples` borrows the sequence the statistics were computed from, in the
/// order the samples were recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats<'a> {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (Bessel's correction), zero for a single sample.
    pub stdv: f64,
    /// Coefficient of variation, zero when the mean is zero.
    pub cofv: f64,
    pub min: f64,
    pub max: f64,
    pub samples: &'a [f64],
}

impl<'a> Stats<'a> {
    /// Compute statistics for a non-empty sample sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InvalidInput`] if `samples` is empty.
    pub fn new(samples: &'a [f64]) -> Result<Self, StatsError> {
        if samples.is_empty() {
            return Err(StatsError::InvalidInput(
                "cannot compute statistics of an empty sample set".to_string(),
            ));
        }

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // Rounding must never push the mean outside the observed range.
        let mean = mean(samples).max(min).min(max);
        let stdv = variance(samples, mean).sqrt();
        let cofv = if mean != 0.0 { stdv / mean } else { 0.0 };

        Ok(Self {
            count: samples.len(),
            mean,
            stdv,
            cofv,
            min,
            max,
            samples,
        })
    }

    /// Compare these statistics against a baseline.
    ///
    /// See [`compare`].
    pub fn compare_to(&self, baseline: Option<&Stats<'a>>) -> Option<Comparison> {
        compare(self, baseline)
    }
}

/// How one build's statistics relate to the baseline's for the same metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    /// `subject.mean - baseline.mean`.
    pub diff: f64,
    /// `diff / baseline.mean`, absent for a zero baseline mean.
    pub factor: Option<f64>,
    /// Two-tailed Welch's t-test p-value, absent when the test cannot run.
    pub p_value: Option<f64>,
}

/// Compare `subject` against `baseline`.
///
/// Returns `None` when there is no baseline, or when the baseline is the very
/// same `Stats` object as the subject. A build is never compared with itself.
pub fn compare<'a>(subject: &Stats<'a>, baseline: Option<&Stats<'a>>) -> Option<Comparison> {
    let baseline = baseline?;
    if std::ptr::eq(subject, baseline) {
        return None;
    }

    let diff = subject.mean - baseline.mean;
    let factor = if baseline.mean != 0.0 {
        Some(diff / baseline.mean)
    } else {
        None
    };

    // Identical means leave nothing to test.
    let p_value = if subject.mean != baseline.mean {
        WelchTTest
            .analyze(baseline.samples, subject.samples)
            .map(|result| result.p_value)
    } else {
        None
    };

    Some(Comparison {
        diff,
        factor,
        p_value,
    })
}

/// Arithmetic mean. Callers guarantee a non-empty slice.
///
/// Deviations are summed relative to the first sample, which makes the result
/// exact when every sample is the same.
pub(crate) fn mean(samples: &[f64]) -> f64 {
    let origin = samples.first().copied().unwrap_or(0.0);
    let offset = samples.iter().map(|x| x - origin).sum::<f64>() / samples.len() as f64;
    origin + offset
}

/// Unbiased sample variance from deviations around a precomputed mean.
pub(crate) fn variance(samples: &[f64], mean: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let sum_sq_diff: f64 = samples
        .iter()
        .map(|x| {
            let diff = x - mean;
            diff * diff
        })
        .sum();
    sum_sq_diff / (samples.len() - 1) as f64
}

/// Result of a two-sample significance test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    /// The test statistic, signed as `mean(subject) - mean(baseline)`.
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-tailed p-value.
    pub p_value: f64,
}

/// Trait for statistical tests that compare two sets of measurements.
pub trait StatisticalTest: Send + Sync {
    /// Test whether `subject` and `baseline` share a population mean.
    ///
    /// Returns `None` when either side has too few samples for the test.
    fn analyze(&self, baseline: &[f64], subject: &[f64]) -> Option<TestResult>;
}

mod ttest;
pub use ttest::WelchTTest;
