use statrs::distribution::{ContinuousCDF, StudentsT};

use super::{mean, variance, StatisticalTest, TestResult};

/// Welch's t-test for comparing two independent samples with potentially unequal variances.
///
/// Builds under comparison routinely differ in variance (a debug build is far
/// noisier than an optimized one), so the pooled-variance Student's test does
/// not apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct WelchTTest;

impl WelchTTest {
    /// Calculate degrees of freedom using the Welch-Satterthwaite equation.
    ///
    /// df = (var1/n1 + var2/n2)^2 / ((var1/n1)^2/(n1-1) + (var2/n2)^2/(n2-1))
    fn welch_satterthwaite_df(var1: f64, n1: usize, var2: f64, n2: usize) -> f64 {
        let s1 = var1 / n1 as f64;
        let s2 = var2 / n2 as f64;
        let numerator = (s1 + s2).powi(2);
        let denominator = (s1.powi(2) / (n1 - 1) as f64) + (s2.powi(2) / (n2 - 1) as f64);

        if denominator == 0.0 {
            // Fallback to minimum df when variances are zero
            return (n1.min(n2) - 1) as f64;
        }

        numerator / denominator
    }
}

impl StatisticalTest for WelchTTest {
    fn analyze(&self, baseline: &[f64], subject: &[f64]) -> Option<TestResult> {
        let n1 = baseline.len();
        let n2 = subject.len();

        if n1 < 2 || n2 < 2 {
            return None;
        }

        let mean1 = mean(baseline);
        let mean2 = mean(subject);
        let var1 = variance(baseline, mean1);
        let var2 = variance(subject, mean2);

        let df = Self::welch_satterthwaite_df(var1, n1, var2, n2);

        // Standard error of the difference
        let se = (var1 / n1 as f64 + var2 / n2 as f64).sqrt();

        // Both samples constant: either the same value or certainly different.
        if se == 0.0 {
            let (t_statistic, p_value) = if mean1 == mean2 {
                (0.0, 1.0)
            } else {
                ((mean2 - mean1).signum() * f64::INFINITY, 0.0)
            };
            return Some(TestResult {
                t_statistic,
                degrees_of_freedom: df,
                p_value,
            });
        }

        let t_statistic = (mean2 - mean1) / se;

        // Two-tailed test: p = 2 * P(T > |t|)
        let p_value = match StudentsT::new(0.0, 1.0, df) {
            Ok(t_dist) => (2.0 * t_dist.sf(t_statistic.abs())).min(1.0),
            Err(_) => 1.0, // Conservative fallback if distribution creation fails
        };

        Some(TestResult {
            t_statistic,
            degrees_of_freedom: df,
            p_value,
        })
    }
}
