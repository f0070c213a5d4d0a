//! Fixed-width formatting of statistics for tabular display.

use crate::stats::{Comparison, Stats};

/// Width of the range box and sample scatter columns.
pub const BOX_WIDTH: usize = 40;

/// Width of a formatted [`format_stats`] line.
pub const STATS_WIDTH: usize = 69;

/// Width of a numeric value column.
const VALUE_WIDTH: usize = 8;

/// Format `x` right-aligned in `width` columns with as many significant digits
/// as fit.
///
/// Fixed-point notation is preferred; scientific notation is only used when the
/// value cannot otherwise be shown. If the first attempt is too wide the
/// precision is reduced to make room for an exponent.
pub fn format_float(width: usize, x: f64) -> String {
    debug_assert!(width >= 5);
    let mut s = format_general(x, width - 1);
    if s.len() > width {
        s = format_general(x, width.saturating_sub(5));
    }
    format!("{:>width$}", s)
}

/// `%g` conversion: `precision` significant digits, trailing zeros removed,
/// exponent form when the exponent is below -4 or not below the precision.
fn format_general(x: f64, precision: usize) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);

    // The exponent has to come from the rounded value: 9.9999 at two digits is 1.0e1.
    let scientific = format!("{:.*e}", precision - 1, x);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => return scientific,
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, x)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Column headings matching [`format_stats`].
pub fn stats_header() -> String {
    format!(
        "{:<8}  {:<8}  {:<8}  {:<6}  {:<4}  {:<8}  {:<6}  {:<7}",
        "Min", "Mean", "Max", "CofV", "Runs", "Change", "%", "P-value"
    )
}

/// One row of statistics, with comparison columns left blank when absent.
pub fn format_stats(stats: &Stats<'_>, comparison: Option<&Comparison>) -> String {
    format_stats_styled(stats, comparison, |percent, _| percent)
}

/// Like [`format_stats`], passing the padded percent column through `style`.
pub(crate) fn format_stats_styled(
    stats: &Stats<'_>,
    comparison: Option<&Comparison>,
    style: impl Fn(String, &Comparison) -> String,
) -> String {
    let diff = comparison
        .map(|c| format_float(VALUE_WIDTH, c.diff))
        .unwrap_or_default();
    let percent = match comparison {
        Some(c) => style(format!("{:>6}", format_percent(c)), c),
        None => " ".repeat(6),
    };
    let p_value = comparison.map(format_p_value).unwrap_or_default();

    format!(
        "{:>8}  {:>8}  {:>8}  {:5.1}%  {:>4}  {:>8}  {}  {:>7}",
        format_float(VALUE_WIDTH, stats.min),
        format_float(VALUE_WIDTH, stats.mean),
        format_float(VALUE_WIDTH, stats.max),
        stats.cofv * 100.0,
        stats.count,
        diff,
        percent,
        p_value
    )
}

/// Column headings matching [`format_compact_stats`].
pub fn compact_stats_header(with_comparison: bool) -> String {
    let mut header = format!("{:<8}  {:<6}", "Mean", "CofV");
    if with_comparison {
        header.push_str(&format!("  {:<6}  {:<7}", "%", "P-value"));
    }
    header
}

/// Mean and coefficient of variation, plus change and p-value when compared.
pub fn format_compact_stats(stats: &Stats<'_>, comparison: Option<&Comparison>) -> String {
    format_compact_stats_styled(stats, comparison, |percent, _| percent)
}

/// Like [`format_compact_stats`], passing the padded percent column through
/// `style`.
pub(crate) fn format_compact_stats_styled(
    stats: &Stats<'_>,
    comparison: Option<&Comparison>,
    style: impl Fn(String, &Comparison) -> String,
) -> String {
    let mut line = format!(
        "{:>8}  {:5.1}%",
        format_float(VALUE_WIDTH, stats.mean),
        stats.cofv * 100.0
    );

    if let Some(c) = comparison {
        let percent = style(format!("{:>6}", format_percent(c)), c);
        line.push_str(&format!("  {}  {:>7}", percent, format_p_value(c)));
    }

    line
}

fn format_percent(comparison: &Comparison) -> String {
    comparison
        .factor
        .map(|factor| format!("{:5.1}%", factor * 100.0))
        .unwrap_or_default()
}

fn format_p_value(comparison: &Comparison) -> String {
    comparison
        .p_value
        .map(|p| format!("{:7.2}", p))
        .unwrap_or_default()
}

/// Column of `x` on an axis running from `min_all` to `max_all`.
fn axis_position(x: f64, min_all: f64, max_all: f64) -> usize {
    let position = ((x - min_all) * (BOX_WIDTH - 1) as f64 / (max_all - min_all)).floor();
    if position > 0.0 {
        (position as usize).min(BOX_WIDTH - 1)
    } else {
        0
    }
}

/// Draw the spread of `stats` on an axis from `min_all` to `max_all`.
///
/// `|` marks the extremes and `O` the mean. `=` covers half a standard
/// deviation either side of the mean and `-` the rest of the range. Returns an
/// empty string for a zero-width axis.
pub fn format_box(min_all: f64, max_all: f64, stats: &Stats<'_>) -> String {
    if !(max_all > min_all) {
        return String::new();
    }

    let scale = (max_all - min_all) / (BOX_WIDTH - 1) as f64;
    let max_dev = stats.mean + stats.stdv / 2.0;
    let min_dev = stats.mean - stats.stdv / 2.0;

    let mut chars: Vec<char> = (0..BOX_WIDTH)
        .map(|i| {
            let x = min_all + i as f64 * scale;
            if x >= stats.max {
                ' '
            } else if x >= max_dev {
                '-'
            } else if x >= min_dev {
                '='
            } else if x >= stats.min {
                '-'
            } else {
                ' '
            }
        })
        .collect();

    chars[axis_position(stats.min, min_all, max_all)] = '|';
    chars[axis_position(stats.max, min_all, max_all)] = '|';
    chars[axis_position(stats.mean, min_all, max_all)] = 'O';

    chars.into_iter().collect()
}

/// Plot each sample on the same axis as [`format_box`].
///
/// A column hit once shows `x`; hit more than once, `X`.
pub fn format_samples(min_all: f64, max_all: f64, stats: &Stats<'_>) -> String {
    if !(max_all > min_all) {
        return String::new();
    }

    let mut chars = [' '; BOX_WIDTH];
    for &x in stats.samples {
        let slot = &mut chars[axis_position(x, min_all, max_all)];
        *slot = if *slot == ' ' { 'x' } else { 'X' };
    }

    chars.iter().collect()
}
