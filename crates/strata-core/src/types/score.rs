//! Score ordering, parsing, and formatting.
//!
//! Members are ordered by `(score, member)`: ascending score, with ties
//! broken by raw byte comparison of the member. Scores compare with IEEE
//! equality, so `-0.0` and `0.0` are the same score. NaN never reaches
//! the comparator because every entry point rejects it.

use std::cmp::Ordering;

/// Below this magnitude an integral score is printed without a fraction.
/// 2^53 is the last point where every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Compares two `(score, member)` pairs in sorted-set order.
pub fn compare(a_score: f64, a_member: &[u8], b_score: f64, b_member: &[u8]) -> Ordering {
    a_score
        .partial_cmp(&b_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_member.cmp(b_member))
}

/// Parses a score, filtering out NaN.
///
/// `f64::from_str` already accepts decimal and exponent notation plus
/// `inf`, `+inf`, `-inf` and `infinity` in any case, and rejects empty
/// input and surrounding whitespace.
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let value: f64 = text.parse().ok()?;
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Formats a score the way replies carry it.
///
/// Infinities are `inf` / `-inf`, integral scores have no fractional
/// part (`1`, not `1.0`), and everything else uses the shortest text that
/// parses back to the same `f64`. Magnitudes of 1e17 and up or below
/// 1e-4 switch to exponent form (`1e+300`, `2.5e-08`).
pub fn format_score(score: f64) -> String {
    if score.is_infinite() {
        return if score > 0.0 { "inf".into() } else { "-inf".into() };
    }
    if score == score.trunc() && score.abs() < MAX_EXACT_INTEGER {
        // also folds -0.0 into "0"
        return format!("{}", score as i64);
    }
    let magnitude = score.abs();
    if magnitude >= 1e17 || magnitude < 1e-4 {
        return exponent_form(score);
    }
    format!("{score}")
}

/// `%g`-style exponent: explicit sign and at least two digits (`2.5e-08`).
fn exponent_form(score: f64) -> String {
    let text = format!("{score:e}");
    let Some((mantissa, exp)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exp),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}
