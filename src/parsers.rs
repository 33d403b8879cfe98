use crate::prelude::*;

/// Recognised duration suffixes, two-character units first so that `ms`,
/// `us` and `ns` win over the bare `s`.
const DURATION_UNITS: [(&str, i64); 4] = [
    ("ms", 1_000_000),
    ("us", 1_000),
    ("ns", 1),
    ("s", 1_000_000_000),
];

fn split_duration_unit(token: &str) -> Option<(&str, i64)> {
    DURATION_UNITS
        .iter()
        .find_map(|(unit, factor)| token.strip_suffix(unit).map(|prefix| (prefix, *factor)))
}

/// Converts a string such as `"1s 500ms"` into nanoseconds.
///
/// Tokens are whitespace separated. A token without a known unit suffix is
/// skipped; a token with a known suffix but a non-integer magnitude is an
/// error.
pub fn parse_duration(s: &str) -> Result<i64> {
    s.split_whitespace().try_fold(0i64, |total, token| {
        let Some((magnitude, factor)) = split_duration_unit(token) else {
            trace!("Ignoring duration token without unit: {}", token);
            return Ok(total);
        };
        let invalid = || Error::InvalidDuration {
            token: token.to_string(),
        };
        let magnitude: i64 = magnitude.parse().map_err(|_| invalid())?;
        magnitude
            .checked_mul(factor)
            .and_then(|ns| total.checked_add(ns))
            .ok_or_else(invalid)
    })
}

/// Decimal multipliers accepted after a plain number.
const METRIC_SUFFIXES: [(&str, f64); 2] = [("k", 1e3), ("M", 1e6)];

/// Binary size units, longest first so that `KiB` is not read as `B`.
const MEM_UNITS: [(&str, f64); 5] = [
    ("TiB", (1u64 << 40) as f64),
    ("GiB", (1u64 << 30) as f64),
    ("MiB", (1u64 << 20) as f64),
    ("KiB", (1u64 << 10) as f64),
    ("B", 1.0),
];

/// Splits `s` into a number and the multiplier of its suffix from `units`.
fn scaled_number(s: &str, units: &[(&str, f64)]) -> Option<f64> {
    let (number, factor) = units
        .iter()
        .find_map(|(unit, factor)| s.strip_suffix(unit).map(|n| (n, *factor)))?;
    Some(number.trim_end().parse::<f64>().ok()? * factor)
}

/// Reads `"12"`, `"1.5k"` or `"2M"` as a plain count.
pub fn parse_metric(s: &str) -> Option<f64> {
    let s = s.trim();
    scaled_number(s, &METRIC_SUFFIXES).or_else(|| s.parse().ok())
}

/// Reads a binary size such as `"1.5MiB"` or `"512 B"` as a byte count.
/// Negative sizes are rejected.
pub fn parse_mem(s: &str) -> Option<u64> {
    scaled_number(s.trim(), &MEM_UNITS)
        .filter(|bytes| *bytes >= 0.0)
        .map(|bytes| bytes as u64)
}

/// Coerces a raw stats value into a number: plain or `k`/`M` suffixed
/// metrics, memory sizes in bytes, or durations in nanoseconds.
pub fn parse_stat_value(s: &str) -> Result<f64> {
    if let Some(value) = parse_metric(s) {
        return Ok(value);
    }
    if let Some(bytes) = parse_mem(s) {
        return Ok(bytes as f64);
    }
    let mut tokens = s.split_whitespace().peekable();
    if tokens.peek().is_some() && tokens.all(|t| split_duration_unit(t).is_some()) {
        return parse_duration(s).map(|ns| ns as f64);
    }
    Err(Error::InvalidValue(s.to_string()))
}
