//! Scalar conversions with missing-value sentinels.
//!
//! The CSV exports mark missing data with the literal `\N`; empty cells are
//! read as null. Both map to zero for positions, times and speeds. Any other
//! value must parse, otherwise the conversion fails.

use crate::error::{EtlError, Result};

/// Missing-value marker used by the exports.
pub const MISSING_MARKER: &str = "\\N";

/// Whether a raw cell holds no data.
pub fn is_missing(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => {
            let v = v.trim();
            v.is_empty() || v == MISSING_MARKER
        }
    }
}

/// Convert a lap/qualifying time `M:SS.mmm` (or `SS.mmm`) to milliseconds.
///
/// Missing values convert to 0.
pub fn convert_time_to_ms(value: Option<&str>) -> Result<i64> {
    if is_missing(value) {
        return Ok(0);
    }
    let raw = value.unwrap_or_default().trim();
    let malformed = || EtlError::Malformed {
        kind: "time",
        value: raw.to_string(),
    };

    let (minutes, rest) = match raw.split_once(':') {
        Some((m, rest)) => (m.parse::<i64>().map_err(|_| malformed())?, rest),
        None => (0, raw),
    };
    let (seconds, fraction) = rest.split_once('.').ok_or_else(malformed)?;
    let seconds: i64 = seconds.parse().map_err(|_| malformed())?;

    if fraction.is_empty() || fraction.len() > 3 || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(malformed());
    }
    // ".4" is 400ms, ".45" is 450ms
    let millis: i64 = format!("{:0<3}", fraction).parse().map_err(|_| malformed())?;

    if minutes < 0 || !(0..60).contains(&seconds) {
        return Err(malformed());
    }

    Ok(minutes * 60_000 + seconds * 1000 + millis)
}

/// Convert a finishing/qualifying position; missing means unclassified (0).
pub fn parse_position(value: Option<&str>) -> Result<i64> {
    if is_missing(value) {
        return Ok(0);
    }
    let raw = value.unwrap_or_default().trim();
    raw.parse::<i64>().map_err(|_| EtlError::Malformed {
        kind: "position",
        value: raw.to_string(),
    })
}

/// Convert a speed (or any sentinel-aware decimal); missing means 0.0.
pub fn parse_speed(value: Option<&str>) -> Result<f64> {
    if is_missing(value) {
        return Ok(0.0);
    }
    let raw = value.unwrap_or_default().trim();
    raw.parse::<f64>().map_err(|_| EtlError::Malformed {
        kind: "speed",
        value: raw.to_string(),
    })
}

/// Time in milliseconds, `None` when no time was set.
pub fn optional_time_ms(value: Option<&str>) -> Result<Option<i64>> {
    let ms = convert_time_to_ms(value)?;
    Ok((ms > 0).then_some(ms))
}
