//! Field normalization for raw report records.
//!
//! Records have been written by several generations of tooling, so the same
//! logical field can arrive as a number, a numeric string or a literal
//! boolean. Everything is coerced here, once.

use serde_json::{Map, Value};

use super::models::NormalizedReport;
use crate::backend::RawRecord;

/// Fields replaced by typed values in the processed report.
const DERIVED_FIELDS: [&str; 11] = [
    "id",
    "report_final",
    "total_duration_seconds",
    "formatted_duration",
    "total_distance_km",
    "has_surveys",
    "surveyor_unit_desc",
    "indications",
    "indicationsCount",
    "uniqueIndicationsCount",
    "fieldOfViewGapsCount",
];

/// Coerce a stored `report_final` value to a strict boolean.
///
/// - numbers: `== 1`
/// - strings: leading integer `== 1`, otherwise case-insensitive `"true"`
/// - booleans: unchanged
/// - null: false; arrays and objects: true
pub fn coerce_final(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => match parse_int_prefix(s) {
            Some(n) => n == 1,
            None => s.to_lowercase() == "true",
        },
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse the leading base-10 integer of a string, ignoring leading whitespace.
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Overflow saturates; anything that large is not 1 either way.
    let n = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -n } else { n })
}

/// Coerce a numeric field. Returns `None` for values that are not numbers.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().ok()?
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Numeric field with absent or non-numeric values treated as 0.
pub fn number_or_zero(value: Option<&Value>) -> f64 {
    value.and_then(coerce_number).unwrap_or(0.0)
}

/// `{h}h {m}m` when at least an hour, else `{m}m`.
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Meters as kilometres with two decimals.
pub fn format_km(meters: f64) -> String {
    format!("{:.2}", meters / 1000.0)
}

fn string_field(record: &Map<String, Value>, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Normalize one raw record. Never fails; missing fields take their defaults.
pub fn normalize(mut raw: RawRecord) -> NormalizedReport {
    let id = string_field(&raw, "id").unwrap_or_default();
    let report_final = raw.get("report_final").map(coerce_final).unwrap_or(false);

    let (total_duration_seconds, formatted_duration) =
        match raw.get("total_breadcrumb_duration_seconds") {
            Some(v) => {
                let seconds = coerce_number(v).unwrap_or(0.0);
                (seconds, format_duration(seconds))
            }
            None => (0.0, "0m".to_string()),
        };

    let total_distance_km = match raw.get("total_breadcrumb_length_meters") {
        Some(v) => format_km(coerce_number(v).unwrap_or(0.0)),
        None => "0.00".to_string(),
    };

    let expand = match raw.get("expand") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    for field in DERIVED_FIELDS {
        raw.remove(field);
    }

    NormalizedReport {
        id,
        report_name: string_field(&raw, "report_name"),
        report_date: string_field(&raw, "report_date"),
        report_final,
        dist_mains_covered_length: number_or_zero(raw.get("dist_mains_covered_length")),
        total_duration_seconds,
        formatted_duration,
        total_distance_km,
        expand,
        driving_sessions: raw.get("driving_sessions").cloned(),
        extra: raw,
    }
}
