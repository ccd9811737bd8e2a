//! Flattening expanded relations into derived report fields.

use serde_json::Value;

use super::dedup::{distinct_gap_ids, unique_count};
use super::models::{Indication, NormalizedReport, Report};

/// Relation names the listing asks the record store to expand.
pub const SESSIONS_RELATION: &str = "driving_sessions";
pub const INDICATIONS_RELATION: &str = "indications_via_report";
pub const GAPS_RELATION: &str = "field_of_view_gaps";

/// Unit label used when a report has no usable driving session.
pub const UNKNOWN_UNIT: &str = "n/a";

/// The `expand` parameter for a listing query.
pub fn expand_param(include_unit_desc: bool) -> String {
    let mut relations = Vec::with_capacity(3);
    if include_unit_desc {
        relations.push(SESSIONS_RELATION);
    }
    relations.push(INDICATIONS_RELATION);
    relations.push(GAPS_RELATION);
    relations.join(",")
}

fn non_empty_array(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Array(items)) if !items.is_empty())
}

fn array(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn unit_desc(report: &NormalizedReport) -> String {
    array(report.expand.get(SESSIONS_RELATION))
        .first()
        .and_then(|session| session.get("surveyor_unit_desc"))
        .and_then(Value::as_str)
        .filter(|desc| !desc.is_empty())
        .unwrap_or(UNKNOWN_UNIT)
        .to_string()
}

/// Derive survey, indication and gap fields from a normalized report.
pub fn flatten(report: NormalizedReport, include_unit_desc: bool) -> Report {
    let has_surveys = non_empty_array(report.expand.get(SESSIONS_RELATION))
        || non_empty_array(report.driving_sessions.as_ref());

    let surveyor_unit_desc = include_unit_desc.then(|| unit_desc(&report));

    let indications: Vec<Indication> = array(report.expand.get(INDICATIONS_RELATION))
        .iter()
        .filter_map(|v| v.as_object().cloned().map(Indication))
        .collect();
    let indications_count = array(report.expand.get(INDICATIONS_RELATION)).len();
    let unique_indications_count = unique_count(&indications);

    let gaps = array(report.expand.get(GAPS_RELATION));
    if !gaps.is_empty() {
        let label = report.report_name.as_deref().unwrap_or(&report.id);
        tracing::debug!("Report {}: {} gaps found", label, gaps.len());
        let distinct = distinct_gap_ids(gaps);
        if distinct != gaps.len() {
            tracing::warn!(
                "Report {}: found {} gaps but only {} unique gap ids, potential duplicates",
                label,
                gaps.len(),
                distinct
            );
        }
    }
    let field_of_view_gaps_count = gaps.len();

    Report {
        id: report.id,
        report_final: report.report_final,
        total_duration_seconds: report.total_duration_seconds,
        formatted_duration: report.formatted_duration,
        total_distance_km: report.total_distance_km,
        has_surveys,
        surveyor_unit_desc,
        indications,
        indications_count,
        unique_indications_count,
        field_of_view_gaps_count,
        report_name: report.report_name,
        report_date: report.report_date,
        dist_mains_covered_length: report.dist_mains_covered_length,
        extra: report.extra,
    }
}
