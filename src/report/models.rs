//! Report model types.

use serde::Serialize;
use serde_json::{Map, Value};

/// Vehicle labels tracked by the dashboard, in bucket order.
pub const VEHICLES: [&str; 4] = ["Vehicle #1", "Vehicle #2", "Vehicle #3", "Vehicle #4"];

/// A report after field normalization, before relations are flattened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedReport {
    pub id: String,
    pub report_name: Option<String>,
    pub report_date: Option<String>,
    pub report_final: bool,
    /// Mains distance covered, 0 when absent or not numeric
    pub dist_mains_covered_length: f64,
    pub total_duration_seconds: f64,
    pub formatted_duration: String,
    pub total_distance_km: String,
    /// Expanded relations keyed by relation name
    pub expand: Map<String, Value>,
    /// Direct `driving_sessions` relation field (ids)
    pub driving_sessions: Option<Value>,
    /// Every other field, echoed back untouched
    pub extra: Map<String, Value>,
}

/// A leak indication read from a report's back-relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Indication(pub Map<String, Value>);

impl Indication {
    /// Identity: `lisa_id`, falling back to `lisa_name`.
    pub fn key(&self) -> Option<String> {
        identity(self.0.get("lisa_id")).or_else(|| identity(self.0.get("lisa_name")))
    }
}

/// Identity key of a truthy id value, tagged with its JSON type.
///
/// Empty strings, zero, `false` and null count as absent. The tag keeps
/// `17` and `"17"` apart.
pub fn identity(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(format!("s:{}", s)),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(format!("n:{}", n)),
        Value::Bool(true) => Some("b:true".to_string()),
        other @ (Value::Array(_) | Value::Object(_)) => Some(format!("j:{}", other)),
        _ => None,
    }
}

/// A fully processed report as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: String,
    pub report_final: bool,
    pub total_duration_seconds: f64,
    pub formatted_duration: String,
    pub total_distance_km: String,
    pub has_surveys: bool,
    pub surveyor_unit_desc: Option<String>,
    pub indications: Vec<Indication>,
    #[serde(rename = "indicationsCount")]
    pub indications_count: usize,
    #[serde(rename = "uniqueIndicationsCount")]
    pub unique_indications_count: usize,
    #[serde(rename = "fieldOfViewGapsCount")]
    pub field_of_view_gaps_count: usize,
    #[serde(skip)]
    pub report_name: Option<String>,
    #[serde(skip)]
    pub report_date: Option<String>,
    #[serde(skip)]
    pub dist_mains_covered_length: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Report {
    /// Name used in log lines.
    pub fn label(&self) -> &str {
        self.report_name.as_deref().unwrap_or(&self.id)
    }

    /// Whether this report belongs to the given vehicle label.
    pub fn is_vehicle(&self, vehicle: &str) -> bool {
        self.surveyor_unit_desc.as_deref() == Some(vehicle)
    }
}
