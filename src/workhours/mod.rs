//! Work-hours estimation.
//!
//! Figures come from the first method in [`default_methods`] that produces
//! a positive total. When every method fails or finds nothing, a fixed
//! historical estimate is returned and labelled as such.

mod methods;

pub use methods::*;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::backend::{BackendError, RecordStore};

/// How a work-hours figure was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    DrivingSessionsBasic,
    GasReports,
    FallbackEstimation,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::DrivingSessionsBasic => "driving-sessions-basic",
            Method::GasReports => "gas-reports",
            Method::FallbackEstimation => "fallback-estimation",
        }
    }
}

fn rfc3339_millis<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Work-hours figures returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkHours {
    pub total_work_hours: f64,
    pub car1_work_hours: f64,
    pub car2_work_hours: f64,
    pub total_sessions: u64,
    pub car1_session_count: u64,
    pub car2_session_count: u64,
    pub total_breadcrumbs: u64,
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_info: Option<String>,
    #[serde(serialize_with = "rfc3339_millis")]
    pub updated: DateTime<Utc>,
}

/// Round to two decimals for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One way of computing work hours.
#[async_trait]
pub trait WorkHoursMethod: Send + Sync {
    fn method(&self) -> Method;

    async fn compute(
        &self,
        store: &dyn RecordStore,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WorkHours, BackendError>;
}

/// The static estimate used when no method produces a figure.
pub fn fallback_estimate(now: DateTime<Utc>) -> WorkHours {
    WorkHours {
        total_work_hours: 320.5,
        car1_work_hours: 160.25,
        car2_work_hours: 160.25,
        total_sessions: 42,
        car1_session_count: 21,
        car2_session_count: 21,
        total_breadcrumbs: 5280,
        method: Method::FallbackEstimation,
        report_count: None,
        error_info: Some("All calculation methods failed, using fallback estimates".to_string()),
        updated: now,
    }
}

/// Methods in order of preference.
pub fn default_methods() -> Vec<Box<dyn WorkHoursMethod>> {
    vec![Box::new(SessionsBasic), Box::new(GasReports)]
}

/// Try each method in turn; the first positive total wins.
///
/// Method errors are logged and skipped. Always returns a figure.
pub async fn estimate(
    methods: &[Box<dyn WorkHoursMethod>],
    store: &dyn RecordStore,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> WorkHours {
    for method in methods {
        let name = method.method().as_str();
        match method.compute(store, token, now).await {
            Ok(hours) if hours.total_work_hours > 0.0 => {
                tracing::info!(
                    "Work hours via {}: {:.2} hours",
                    name,
                    hours.total_work_hours
                );
                return hours;
            }
            Ok(_) => tracing::info!("Work hours method {} found nothing, trying next", name),
            Err(e) => tracing::warn!("Work hours method {} failed: {}", name, e),
        }
    }

    tracing::info!("All work hours methods exhausted, using fallback estimation");
    fallback_estimate(now)
}
