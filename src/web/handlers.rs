//! HTTP request handlers.

use super::error::ApiError;
use super::session::Session;
use super::AppState;
use crate::backend::RawRecord;
use crate::report::{list_reports, parse_int_prefix, ListingQuery, TimePeriod};
use crate::workhours::estimate;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

const REPORTS_CACHE_CONTROL: &str = "private, max-age=60";

// ============================================================================
// API: Reports
// ============================================================================

/// Query string of the reports endpoint. Values are parsed leniently.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsParams {
    pub limit: Option<String>,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub final_only: Option<String>,
    pub include_unit_desc: Option<String>,
    pub with_surveys: Option<String>,
    pub time_period: Option<String>,
}

/// Leading integer of `value` (`"50abc"` is 50), or `default` when absent or not positive.
fn positive_or(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(parse_int_prefix)
        .filter(|n| *n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(default)
}

impl ReportsParams {
    pub fn into_query(self) -> ListingQuery {
        let defaults = ListingQuery::default();
        ListingQuery {
            limit: positive_or(self.limit.as_deref(), defaults.limit),
            page: positive_or(self.page.as_deref(), defaults.page),
            sort: self
                .sort
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.sort),
            final_only: self.final_only.as_deref() != Some("false"),
            include_unit_desc: self.include_unit_desc.as_deref() == Some("true"),
            with_surveys: self.with_surveys.as_deref() != Some("false"),
            time_period: self
                .time_period
                .as_deref()
                .map(TimePeriod::parse)
                .unwrap_or_default(),
        }
    }
}

pub async fn handle_get_reports(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    Query(params): Query<ReportsParams>,
) -> Result<Response, ApiError> {
    // Absent only when the router is built without the session layer.
    let Some(Extension(session)) = session else {
        return Err(ApiError::BackendUnavailable);
    };

    let query = params.into_query();
    tracing::debug!("Listing reports with {:?}", query);

    match list_reports(state.store.as_ref(), session.token(), &query, Utc::now()).await {
        Ok(listing) => Ok((
            [(header::CACHE_CONTROL, REPORTS_CACHE_CONTROL)],
            Json(listing),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Error fetching reports: {}", e);
            Err(ApiError::ReportsFailed(e))
        }
    }
}

// ============================================================================
// API: Work hours
// ============================================================================

pub async fn handle_get_work_hours(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
) -> Result<Response, ApiError> {
    // Absent only when the router is built without the session layer.
    let Some(Extension(session)) = session else {
        return Err(ApiError::WorkHoursFailed(
            "PocketBase client not initialized".to_string(),
        ));
    };
    if !session.is_authenticated() {
        return Err(ApiError::Unauthenticated);
    }

    let hours = estimate(
        &state.methods,
        state.store.as_ref(),
        session.token(),
        Utc::now(),
    )
    .await;
    Ok(Json(hours).into_response())
}

// ============================================================================
// API: Session
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub authenticated: bool,
    pub is_admin: bool,
    pub user: Option<RawRecord>,
}

pub async fn handle_get_session(Extension(session): Extension<Session>) -> impl IntoResponse {
    Json(SessionInfo {
        authenticated: session.is_authenticated(),
        is_admin: session.is_admin,
        user: session.user,
    })
}

// ============================================================================
// API: Backend health
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendHealth {
    pub pb_status: &'static str,
    pub pb_error: Option<String>,
    pub pb_url: String,
}

pub async fn handle_backend_health(State(state): State<AppState>) -> impl IntoResponse {
    let (pb_status, pb_error) = match state.store.health().await {
        Ok(()) => ("connected", None),
        Err(e) => {
            tracing::warn!("Backend health check failed: {}", e);
            ("error", Some(e.to_string()))
        }
    };

    Json(BackendHealth {
        pb_status,
        pb_error,
        pb_url: state.store.base_url().to_string(),
    })
}
