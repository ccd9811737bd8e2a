//! The report listing: fetch, process and aggregate one page of reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cohort::{date_filter, Cohorts, TimePeriod};
use super::metrics::{aggregate, Stats};
use super::models::Report;
use super::normalize::normalize;
use super::relations::{expand_param, flatten};
use crate::backend::{BackendError, ListOptions, RecordStore, REPORTS_COLLECTION};

/// Note attached when the final-only filter had to be dropped.
pub const NO_FINAL_REPORTS_NOTE: &str = "No final reports found, returning all reports";

/// Listing parameters after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub limit: u32,
    pub page: u32,
    pub sort: String,
    pub final_only: bool,
    pub include_unit_desc: bool,
    pub with_surveys: bool,
    pub time_period: TimePeriod,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            limit: 1000,
            page: 1,
            sort: "-report_date".to_string(),
            final_only: true,
            include_unit_desc: false,
            with_surveys: true,
            time_period: TimePeriod::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingMeta {
    pub page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub per_page: u32,
    pub calculation_reports_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub reports: Vec<Report>,
    pub stats: Stats,
    pub meta: ListingMeta,
}

/// Fetch a page of reports and compute the dashboard statistics over it.
pub async fn list_reports(
    store: &dyn RecordStore,
    token: Option<&str>,
    query: &ListingQuery,
    now: DateTime<Utc>,
) -> Result<Listing, BackendError> {
    let dated = date_filter("report_date", query.time_period, now);
    let dated_final = dated.clone().equals("report_final", 1);

    let count_all = store
        .get_list(
            token,
            REPORTS_COLLECTION,
            1,
            1,
            &ListOptions::default().filter(&dated),
        )
        .await?
        .total_items;
    let count_final = if query.final_only {
        store
            .get_list(
                token,
                REPORTS_COLLECTION,
                1,
                1,
                &ListOptions::default().filter(&dated_final),
            )
            .await?
            .total_items
    } else {
        count_all
    };

    let use_all_reports = query.final_only && count_final == 0 && count_all > 0;
    let filter = if query.final_only && !use_all_reports {
        dated_final
    } else {
        dated
    };
    if use_all_reports {
        tracing::info!(
            "No final reports among {} dated reports, listing all of them",
            count_all
        );
    }

    let options = ListOptions::default()
        .sort(query.sort.clone())
        .filter(&filter)
        .expand(expand_param(query.include_unit_desc));
    let result = store
        .get_list(token, REPORTS_COLLECTION, query.page, query.limit, &options)
        .await?;

    let processed: Vec<Report> = result
        .items
        .into_iter()
        .map(|raw| flatten(normalize(raw), query.include_unit_desc))
        .collect();

    let listed = if query.with_surveys {
        processed.iter().filter(|r| r.has_surveys).count()
    } else {
        processed.len()
    };

    let cohorts = Cohorts::partition(&processed);
    let stats = aggregate(&cohorts, listed, query.time_period);
    let counts = cohorts.counts();
    drop(cohorts);

    tracing::info!(
        "Processed {} reports: {} final, {} final with surveys, {} listed, {} raw / {} unique indications",
        counts.all,
        counts.final_reports,
        counts.final_with_surveys,
        listed,
        stats.total_raw_indications,
        stats.total_indications
    );

    let reports: Vec<Report> = if query.with_surveys {
        processed.into_iter().filter(|r| r.has_surveys).collect()
    } else {
        processed
    };

    let meta = ListingMeta {
        page: result.page,
        total_pages: result.total_pages,
        total_items: if query.with_surveys {
            reports.len() as u64
        } else {
            result.total_items
        },
        per_page: result.per_page,
        calculation_reports_count: counts.final_reports,
        note: use_all_reports.then(|| NO_FINAL_REPORTS_NOTE.to_string()),
    };

    Ok(Listing {
        reports,
        stats,
        meta,
    })
}
