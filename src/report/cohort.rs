//! Date filters and report cohorts.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::models::Report;
use crate::backend::Filter;

/// Reports dated before this are never considered.
pub const BASELINE_CUTOFF: (i32, u32, u32) = (2025, 7, 1);

/// Hour (UTC) on Monday at which a reporting week starts.
const WEEK_START_HOUR: u32 = 12;

pub fn baseline_cutoff() -> NaiveDate {
    let (y, m, d) = BASELINE_CUTOFF;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Reporting window selected on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl TimePeriod {
    /// Parse a query value; anything unrecognised means `All`.
    pub fn parse(s: &str) -> Self {
        match s {
            "today" => TimePeriod::Today,
            "week" => TimePeriod::Week,
            "month" => TimePeriod::Month,
            _ => TimePeriod::All,
        }
    }

    /// First report date inside the window, if the window is bounded.
    pub fn start_date(self, now: DateTime<Utc>) -> Option<NaiveDate> {
        match self {
            TimePeriod::Today => Some(now.date_naive()),
            TimePeriod::Week => Some(week_start(now).date_naive()),
            TimePeriod::Month => now.date_naive().with_day(1),
            TimePeriod::All => None,
        }
    }
}

/// Most recent Monday 12:00 UTC at or before `now`.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_monday = now.weekday().num_days_from_monday() as i64;
    let monday = now.date_naive() - ChronoDuration::days(days_from_monday);
    let start = Utc.from_utc_datetime(
        &monday
            .and_hms_opt(WEEK_START_HOUR, 0, 0)
            .unwrap_or_else(|| monday.and_time(Default::default())),
    );
    if now < start {
        start - ChronoDuration::days(7)
    } else {
        start
    }
}

/// Baseline cutoff plus the period bound on `field`.
pub fn date_filter(field: &str, period: TimePeriod, now: DateTime<Utc>) -> Filter {
    let filter = Filter::new().on_or_after(field, baseline_cutoff());
    match period.start_date(now) {
        Some(start) => filter.on_or_after(field, start),
        None => filter,
    }
}

/// Report subsets used as denominators for different metrics.
#[derive(Debug, Default)]
pub struct Cohorts<'a> {
    pub all: Vec<&'a Report>,
    pub with_surveys: Vec<&'a Report>,
    pub final_reports: Vec<&'a Report>,
    pub final_with_surveys: Vec<&'a Report>,
    pub draft_with_surveys: Vec<&'a Report>,
}

/// Sizes of each cohort, as reported in the stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortCounts {
    pub all: usize,
    pub with_surveys: usize,
    #[serde(rename = "final")]
    pub final_reports: usize,
    pub final_with_surveys: usize,
    pub draft_with_surveys: usize,
}

impl<'a> Cohorts<'a> {
    /// Partition a fetched page.
    pub fn partition(reports: &'a [Report]) -> Self {
        let mut cohorts = Cohorts::default();
        for report in reports {
            cohorts.all.push(report);
            if report.report_final {
                cohorts.final_reports.push(report);
            }
            if report.has_surveys {
                cohorts.with_surveys.push(report);
                if report.report_final {
                    cohorts.final_with_surveys.push(report);
                } else {
                    cohorts.draft_with_surveys.push(report);
                }
            }
        }
        cohorts
    }

    pub fn counts(&self) -> CohortCounts {
        CohortCounts {
            all: self.all.len(),
            with_surveys: self.with_surveys.len(),
            final_reports: self.final_reports.len(),
            final_with_surveys: self.final_with_surveys.len(),
            draft_with_surveys: self.draft_with_surveys.len(),
        }
    }
}
