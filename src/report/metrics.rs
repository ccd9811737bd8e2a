//! Fleet statistics over the report cohorts.
//!
//! Distance, indication and gap figures only ever count final reports that
//! have surveys attached; the draft figures count drafts with surveys.

use serde::Serialize;

use super::cohort::{CohortCounts, Cohorts, TimePeriod};
use super::dedup::IndicationSet;
use super::models::{Report, VEHICLES};

/// Weekly distance target in kilometres.
pub const WEEKLY_TARGET_KM: f64 = 200.0;
/// Daily distance target, assuming five working days.
pub const DAILY_TARGET_KM: f64 = WEEKLY_TARGET_KM / 5.0;

/// Aggregated figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_reports: usize,
    pub calculation_reports_count: usize,
    pub report_counts: CohortCounts,
    pub total_distance: f64,
    pub car1_distance: f64,
    pub car2_distance: f64,
    pub car3_distance: f64,
    pub car4_distance: f64,
    pub total_draft_distance: f64,
    pub car1_draft_distance: f64,
    pub car2_draft_distance: f64,
    pub car3_draft_distance: f64,
    pub car4_draft_distance: f64,
    pub total_gaps: usize,
    pub total_indications: usize,
    pub total_raw_indications: usize,
    pub car1_lisa_count: usize,
    pub car2_lisa_count: usize,
    pub car3_lisa_count: usize,
    pub car4_lisa_count: usize,
    pub total_lisa_per_km: f64,
    pub car1_lisa_per_km: f64,
    pub car2_lisa_per_km: f64,
    pub car3_lisa_per_km: f64,
    pub car4_lisa_per_km: f64,
    // Filled in by the work-hours endpoint, not by the listing.
    pub total_work_hours: f64,
    pub car1_work_hours: f64,
    pub car2_work_hours: f64,
    pub car3_work_hours: f64,
    pub car4_work_hours: f64,
    pub weekly_target_km: f64,
    pub daily_target_km: f64,
    pub weekly_progress: f64,
    pub daily_progress: f64,
    pub time_period: TimePeriod,
}

fn distance(reports: &[&Report]) -> f64 {
    reports.iter().map(|r| r.dist_mains_covered_length).sum()
}

fn vehicle_distances(reports: &[&Report]) -> [f64; 4] {
    VEHICLES.map(|vehicle| {
        reports
            .iter()
            .filter(|r| r.is_vehicle(vehicle))
            .map(|r| r.dist_mains_covered_length)
            .sum()
    })
}

/// `count / km`, or 0 when no distance was covered.
pub fn per_km(count: usize, km: f64) -> f64 {
    if km > 0.0 {
        let rate = count as f64 / km;
        if rate.is_finite() {
            rate
        } else {
            0.0
        }
    } else {
        0.0
    }
}

/// Compute the statistics for one fetched page.
///
/// `listed` is the number of reports in the returned list.
pub fn aggregate(cohorts: &Cohorts<'_>, listed: usize, period: TimePeriod) -> Stats {
    let fws = &cohorts.final_with_surveys;
    let dws = &cohorts.draft_with_surveys;

    let total_distance = distance(fws);
    let car_distance = vehicle_distances(fws);
    let total_draft_distance = distance(dws);
    let car_draft_distance = vehicle_distances(dws);

    let mut unique = IndicationSet::new();
    for report in fws {
        unique.extend(&report.indications, report.surveyor_unit_desc.as_deref());
    }
    let total_indications = unique.len();
    let car_lisa = VEHICLES.map(|vehicle| unique.count_for_vehicle(vehicle));
    let car_lisa_per_km: Vec<f64> = car_lisa
        .iter()
        .zip(car_distance.iter())
        .map(|(count, km)| per_km(*count, *km))
        .collect();

    let total_gaps: usize = fws
        .iter()
        .map(|r| {
            if r.field_of_view_gaps_count > 0 {
                tracing::debug!(
                    "Adding {} gaps from report {}",
                    r.field_of_view_gaps_count,
                    r.label()
                );
            }
            r.field_of_view_gaps_count
        })
        .sum();
    tracing::debug!(
        "Total gaps {} from {} final reports with surveys",
        total_gaps,
        fws.len()
    );

    let weekly_progress = match period {
        TimePeriod::Week => total_distance / WEEKLY_TARGET_KM * 100.0,
        _ => 0.0,
    };
    let daily_progress = match period {
        TimePeriod::Today => total_distance / DAILY_TARGET_KM * 100.0,
        _ => 0.0,
    };

    Stats {
        total_reports: listed,
        calculation_reports_count: cohorts.final_reports.len(),
        report_counts: cohorts.counts(),
        total_distance,
        car1_distance: car_distance[0],
        car2_distance: car_distance[1],
        car3_distance: car_distance[2],
        car4_distance: car_distance[3],
        total_draft_distance,
        car1_draft_distance: car_draft_distance[0],
        car2_draft_distance: car_draft_distance[1],
        car3_draft_distance: car_draft_distance[2],
        car4_draft_distance: car_draft_distance[3],
        total_gaps,
        total_indications,
        total_raw_indications: fws.iter().map(|r| r.indications_count).sum(),
        car1_lisa_count: car_lisa[0],
        car2_lisa_count: car_lisa[1],
        car3_lisa_count: car_lisa[2],
        car4_lisa_count: car_lisa[3],
        total_lisa_per_km: per_km(total_indications, total_distance),
        car1_lisa_per_km: car_lisa_per_km[0],
        car2_lisa_per_km: car_lisa_per_km[1],
        car3_lisa_per_km: car_lisa_per_km[2],
        car4_lisa_per_km: car_lisa_per_km[3],
        total_work_hours: 0.0,
        car1_work_hours: 0.0,
        car2_work_hours: 0.0,
        car3_work_hours: 0.0,
        car4_work_hours: 0.0,
        weekly_target_km: WEEKLY_TARGET_KM,
        daily_target_km: DAILY_TARGET_KM,
        weekly_progress,
        daily_progress,
        time_period: period,
    }
}
