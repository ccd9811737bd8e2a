//! Report aggregation pipeline.
//!
//! Raw report records are normalized, their relations flattened, then the
//! page is split into cohorts and aggregated into dashboard statistics.

mod cohort;
mod dedup;
mod listing;
mod metrics;
mod models;
mod normalize;
mod relations;

pub use cohort::{baseline_cutoff, TimePeriod};
pub use listing::{list_reports, ListingQuery};
pub use normalize::parse_int_prefix;
