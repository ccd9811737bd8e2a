//! Record store module for leakboard.
//!
//! Talks to the PocketBase collections the dashboard reads from.

mod filter;
mod pocketbase;
mod store;

#[cfg(test)]
mod memory;

pub use filter::*;
pub use pocketbase::*;
pub use store::*;

#[cfg(test)]
pub use memory::*;

/// Collection holding survey reports.
pub const REPORTS_COLLECTION: &str = "gas_reports";
/// Collection holding driving sessions.
pub const SESSIONS_COLLECTION: &str = "driving_sessions";
/// Auth collection for dashboard users.
pub const USERS_COLLECTION: &str = "users";
