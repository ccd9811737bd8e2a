//! Filter expressions in the record store's query syntax.

use chrono::NaiveDate;
use std::fmt;

/// A conjunction of filter clauses, rendered as `a && b && c`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field >= "YYYY-MM-DD"`
    pub fn on_or_after(mut self, field: &str, date: NaiveDate) -> Self {
        self.clauses
            .push(format!("{} >= \"{}\"", field, date.format("%Y-%m-%d")));
        self
    }

    /// `field=value`
    pub fn equals(mut self, field: &str, value: i64) -> Self {
        self.clauses.push(format!("{}={}", field, value));
        self
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clauses.join(" && "))
    }
}
