//! Record store trait and shared wire types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A raw record as returned by the record store.
pub type RawRecord = Map<String, Value>;

/// Record store error types.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("record store returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

/// Options for a paginated list query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub expand: Option<String>,
    pub fields: Option<String>,
}

impl ListOptions {
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn filter(mut self, filter: impl ToString) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

/// One page of records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub items: Vec<RawRecord>,
}

/// Result of a successful auth refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthRefresh {
    pub token: String,
    #[serde(default)]
    pub record: RawRecord,
}

/// Access to the hosted record store.
///
/// `token` is the caller's auth token; `None` queries as a guest.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one page of a collection.
    async fn get_list(
        &self,
        token: Option<&str>,
        collection: &str,
        page: u32,
        per_page: u32,
        options: &ListOptions,
    ) -> Result<ListResult, BackendError>;

    /// Verify and refresh an auth token against the users collection.
    async fn auth_refresh(&self, token: &str) -> Result<AuthRefresh, BackendError>;

    /// Patch fields of a single record.
    async fn update_record(
        &self,
        token: Option<&str>,
        collection: &str,
        id: &str,
        patch: &RawRecord,
    ) -> Result<RawRecord, BackendError>;

    /// Check that the record store answers its health endpoint.
    async fn health(&self) -> Result<(), BackendError>;

    /// Base URL shown in diagnostics.
    fn base_url(&self) -> &str;
}
