//! In-memory record store for tests.
//!
//! Understands the subset of filter syntax produced by [`super::Filter`].

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use super::store::{AuthRefresh, BackendError, ListOptions, ListResult, RawRecord, RecordStore};

#[derive(Default)]
struct MemoryData {
    collections: HashMap<String, Vec<RawRecord>>,
    failing: HashSet<String>,
    users: HashMap<String, RawRecord>,
    updates: Vec<(String, String, RawRecord)>,
    healthy: bool,
}

/// Record store backed by in-memory collections.
#[derive(Clone)]
pub struct MemoryStore {
    data: Arc<RwLock<MemoryData>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let data = MemoryData {
            healthy: true,
            ..Default::default()
        };
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Replace the records of a collection.
    pub fn with_records(self, collection: &str, records: Vec<Value>) -> Self {
        let records = records
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.data
            .write()
            .unwrap()
            .collections
            .insert(collection.to_string(), records);
        self
    }

    /// Make every list query and update against `collection` fail.
    pub fn failing(self, collection: &str) -> Self {
        self.data
            .write()
            .unwrap()
            .failing
            .insert(collection.to_string());
        self
    }

    /// Accept `token` as a valid session for `user`.
    pub fn with_user(self, token: &str, user: Value) -> Self {
        if let Value::Object(map) = user {
            self.data
                .write()
                .unwrap()
                .users
                .insert(token.to_string(), map);
        }
        self
    }

    pub fn unhealthy(self) -> Self {
        self.data.write().unwrap().healthy = false;
        self
    }

    /// Patches applied through [`RecordStore::update_record`].
    pub fn updates(&self) -> Vec<(String, String, RawRecord)> {
        self.data.read().unwrap().updates.clone()
    }
}

fn clause_matches(record: &RawRecord, clause: &str) -> bool {
    if let Some((field, value)) = clause.split_once(" >= ") {
        let bound = value.trim_matches('"');
        return record
            .get(field.trim())
            .and_then(|v| v.as_str())
            .map(|s| s >= bound)
            .unwrap_or(false);
    }
    if let Some((field, value)) = clause.split_once('=') {
        let expected: f64 = match value.trim().parse() {
            Ok(n) => n,
            Err(_) => return false,
        };
        return match record.get(field.trim()) {
            Some(Value::Number(n)) => n.as_f64() == Some(expected),
            Some(Value::Bool(b)) => (*b as i64 as f64) == expected,
            Some(Value::String(s)) => s.parse::<f64>().ok() == Some(expected),
            _ => false,
        };
    }
    false
}

fn matches(record: &RawRecord, filter: Option<&str>) -> bool {
    match filter {
        Some(f) if !f.is_empty() => f.split(" && ").all(|c| clause_matches(record, c)),
        _ => true,
    }
}

fn sort_key(record: &RawRecord, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_list(
        &self,
        _token: Option<&str>,
        collection: &str,
        page: u32,
        per_page: u32,
        options: &ListOptions,
    ) -> Result<ListResult, BackendError> {
        let data = self.data.read().unwrap();
        if data.failing.contains(collection) {
            return Err(BackendError::Request(format!(
                "connection refused while listing {}",
                collection
            )));
        }

        let mut items: Vec<RawRecord> = data
            .collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| matches(r, options.filter.as_deref()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = options.sort.as_deref() {
            let (field, descending) = match sort.strip_prefix('-') {
                Some(field) => (field, true),
                None => (sort, false),
            };
            items.sort_by_key(|r| sort_key(r, field));
            if descending {
                items.reverse();
            }
        }

        if options.expand.is_none() {
            for item in &mut items {
                item.remove("expand");
            }
        }

        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_items = items.len() as u64;
        let total_pages = total_items.div_ceil(per_page as u64);
        let start = ((page - 1) * per_page) as usize;
        let items = items
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Ok(ListResult {
            page,
            per_page,
            total_items,
            total_pages,
            items,
        })
    }

    async fn auth_refresh(&self, token: &str) -> Result<AuthRefresh, BackendError> {
        let data = self.data.read().unwrap();
        match data.users.get(token) {
            Some(user) => Ok(AuthRefresh {
                token: format!("{}-refreshed", token),
                record: user.clone(),
            }),
            None => Err(BackendError::Status {
                status: 401,
                message: "The request requires valid record authorization token.".to_string(),
            }),
        }
    }

    async fn update_record(
        &self,
        _token: Option<&str>,
        collection: &str,
        id: &str,
        patch: &RawRecord,
    ) -> Result<RawRecord, BackendError> {
        let mut data = self.data.write().unwrap();
        if data.failing.contains(collection) {
            return Err(BackendError::Status {
                status: 403,
                message: format!("Failed to update record {} in {}.", id, collection),
            });
        }
        data.updates
            .push((collection.to_string(), id.to_string(), patch.clone()));
        Ok(patch.clone())
    }

    async fn health(&self) -> Result<(), BackendError> {
        if self.data.read().unwrap().healthy {
            Ok(())
        } else {
            Err(BackendError::Status {
                status: 503,
                message: "Received response with status: 503".to_string(),
            })
        }
    }

    fn base_url(&self) -> &str {
        "memory://"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_filters_and_paginates() {
        let store = MemoryStore::new().with_records(
            "gas_reports",
            vec![
                json!({"id": "a", "report_date": "2025-06-30", "report_final": 1}),
                json!({"id": "b", "report_date": "2025-07-02", "report_final": 1}),
                json!({"id": "c", "report_date": "2025-07-03", "report_final": 0}),
            ],
        );

        let opts = ListOptions::default()
            .filter(r#"report_date >= "2025-07-01" && report_final=1"#)
            .sort("-report_date");
        let page = store.get_list(None, "gas_reports", 1, 10, &opts).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0]["id"], "b");

        let opts = ListOptions::default().sort("-report_date");
        let page = store.get_list(None, "gas_reports", 2, 2, &opts).await.unwrap();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0]["id"], "a");
    }
}
