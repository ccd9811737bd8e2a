//! PocketBase REST implementation of [`RecordStore`].

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::store::{AuthRefresh, BackendError, ListOptions, ListResult, RawRecord, RecordStore};
use super::USERS_COLLECTION;

/// Client for a PocketBase instance.
#[derive(Clone)]
pub struct PocketBase {
    base_url: String,
    client: reqwest::Client,
}

impl PocketBase {
    /// Create a client for the instance at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("leakboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Request(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{}/records", self.base_url, collection)
    }

    fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) if !token.is_empty() => request.header(AUTHORIZATION, token),
            _ => request,
        }
    }
}

/// Turn a non-success response into [`BackendError::Status`], else decode the body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl RecordStore for PocketBase {
    async fn get_list(
        &self,
        token: Option<&str>,
        collection: &str,
        page: u32,
        per_page: u32,
        options: &ListOptions,
    ) -> Result<ListResult, BackendError> {
        let mut query: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("perPage", per_page.to_string()),
        ];
        if let Some(sort) = &options.sort {
            query.push(("sort", sort.clone()));
        }
        if let Some(filter) = &options.filter {
            query.push(("filter", filter.clone()));
        }
        if let Some(expand) = &options.expand {
            query.push(("expand", expand.clone()));
        }
        if let Some(fields) = &options.fields {
            query.push(("fields", fields.clone()));
        }

        tracing::debug!("GET {} page={} perPage={}", collection, page, per_page);

        let request = self.client.get(self.records_url(collection)).query(&query);
        let response = Self::authorize(request, token).send().await?;
        decode(response).await
    }

    async fn auth_refresh(&self, token: &str) -> Result<AuthRefresh, BackendError> {
        let url = format!(
            "{}/api/collections/{}/auth-refresh",
            self.base_url, USERS_COLLECTION
        );
        let request = self.client.post(url);
        let response = Self::authorize(request, Some(token)).send().await?;
        decode(response).await
    }

    async fn update_record(
        &self,
        token: Option<&str>,
        collection: &str,
        id: &str,
        patch: &RawRecord,
    ) -> Result<RawRecord, BackendError> {
        let url = format!("{}/{}", self.records_url(collection), id);
        let request = self.client.patch(url).json(patch);
        let response = Self::authorize(request, token).send().await?;
        decode(response).await
    }

    async fn health(&self) -> Result<(), BackendError> {
        let url = format!("{}/api/health", self.base_url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Status {
                status: status.as_u16(),
                message: format!("Received response with status: {}", status.as_u16()),
            })
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
