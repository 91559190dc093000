//! HTTP client for the remote record store.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | create post | `POST {base}/forum-posts/` with the JSON payload |
//! | search | `GET {base}/search?query=..&entity=..&filter=..` |
//! | list forums | `GET {base}/forums` |
//!
//! Failures are classified for the import log: a non-success status is
//! [`StoreError::Rejected`], a request that never completed is
//! [`StoreError::Transport`], and an unreadable body is
//! [`StoreError::Unexpected`].

use async_trait::async_trait;
use intel_harness_core::csv_record::PostPayload;
use intel_harness_core::dates::DateBasis;
use intel_harness_core::models::{record_id, ForumSummary, Record, SearchRequest, SearchResults};
use intel_harness_core::store::{CreatedRecord, RecordStore, StoreError};
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::query_params::to_query_string;

/// Longest response body excerpt kept in a rejection.
const DETAIL_LIMIT: usize = 200;

pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
    date_basis: DateBasis,
}

impl HttpRecordStore {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            date_basis: DateBasis::default(),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut store = Self::new(
            &config.store.base_url,
            Duration::from_secs(config.store.timeout_secs),
        )?;
        store.date_basis = config.search.date_basis;
        Ok(store)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, url: &str) -> Result<Value, StoreError> {
        tracing::debug!(%url, "GET");
        let resp = self.client.get(url).send().await.map_err(transport)?;
        let resp = check_status(resp).await?;
        resp.json::<Value>()
            .await
            .map_err(|e| StoreError::Unexpected(format!("invalid JSON response: {e}")))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn create_post(&self, payload: &PostPayload) -> Result<CreatedRecord, StoreError> {
        let url = format!("{}/forum-posts/", self.base_url);
        tracing::debug!(%url, title = %payload.title, "POST");

        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;

        // Stores differ in what they echo back; only the id is kept.
        let body = resp.text().await.unwrap_or_default();
        let id = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.as_object().and_then(record_id));
        Ok(CreatedRecord { id })
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, StoreError> {
        let url = format!(
            "{}/search?{}",
            self.base_url,
            to_query_string(request, self.date_basis)
        );
        let body = self.get_json(&url).await?;
        SearchResults::try_from(body).map_err(|e| StoreError::Unexpected(e.to_string()))
    }

    async fn list_forums(&self) -> Result<Vec<ForumSummary>, StoreError> {
        let url = format!("{}/forums", self.base_url);
        let body = self.get_json(&url).await?;
        let records: Vec<Record> = serde_json::from_value(body)
            .map_err(|e| StoreError::Unexpected(format!("invalid forum list: {e}")))?;

        Ok(records
            .iter()
            .filter_map(|r| {
                let id = record_id(r)?;
                let name = r
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Some(ForumSummary { id, name })
            })
            .collect())
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::Unexpected(err.to_string())
    } else {
        StoreError::Transport(err.to_string())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail: String = body.trim().chars().take(DETAIL_LIMIT).collect();
    tracing::warn!(status = status.as_u16(), %detail, "record store rejected request");
    Err(StoreError::Rejected {
        status: status.as_u16(),
        detail,
    })
}
