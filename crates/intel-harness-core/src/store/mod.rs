//! Record store abstraction.
//!
//! The [`RecordStore`] trait covers the operations the import pipeline and
//! the search engine need from the remote record store, enabling pluggable
//! backends (the HTTP store client, the in-memory store used by tests and
//! demos).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::csv_record::PostPayload;
use crate::models::{ForumSummary, SearchRequest, SearchResults};

/// Failure talking to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("store rejected the request (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },
    /// The request never completed (connection refused, timeout, ...).
    #[error("store unreachable: {0}")]
    Transport(String),
    /// Anything else, e.g. an undecodable response body.
    #[error("unexpected store failure: {0}")]
    Unexpected(String),
}

/// Acknowledgement of a created record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatedRecord {
    /// Identifier assigned by the store, when it reports one.
    pub id: Option<String>,
}

/// Abstract record store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`create_post`](RecordStore::create_post) | Create one forum post |
/// | [`search`](RecordStore::search) | Query records across entity types |
/// | [`list_forums`](RecordStore::list_forums) | List import destinations |
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates one forum post. The payload carries its destination forum.
    async fn create_post(&self, payload: &PostPayload) -> Result<CreatedRecord, StoreError>;

    /// Runs a search and returns the matching records grouped by entity type.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, StoreError>;

    /// Lists the forums posts can be imported into.
    async fn list_forums(&self) -> Result<Vec<ForumSummary>, StoreError>;
}
