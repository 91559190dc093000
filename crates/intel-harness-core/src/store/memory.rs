//! In-memory [`RecordStore`] implementation for testing and demos.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Search runs the core matcher
//! over every stored record of the requested scopes, so results agree with
//! what the aggregator later counts and highlights.

use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::csv_record::PostPayload;
use crate::matcher::{matched_fields, MatchQuery};
use crate::models::{ForumSummary, Record, SearchRequest, SearchResults};
use crate::registry::{EntityType, FieldRegistry};

use super::{CreatedRecord, RecordStore, StoreError};

/// In-memory store for tests and demos.
pub struct InMemoryStore {
    forums: RwLock<Vec<ForumSummary>>,
    records: RwLock<Vec<(EntityType, Record)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            forums: RwLock::new(Vec::new()),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Registers a forum that posts may be imported into.
    pub fn add_forum(&self, id: &str, name: &str) {
        let mut forums = self.forums.write().unwrap_or_else(|e| e.into_inner());
        forums.push(ForumSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    /// Stores `record` as-is under `entity`.
    pub fn insert(&self, entity: EntityType, record: Record) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.push((entity, record));
    }

    pub fn records_of(&self, entity: &EntityType) -> Vec<Record> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .iter()
            .filter(|(e, _)| e == entity)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create_post(&self, payload: &PostPayload) -> Result<CreatedRecord, StoreError> {
        let known = {
            let forums = self.forums.read().unwrap_or_else(|e| e.into_inner());
            forums.iter().any(|f| f.id == payload.forum_id)
        };
        if !known {
            return Err(StoreError::Rejected {
                status: 422,
                detail: format!("unknown forum_id: {}", payload.forum_id),
            });
        }

        let id = Uuid::new_v4().to_string();
        let mut record = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(StoreError::Unexpected("payload is not an object".to_string())),
            Err(e) => return Err(StoreError::Unexpected(e.to_string())),
        };
        record.insert("id".to_string(), json!(id));
        self.insert(EntityType::ForumPosts, record);

        Ok(CreatedRecord { id: Some(id) })
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, StoreError> {
        let registry = FieldRegistry::global();
        let query = MatchQuery::new(&request.query, &request.filters);
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());

        let mut results = SearchResults::new();
        for (entity, record) in records.iter() {
            if !request.scopes.is_empty() && !request.scopes.contains(entity) {
                continue;
            }
            if request.is_blank()
                || !matched_fields(record, &query, registry, Some(entity)).is_empty()
            {
                results.push(entity.clone(), vec![record.clone()]);
            }
        }
        Ok(results)
    }

    async fn list_forums(&self) -> Result<Vec<ForumSummary>, StoreError> {
        Ok(self.forums.read().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterClause, Operator, TextOp};

    fn payload(forum: &str, title: &str) -> PostPayload {
        PostPayload {
            forum_id: forum.to_string(),
            url: "http://x".to_string(),
            title: title.to_string(),
            author_username: "alice".to_string(),
            content: "body".to_string(),
            category: "news".to_string(),
            comments: Vec::new(),
            number_comments: 0,
            date: "2024-05-20".to_string(),
        }
    }

    #[tokio::test]
    async fn create_requires_known_forum() {
        let store = InMemoryStore::new();
        let err = store.create_post(&payload("nope", "t")).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 422, .. }));

        store.add_forum("f1", "Breach Forum");
        let created = store.create_post(&payload("f1", "t")).await.unwrap();
        assert!(created.id.is_some());
        assert_eq!(store.records_of(&EntityType::ForumPosts).len(), 1);
    }

    #[tokio::test]
    async fn search_respects_scopes_and_query() {
        let store = InMemoryStore::new();
        store.add_forum("f1", "Breach Forum");
        store.create_post(&payload("f1", "Zero Day Sale")).await.unwrap();
        store.create_post(&payload("f1", "Combo list")).await.unwrap();
        store.insert(
            EntityType::Telegram,
            json!({ "name": "zero channel" }).as_object().unwrap().clone(),
        );

        let results = store.search(&SearchRequest::new("zero")).await.unwrap();
        assert_eq!(results.records(&EntityType::ForumPosts).len(), 1);
        assert_eq!(results.records(&EntityType::Telegram).len(), 1);

        let mut scoped = SearchRequest::new("zero");
        scoped.scopes = vec![EntityType::Telegram];
        let results = store.search(&scoped).await.unwrap();
        assert!(results.records(&EntityType::ForumPosts).is_empty());

        let mut filtered = SearchRequest::new("");
        filtered.filters = vec![FilterClause::new(
            1,
            "title",
            Operator::Text(TextOp::StartsWith),
            "combo",
        )];
        let results = store.search(&filtered).await.unwrap();
        assert_eq!(results.total(), 1);
    }

    #[tokio::test]
    async fn blank_request_returns_every_record() {
        let store = InMemoryStore::new();
        store.add_forum("f1", "Breach Forum");
        store.create_post(&payload("f1", "Zero Day Sale")).await.unwrap();
        store.create_post(&payload("f1", "Combo list")).await.unwrap();

        let mut request = SearchRequest::new("");
        request.filters = vec![FilterClause::new(1, "", Operator::Text(TextOp::Contains), "x")];
        assert!(request.is_blank());
        let results = store.search(&request).await.unwrap();
        assert_eq!(results.records(&EntityType::ForumPosts).len(), 2);
    }

    #[tokio::test]
    async fn list_forums_returns_registered() {
        let store = InMemoryStore::new();
        store.add_forum("f1", "One");
        store.add_forum("f2", "Two");
        let forums = store.list_forums().await.unwrap();
        assert_eq!(forums.len(), 2);
        assert_eq!(forums[1].name, "Two");
    }
}
