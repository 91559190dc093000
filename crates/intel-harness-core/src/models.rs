//! Core data models shared by the import pipeline and the search engine.
//!
//! Records are open attribute maps: the remote store owns their shape and
//! each entity type carries different keys. Key order is preserved as
//! received, since free-text matching and preview selection walk keys in
//! object order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::FilterClause;
use crate::registry::EntityType;

/// One entity instance (forum post, ransomware entry, ...), as returned by
/// the record store.
pub type Record = Map<String, Value>;

/// Returns the record's identifying key as a string, if present.
///
/// Stores use both UUID strings and integers for `id`.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Records of a single entity type within a search response.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityResults {
    pub entity: EntityType,
    pub records: Vec<Record>,
}

/// A search response: entity type → matching records, in the order the
/// store listed the entity types.
///
/// Decoded from the `{ "<entityType>": [Record, ...] }` shape. A missing
/// key means zero records of that type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    sets: Vec<EntityResults>,
}

/// Raised when a search response does not have the expected shape.
#[derive(Debug, Error, PartialEq)]
pub enum SearchResultsError {
    #[error("search response must be a JSON object keyed by entity type")]
    NotAnObject,
    #[error("results for '{entity}' must be an array")]
    NotAnArray { entity: String },
    #[error("result #{index} for '{entity}' is not an object")]
    NotARecord { entity: String, index: usize },
}

impl SearchResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the records for `entity`, merging into an existing set of
    /// the same type.
    pub fn push(&mut self, entity: EntityType, records: Vec<Record>) {
        match self.sets.iter_mut().find(|s| s.entity == entity) {
            Some(existing) => existing.records.extend(records),
            None => self.sets.push(EntityResults { entity, records }),
        }
    }

    pub fn with(mut self, entity: EntityType, records: Vec<Record>) -> Self {
        self.push(entity, records);
        self
    }

    pub fn sets(&self) -> &[EntityResults] {
        &self.sets
    }

    pub fn records(&self, entity: &EntityType) -> &[Record] {
        self.sets
            .iter()
            .find(|s| &s.entity == entity)
            .map(|s| s.records.as_slice())
            .unwrap_or(&[])
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityType> {
        self.sets.iter().map(|s| &s.entity)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(|s| s.records.is_empty())
    }

    pub fn total(&self) -> usize {
        self.sets.iter().map(|s| s.records.len()).sum()
    }
}

impl TryFrom<Value> for SearchResults {
    type Error = SearchResultsError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err(SearchResultsError::NotAnObject);
        };
        let mut results = SearchResults::new();
        for (key, value) in map {
            let Value::Array(items) = value else {
                return Err(SearchResultsError::NotAnArray { entity: key });
            };
            let mut records = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(record) => records.push(record),
                    _ => {
                        return Err(SearchResultsError::NotARecord { entity: key, index });
                    }
                }
            }
            results.push(EntityType::parse(&key), records);
        }
        Ok(results)
    }
}

impl<'de> Deserialize<'de> for SearchResults {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        SearchResults::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for SearchResults {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.sets.len()))?;
        for set in &self.sets {
            map.serialize_entry(set.entity.as_str(), &set.records)?;
        }
        map.end()
    }
}

/// Parameters of one search submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    /// Free-text query; may be empty when only filters are used.
    pub query: String,
    /// Entity types to search within. Empty means every type.
    pub scopes: Vec<EntityType>,
    /// Filter clauses as built by the user; inert clauses are dropped
    /// when the request is encoded.
    pub filters: Vec<FilterClause>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Clauses with both a field and a value.
    pub fn active_filters(&self) -> impl Iterator<Item = &FilterClause> {
        self.filters.iter().filter(|c| c.is_active())
    }

    /// A request with neither a query nor an active clause.
    pub fn is_blank(&self) -> bool {
        self.query.is_empty() && self.active_filters().next().is_none()
    }
}

/// A forum that can receive imported posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumSummary {
    pub id: String,
    pub name: String,
}
