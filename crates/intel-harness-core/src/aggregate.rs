//! Cross-entity result aggregation.
//!
//! Merges the per-entity record arrays of a search response into the
//! "all sources" view: one table of matching rows across entity types,
//! each with a type label, a preview string and its matched fields, plus a
//! per-entity count of contributing records.
//!
//! Counting and highlighting share one rule: when a query or an active
//! clause is present, a record contributes if and only if its matched
//! field list is non-empty. With neither, every record contributes,
//! unhighlighted.
//!
//! The reserved `sources` entity only has a dedicated view
//! ([`entity_view`]) and never appears in the aggregated table.

use serde::Serialize;
use serde_json::Value;

use crate::matcher::{matched_fields, MatchQuery};
use crate::models::{Record, SearchResults};
use crate::registry::{EntityType, FieldRegistry};

/// Fields tried, in order, when picking a record's preview.
pub const PREVIEW_FIELDS: [&str; 5] = ["title", "name", "BreachName", "author_username", "description"];

/// Preview shown for records without any non-empty string attribute.
pub const NO_PREVIEW: &str = "No preview available";

/// One row of the cross-entity table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow<'a> {
    pub entity_type: EntityType,
    /// Display label of `entity_type`.
    #[serde(rename = "type")]
    pub type_label: String,
    pub preview: String,
    pub matched_fields: Vec<String>,
    pub record: &'a Record,
}

/// Number of records an entity type contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityCount {
    pub entity_type: EntityType,
    pub count: usize,
}

/// The cross-entity view of one search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation<'a> {
    pub rows: Vec<AggregatedRow<'a>>,
    pub counts: Vec<EntityCount>,
}

impl Aggregation<'_> {
    pub fn count_for(&self, entity: &EntityType) -> usize {
        self.counts
            .iter()
            .find(|c| &c.entity_type == entity)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }
}

/// Builds the "all sources" view of `results`.
///
/// Rows follow entity order as received, then record order within each
/// entity; there is no relevance re-sorting.
pub fn aggregate<'a>(
    results: &'a SearchResults,
    query: &MatchQuery<'_>,
    registry: &FieldRegistry,
) -> Aggregation<'a> {
    let mut out = Aggregation::default();

    for set in results.sets() {
        if set.entity.is_sources() {
            continue;
        }
        let rows = rows_for(&set.entity, &set.records, query, registry);
        out.counts.push(EntityCount {
            entity_type: set.entity.clone(),
            count: rows.len(),
        });
        out.rows.extend(rows);
    }

    out
}

/// Builds the rows of one entity's dedicated view, `sources` included.
pub fn entity_view<'a>(
    results: &'a SearchResults,
    entity: &EntityType,
    query: &MatchQuery<'_>,
    registry: &FieldRegistry,
) -> Vec<AggregatedRow<'a>> {
    rows_for(entity, results.records(entity), query, registry)
}

fn rows_for<'a>(
    entity: &EntityType,
    records: &'a [Record],
    query: &MatchQuery<'_>,
    registry: &FieldRegistry,
) -> Vec<AggregatedRow<'a>> {
    let show_all = query.is_empty();
    records
        .iter()
        .filter_map(|record| {
            let matched = if show_all {
                Vec::new()
            } else {
                let matched = matched_fields(record, query, registry, Some(entity));
                if matched.is_empty() {
                    return None;
                }
                matched
            };
            Some(AggregatedRow {
                entity_type: entity.clone(),
                type_label: entity.label().to_string(),
                preview: preview(record),
                matched_fields: matched,
                record,
            })
        })
        .collect()
}

/// Picks the single human-readable string representing `record`.
pub fn preview(record: &Record) -> String {
    for field in PREVIEW_FIELDS {
        if let Some(Value::String(s)) = record.get(field) {
            if !s.is_empty() {
                return s.clone();
            }
        }
    }
    record
        .values()
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(|| NO_PREVIEW.to_string())
}

/// Fields consulted for autocomplete suggestions.
static SUGGESTION_FIELDS: [&str; 11] = [
    "title",
    "name",
    "BreachName",
    "author_username",
    "author",
    "description",
    "category",
    "url",
    "Domain",
    "Group",
    "channel_username",
];

/// Suggests a completion for `prefix`: the first well-known display value
/// that starts with it (case-insensitively) without being equal to it.
pub fn suggest(results: &SearchResults, prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    let lower = prefix.to_lowercase();
    results
        .sets()
        .iter()
        .flat_map(|set| set.records.iter())
        .flat_map(|record| {
            SUGGESTION_FIELDS
                .iter()
                .filter_map(move |f| record.get(*f).and_then(Value::as_str))
        })
        .find(|candidate| {
            let c = candidate.to_lowercase();
            c.starts_with(&lower) && c != lower
        })
        .map(str::to_string)
}
