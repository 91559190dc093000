//! Search request encoding for the record store's `/search` endpoint.
//!
//! ```text
//! query=<text>&entity=forum-posts,telegram&filter=title:contains:zero&filter=date:before:2024-01-01
//! ```
//!
//! `query` is always sent, `entity` only when scopes are selected, and one
//! `filter` pair per active clause. Inside a filter value the operator and
//! value are percent-encoded individually so the `:` separators stay
//! literal. Values of date fields are normalized to `yyyy-MM-dd`.

use intel_harness_core::dates::{parse_day, DateBasis};
use intel_harness_core::filter::{ClauseError, FilterClause};
use intel_harness_core::models::SearchRequest;
use intel_harness_core::registry::{EntityType, FieldKind, FieldRegistry};
use thiserror::Error;
use url::form_urlencoded;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid filter: {0}")]
    Filter(#[from] ClauseError),
}

/// A decoded search query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub request: SearchRequest,
    /// Requested result tab: `all` or an entity id.
    pub tab: Option<String>,
}

/// Encodes `request` as a query string (without the leading `?`).
pub fn to_query_string(request: &SearchRequest, basis: DateBasis) -> String {
    let mut parts = vec![format!("query={}", encode(&request.query))];

    if !request.scopes.is_empty() {
        let scopes: Vec<&str> = request.scopes.iter().map(EntityType::as_str).collect();
        parts.push(format!("entity={}", encode(&scopes.join(","))));
    }

    for clause in request.active_filters() {
        let value = wire_value(clause, basis);
        parts.push(format!(
            "filter={}:{}:{}",
            encode(&clause.field),
            encode(clause.operator.as_str()),
            encode(&value)
        ));
    }

    parts.join("&")
}

/// Decodes a raw query string. Unknown parameters are ignored.
pub fn from_query(raw: &str) -> Result<SearchParams, QueryError> {
    let mut params = SearchParams::default();
    let mut next_id = 1;

    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            "query" | "q" => params.request.query = value.trim().to_string(),
            "entity" => params.request.scopes = EntityType::parse_list(&value),
            "filter" => {
                params.request.filters.push(FilterClause::parse(next_id, &value)?);
                next_id += 1;
            }
            "tab" if !value.is_empty() => params.tab = Some(value.into_owned()),
            _ => {}
        }
    }

    Ok(params)
}

fn wire_value(clause: &FilterClause, basis: DateBasis) -> String {
    match FieldRegistry::global().kind_of(None, &clause.field) {
        FieldKind::Date => parse_day(&clause.value, basis)
            .map(|day| day.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| clause.value.clone()),
        FieldKind::Text => clause.value.clone(),
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
