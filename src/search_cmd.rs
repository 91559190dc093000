//! `intel search`: cross-entity search against the record store.
//!
//! The store returns records grouped by entity type; this module turns one
//! response into the view a client renders: the aggregated "all" table (or
//! one entity's tab), counts per entity, the available tabs and an optional
//! autocomplete suggestion.

use anyhow::{Context, Result};
use intel_harness_core::aggregate::{aggregate, entity_view, suggest, AggregatedRow, EntityCount};
use intel_harness_core::dates::DateBasis;
use intel_harness_core::filter::FilterClause;
use intel_harness_core::matcher::MatchQuery;
use intel_harness_core::models::{record_id, SearchRequest, SearchResults};
use intel_harness_core::registry::{EntityType, FieldRegistry};
use intel_harness_core::store::RecordStore;
use serde::Serialize;

use crate::config::Config;
use crate::http_store::HttpRecordStore;

/// Tab id of the aggregated table.
pub const ALL_TAB: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabSummary {
    pub id: String,
    pub label: String,
    pub count: usize,
}

/// Everything a client needs to render one search response.
#[derive(Debug, Serialize)]
pub struct SearchView<'a> {
    pub tab: String,
    pub rows: Vec<AggregatedRow<'a>>,
    pub counts: Vec<EntityCount>,
    pub tabs: Vec<TabSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Builds the view of `results` for `tab` (`None` or `"all"` for the
/// aggregated table).
pub fn build_view<'a>(
    results: &'a SearchResults,
    request: &SearchRequest,
    tab: Option<&str>,
    basis: DateBasis,
) -> SearchView<'a> {
    let registry = FieldRegistry::global();
    let query = MatchQuery::new(&request.query, &request.filters).with_date_basis(basis);
    let all = aggregate(results, &query, registry);

    let mut tabs = vec![TabSummary {
        id: ALL_TAB.to_string(),
        label: "All".to_string(),
        count: all.total(),
    }];
    for entity in results.entities() {
        tabs.push(TabSummary {
            id: entity.as_str().to_string(),
            label: entity.label().to_string(),
            count: entity_view(results, entity, &query, registry).len(),
        });
    }

    let tab = tab.filter(|t| !t.is_empty()).unwrap_or(ALL_TAB);
    let rows = if tab == ALL_TAB {
        all.rows
    } else {
        entity_view(results, &EntityType::parse(tab), &query, registry)
    };

    SearchView {
        tab: tab.to_string(),
        rows,
        counts: all.counts,
        tabs,
        suggestion: suggest(results, &request.query),
    }
}

/// Assembles a request from CLI arguments.
pub fn build_request(
    query: Option<String>,
    entity: Option<&str>,
    filters: &[String],
) -> Result<SearchRequest> {
    let mut request = SearchRequest::new(query.unwrap_or_default().trim());
    if let Some(entity) = entity {
        request.scopes = EntityType::parse_list(entity);
    }
    for (i, spec) in filters.iter().enumerate() {
        let clause = FilterClause::parse(i as u64 + 1, spec)
            .with_context(|| format!("Invalid --filter '{}'", spec))?;
        request.filters.push(clause);
    }
    Ok(request)
}

pub async fn run_search(
    config: &Config,
    query: Option<String>,
    entity: Option<&str>,
    filters: &[String],
    tab: Option<&str>,
    json: bool,
) -> Result<()> {
    let request = build_request(query, entity, filters)?;
    let store = HttpRecordStore::from_config(config)?;
    let active: Vec<String> = request.active_filters().map(FilterClause::to_spec).collect();
    tracing::debug!(query = %request.query, filters = ?active, "search");

    let results = store
        .search(&request)
        .await
        .with_context(|| format!("Search failed against {}", store.base_url()))?;
    let view = build_view(&results, &request, tab, config.search.date_basis);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    for t in &view.tabs {
        println!("{:<14} {}", t.label, t.count);
    }
    println!();

    if view.rows.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, row) in view.rows.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, row.type_label, row.preview);
        if !row.matched_fields.is_empty() {
            println!("    matched: {}", row.matched_fields.join(", "));
        }
        if let Some(id) = record_id(row.record) {
            println!("    id: {}", id);
        }
        println!();
    }

    if let Some(suggestion) = &view.suggestion {
        println!("Did you mean: {}", suggestion);
    }

    Ok(())
}
