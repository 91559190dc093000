//! Per-record match scanning.
//!
//! For one record, computes the ordered set of attribute names that explain
//! why it appears in a result set: string attributes containing the free-text
//! term, followed by fields whose active filter clause evaluated true. The
//! same list drives both counting and highlighting.

use serde_json::Value;

use crate::dates::DateBasis;
use crate::filter::{evaluate_with, FilterClause};
use crate::models::Record;
use crate::registry::{EntityType, FieldRegistry};

/// The inputs of one search as seen by the matcher.
#[derive(Debug, Clone, Copy)]
pub struct MatchQuery<'a> {
    /// Free-text term; empty disables the free-text pass.
    pub term: &'a str,
    /// All clauses the user built, inert ones included.
    pub clauses: &'a [FilterClause],
    pub date_basis: DateBasis,
}

impl<'a> MatchQuery<'a> {
    pub fn new(term: &'a str, clauses: &'a [FilterClause]) -> Self {
        Self {
            term,
            clauses,
            date_basis: DateBasis::Utc,
        }
    }

    pub fn with_date_basis(mut self, basis: DateBasis) -> Self {
        self.date_basis = basis;
        self
    }

    pub fn has_active_clause(&self) -> bool {
        self.clauses.iter().any(FilterClause::is_active)
    }

    /// True when there is neither a term nor an active clause, meaning
    /// "show everything, unhighlighted".
    pub fn is_empty(&self) -> bool {
        self.term.is_empty() && !self.has_active_clause()
    }
}

/// Returns the names of `record`'s fields matched by `query`, each at most
/// once, free-text hits first (in key order) then filter hits (in clause
/// order).
///
/// `entity` narrows field-kind lookup to that entity's table when known.
pub fn matched_fields(
    record: &Record,
    query: &MatchQuery<'_>,
    registry: &FieldRegistry,
    entity: Option<&EntityType>,
) -> Vec<String> {
    let mut matches: Vec<String> = Vec::new();

    if !query.term.is_empty() {
        let needle = query.term.to_lowercase();
        for (key, value) in record {
            if let Value::String(s) = value {
                if s.to_lowercase().contains(&needle) {
                    push_unique(&mut matches, key);
                }
            }
        }
    }

    for clause in query.clauses.iter().filter(|c| c.is_active()) {
        let kind = registry.kind_of(entity, &clause.field);
        if evaluate_with(record.get(&clause.field), clause, kind, query.date_basis) {
            push_unique(&mut matches, &clause.field);
        }
    }

    matches
}

fn push_unique(matches: &mut Vec<String>, field: &str) {
    if !matches.iter().any(|m| m == field) {
        matches.push(field.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{DateOp, Operator, TextOp};
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn free_text_matches_title_only() {
        let r = record(json!({ "title": "Zero Day Sale", "author_username": "bob" }));
        let fields = matched_fields(
            &r,
            &MatchQuery::new("zero", &[]),
            FieldRegistry::global(),
            Some(&EntityType::ForumPosts),
        );
        assert_eq!(fields, vec!["title"]);
    }

    #[test]
    fn free_text_follows_key_order_and_skips_non_strings() {
        let r = record(json!({
            "content": "acme dump",
            "number_comments": 5,
            "title": "ACME leak",
            "comments": [{ "content": "acme" }],
        }));
        let fields = matched_fields(&r, &MatchQuery::new("acme", &[]), FieldRegistry::global(), None);
        assert_eq!(fields, vec!["content", "title"]);
    }

    #[test]
    fn filter_hits_are_appended_once() {
        let r = record(json!({ "title": "Zero Day Sale", "date": "2024-05-20T10:00:00+00:00" }));
        let clauses = vec![
            FilterClause::new(1, "title", Operator::Text(TextOp::Contains), "sale"),
            FilterClause::new(2, "date", Operator::Date(DateOp::On), "2024-05-20"),
            FilterClause::new(3, "title", Operator::Text(TextOp::StartsWith), "zero"),
        ];
        let fields = matched_fields(
            &r,
            &MatchQuery::new("zero", &clauses),
            FieldRegistry::global(),
            Some(&EntityType::ForumPosts),
        );
        assert_eq!(fields, vec!["title", "date"]);
    }

    #[test]
    fn inert_clauses_are_ignored() {
        let r = record(json!({ "title": "anything" }));
        let clauses = vec![FilterClause::new(1, "title", Operator::Text(TextOp::Contains), "")];
        let query = MatchQuery::new("", &clauses);
        assert!(query.is_empty());
        assert!(matched_fields(&r, &query, FieldRegistry::global(), None).is_empty());
    }

    #[test]
    fn date_kind_comes_from_registry() {
        let r = record(json!({ "DetectionDate": "2023-12-31" }));
        let clauses = vec![FilterClause::new(
            1,
            "DetectionDate",
            Operator::Date(DateOp::Before),
            "2024-01-01",
        )];
        let fields = matched_fields(
            &r,
            &MatchQuery::new("", &clauses),
            FieldRegistry::global(),
            Some(&EntityType::Ransomware),
        );
        assert_eq!(fields, vec!["DetectionDate"]);
    }

    #[test]
    fn never_returns_duplicates() {
        let r = record(json!({ "name": "acme", "author": "acme" }));
        let clauses = vec![
            FilterClause::new(1, "name", Operator::Text(TextOp::Equals), "acme"),
            FilterClause::new(2, "name", Operator::Text(TextOp::Contains), "ac"),
            FilterClause::new(3, "author", Operator::Text(TextOp::EndsWith), "me"),
        ];
        let fields = matched_fields(
            &r,
            &MatchQuery::new("acme", &clauses),
            FieldRegistry::global(),
            Some(&EntityType::Telegram),
        );
        let mut deduped = fields.clone();
        deduped.dedup();
        assert_eq!(fields, deduped);
        assert_eq!(fields, vec!["name", "author"]);
    }
}
