//! Typed filter clauses and their evaluation against one field value.
//!
//! A clause names a field, an operator and a value. Text operators compare
//! case-insensitively; date operators compare calendar days. Evaluation
//! never fails: anything that cannot be compared (missing or empty value,
//! non-string text, unparseable date, operator of the wrong kind) simply
//! does not match.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::dates::{parse_day, DateBasis};
use crate::registry::FieldKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextOp {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateOp {
    On,
    Before,
    After,
}

/// A clause operator. Serialized as its bare wire name (`startsWith`, `on`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operator {
    Text(TextOp),
    Date(DateOp),
}

impl Operator {
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "contains" => Operator::Text(TextOp::Contains),
            "equals" => Operator::Text(TextOp::Equals),
            "startsWith" => Operator::Text(TextOp::StartsWith),
            "endsWith" => Operator::Text(TextOp::EndsWith),
            "on" => Operator::Date(DateOp::On),
            "before" => Operator::Date(DateOp::Before),
            "after" => Operator::Date(DateOp::After),
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Text(TextOp::Contains) => "contains",
            Operator::Text(TextOp::Equals) => "equals",
            Operator::Text(TextOp::StartsWith) => "startsWith",
            Operator::Text(TextOp::EndsWith) => "endsWith",
            Operator::Date(DateOp::On) => "on",
            Operator::Date(DateOp::Before) => "before",
            Operator::Date(DateOp::After) => "after",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field/operator/value condition.
///
/// Date values use `yyyy-MM-dd`. Clauses live only for one search session
/// and are replaced wholesale when the user edits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub id: u64,
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClauseError {
    #[error("filter must look like field:operator:value, got '{0}'")]
    Malformed(String),
    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),
}

impl FilterClause {
    pub fn new(id: u64, field: &str, operator: Operator, value: &str) -> Self {
        Self {
            id,
            field: field.to_string(),
            operator,
            value: value.to_string(),
        }
    }

    /// A clause with an empty field or value is inert: it is kept in the
    /// user's list but never evaluated.
    pub fn is_active(&self) -> bool {
        !self.field.is_empty() && !self.value.is_empty()
    }

    /// Parses the `field:operator:value` form. The value may itself contain
    /// colons.
    pub fn parse(id: u64, spec: &str) -> Result<Self, ClauseError> {
        let mut parts = spec.splitn(3, ':');
        let (Some(field), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ClauseError::Malformed(spec.to_string()));
        };
        let operator =
            Operator::parse(op).ok_or_else(|| ClauseError::UnknownOperator(op.to_string()))?;
        Ok(Self::new(id, field, operator, value))
    }

    /// The `field:operator:value` form, unencoded.
    pub fn to_spec(&self) -> String {
        format!("{}:{}:{}", self.field, self.operator, self.value)
    }
}

/// Evaluates `clause` against `field_value`, truncating dates in UTC.
pub fn evaluate(field_value: Option<&Value>, clause: &FilterClause, kind: FieldKind) -> bool {
    evaluate_with(field_value, clause, kind, DateBasis::Utc)
}

/// Evaluates `clause` against `field_value` under the given date basis.
///
/// `field_value` is `None` when the record has no such attribute.
pub fn evaluate_with(
    field_value: Option<&Value>,
    clause: &FilterClause,
    kind: FieldKind,
    basis: DateBasis,
) -> bool {
    if !clause.is_active() {
        return false;
    }
    let Some(value) = field_value.filter(|v| is_present(v)) else {
        return false;
    };

    match (kind, clause.operator) {
        (FieldKind::Date, Operator::Date(op)) => {
            let Some(raw) = value.as_str() else {
                return false;
            };
            let (Some(item_day), Some(filter_day)) =
                (parse_day(raw, basis), parse_day(&clause.value, basis))
            else {
                return false;
            };
            match op {
                DateOp::On => item_day == filter_day,
                DateOp::Before => item_day < filter_day,
                DateOp::After => item_day > filter_day,
            }
        }
        (FieldKind::Text, Operator::Text(op)) => {
            let Some(raw) = value.as_str() else {
                return false;
            };
            let item = raw.to_lowercase();
            let needle = clause.value.to_lowercase();
            match op {
                TextOp::Contains => item.contains(&needle),
                TextOp::Equals => item == needle,
                TextOp::StartsWith => item.starts_with(&needle),
                TextOp::EndsWith => item.ends_with(&needle),
            }
        }
        _ => false,
    }
}

/// Mirrors the truthiness check applied to stored values: null, `false`,
/// zero and the empty string are treated as absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
