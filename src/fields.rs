//! `intel fields`: the filterable fields for a set of search scopes.

use anyhow::Result;
use intel_harness_core::registry::{EntityType, FieldDescriptor, FieldKind, FieldRegistry};

/// Fields offered for filtering; `entity` is a comma-joined scope list,
/// absent for every searchable type.
pub fn filterable(entity: Option<&str>) -> Vec<&'static FieldDescriptor> {
    let scopes = entity.map(EntityType::parse_list).unwrap_or_default();
    FieldRegistry::global().filterable_fields(&scopes)
}

pub fn run_fields(entity: Option<&str>, json: bool) -> Result<()> {
    let fields = filterable(entity);

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    println!("{:<20} {:<6} LABEL", "FIELD", "KIND");
    for field in fields {
        let kind = match field.kind {
            FieldKind::Text => "text",
            FieldKind::Date => "date",
        };
        println!("{:<20} {:<6} {}", field.name, kind, field.label);
    }

    Ok(())
}
