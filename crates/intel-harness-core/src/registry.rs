//! Static table of known fields per entity type.
//!
//! The registry decides how a filter clause is evaluated: a field declared
//! as [`FieldKind::Date`] gets day-granularity comparison, anything else is
//! compared as text. Lookups go through the registry rather than guessing
//! from the record's values.
//!
//! The built-in tables cover the four entity types the record store
//! serves. Extra entity types can be registered while building a registry;
//! the shared instance returned by [`FieldRegistry::global`] is immutable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// How values of a field are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Date,
}

/// A known, filterable field of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn text(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
        }
    }

    pub fn date(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Date,
        }
    }
}

/// Record category served by the store.
///
/// `Sources` is reserved: it has its own dedicated view and never appears
/// in the cross-entity table. Unknown names are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityType {
    ForumPosts,
    Ransomware,
    Telegram,
    Sources,
    Other(String),
}

impl EntityType {
    /// Entity types a user can select as a search scope.
    pub const SEARCHABLE: [EntityType; 3] = [
        EntityType::ForumPosts,
        EntityType::Ransomware,
        EntityType::Telegram,
    ];

    pub fn parse(name: &str) -> Self {
        match name {
            "forum-posts" => EntityType::ForumPosts,
            "ransomware" => EntityType::Ransomware,
            "telegram" => EntityType::Telegram,
            "sources" => EntityType::Sources,
            other => EntityType::Other(other.to_string()),
        }
    }

    /// Wire name used in search responses and the `entity` parameter.
    pub fn as_str(&self) -> &str {
        match self {
            EntityType::ForumPosts => "forum-posts",
            EntityType::Ransomware => "ransomware",
            EntityType::Telegram => "telegram",
            EntityType::Sources => "sources",
            EntityType::Other(name) => name,
        }
    }

    /// Human-readable type label shown in the cross-entity table.
    pub fn label(&self) -> &str {
        match self {
            EntityType::ForumPosts => "Forum Post",
            EntityType::Ransomware => "Ransomware",
            EntityType::Telegram => "Telegram",
            EntityType::Sources => "Source",
            EntityType::Other(name) => name,
        }
    }

    pub fn is_sources(&self) -> bool {
        matches!(self, EntityType::Sources)
    }

    /// Parses a comma-joined scope list (`forum-posts,telegram`).
    pub fn parse_list(list: &str) -> Vec<EntityType> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(EntityType::parse)
            .collect()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EntityType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(EntityType::parse(&name))
    }
}

/// Field tables keyed by entity type.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    entries: Vec<(EntityType, Vec<FieldDescriptor>)>,
}

impl FieldRegistry {
    /// An empty registry. Every field resolves to [`FieldKind::Text`].
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The field tables for the built-in entity types.
    pub fn builtin() -> Self {
        Self::empty()
            .register(
                EntityType::ForumPosts,
                vec![
                    FieldDescriptor::text("title", "Title"),
                    FieldDescriptor::text("author_username", "Author"),
                    FieldDescriptor::text("content", "Content"),
                    FieldDescriptor::text("category", "Category"),
                    FieldDescriptor::text("url", "URL"),
                    FieldDescriptor::date("date", "Date"),
                ],
            )
            .register(
                EntityType::Ransomware,
                vec![
                    FieldDescriptor::text("BreachName", "Breach Name"),
                    FieldDescriptor::text("Domain", "Domain"),
                    FieldDescriptor::text("Category", "Category"),
                    FieldDescriptor::text("Country", "Country"),
                    FieldDescriptor::text("Group", "Group"),
                    FieldDescriptor::date("DetectionDate", "Detection Date"),
                ],
            )
            .register(
                EntityType::Telegram,
                vec![
                    FieldDescriptor::text("name", "Name"),
                    FieldDescriptor::text("author", "Author"),
                    FieldDescriptor::text("country", "Country"),
                    FieldDescriptor::text("language", "Language"),
                    FieldDescriptor::text("channel_username", "Channel Username"),
                ],
            )
            .register(
                EntityType::Sources,
                vec![
                    FieldDescriptor::text("name", "Name"),
                    FieldDescriptor::text("type", "Type"),
                    FieldDescriptor::text("author", "Author"),
                    FieldDescriptor::text("country", "Country"),
                    FieldDescriptor::text("language", "Language"),
                    FieldDescriptor::text("description", "Description"),
                ],
            )
    }

    /// The shared built-in registry.
    pub fn global() -> &'static FieldRegistry {
        static GLOBAL: OnceLock<FieldRegistry> = OnceLock::new();
        GLOBAL.get_or_init(FieldRegistry::builtin)
    }

    /// Adds (or replaces) the field table of `entity`.
    pub fn register(mut self, entity: EntityType, fields: Vec<FieldDescriptor>) -> Self {
        match self.entries.iter_mut().find(|(e, _)| *e == entity) {
            Some((_, existing)) => *existing = fields,
            None => self.entries.push((entity, fields)),
        }
        self
    }

    pub fn fields_for(&self, entity: &EntityType) -> &[FieldDescriptor] {
        self.entries
            .iter()
            .find(|(e, _)| e == entity)
            .map(|(_, fields)| fields.as_slice())
            .unwrap_or(&[])
    }

    /// Fields offered for filtering when searching `scopes`.
    ///
    /// With no scopes selected, every searchable entity type contributes.
    /// A field name shared by several types appears once, with the
    /// descriptor of the first type that declares it.
    pub fn filterable_fields(&self, scopes: &[EntityType]) -> Vec<&FieldDescriptor> {
        let scopes: Vec<&EntityType> = if scopes.is_empty() {
            self.entries
                .iter()
                .map(|(e, _)| e)
                .filter(|e| !e.is_sources())
                .collect()
        } else {
            scopes.iter().collect()
        };

        let mut out: Vec<&FieldDescriptor> = Vec::new();
        for entity in scopes {
            for field in self.fields_for(entity) {
                if !out.iter().any(|f| f.name == field.name) {
                    out.push(field);
                }
            }
        }
        out
    }

    pub fn descriptor(&self, entity: Option<&EntityType>, field: &str) -> Option<&FieldDescriptor> {
        if let Some(entity) = entity {
            if let Some(found) = self.fields_for(entity).iter().find(|f| f.name == field) {
                return Some(found);
            }
        }
        self.entries
            .iter()
            .flat_map(|(_, fields)| fields.iter())
            .find(|f| f.name == field)
    }

    /// Resolves how `field` is compared: the entity's own table first, then
    /// any registered table, then text.
    pub fn kind_of(&self, entity: Option<&EntityType>, field: &str) -> FieldKind {
        self.descriptor(entity, field)
            .map(|f| f.kind)
            .unwrap_or(FieldKind::Text)
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
