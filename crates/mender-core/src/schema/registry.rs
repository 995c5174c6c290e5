use std::collections::BTreeMap;

use super::declarations::{AdjacencyExtractor, CollectionSchema, FieldType, ForeignKey};
use crate::errors::{MenderError, MenderResult, StoreError};

/// `collection → CollectionSchema`.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, CollectionSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a collection.
    pub fn register(&mut self, schema: CollectionSchema) -> &mut Self {
        self.schemas.insert(schema.name.clone(), schema);
        self
    }

    pub fn with(mut self, schema: CollectionSchema) -> Self {
        self.register(schema);
        self
    }

    pub fn get(&self, collection: &str) -> Option<&CollectionSchema> {
        self.schemas.get(collection)
    }

    pub fn require(&self, collection: &str) -> MenderResult<&CollectionSchema> {
        self.get(collection).ok_or_else(|| {
            MenderError::Store(StoreError::UnknownCollection {
                collection: collection.to_string(),
            })
        })
    }

    pub fn key_path(&self, collection: &str) -> Option<&str> {
        self.get(collection).map(|s| s.key_path.as_str())
    }

    /// Collection names in sorted order.
    pub fn collections(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &CollectionSchema> {
        self.schemas.values()
    }

    /// Foreign keys across all collections, paired with the owning collection.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&str, &ForeignKey)> {
        self.schemas
            .values()
            .flat_map(|s| s.foreign_keys.iter().map(move |fk| (s.name.as_str(), fk)))
    }

    /// Foreign keys that point into `target`.
    pub fn referencing(&self, target: &str) -> Vec<(&str, &ForeignKey)> {
        self.foreign_keys()
            .filter(|(_, fk)| fk.collection == target)
            .collect()
    }

    /// Sanity-check cross references between declarations.
    pub fn validate(&self) -> MenderResult<()> {
        for schema in self.schemas.values() {
            for fk in &schema.foreign_keys {
                if !self.schemas.contains_key(&fk.collection) {
                    return Err(MenderError::Schema {
                        collection: schema.name.clone(),
                        reason: format!(
                            "foreign key `{}` targets unknown collection `{}`",
                            fk.field, fk.collection
                        ),
                    });
                }
            }
            for rc in &schema.reverse_constraints {
                if !self.schemas.contains_key(&rc.source_collection) {
                    return Err(MenderError::Schema {
                        collection: schema.name.clone(),
                        reason: format!(
                            "reverse constraint source `{}` is not registered",
                            rc.source_collection
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// The practice-tracker store.
    pub fn default_catalog() -> Self {
        use FieldType::*;

        Self::new()
            .with(
                CollectionSchema::new("standard_problems", "id")
                    .required("id", String)
                    .required("title", String)
                    .required("difficulty", String)
                    .required("tags", Array),
            )
            .with(
                CollectionSchema::new("problems", "id")
                    .required("id", String)
                    .optional("title", String)
                    .optional("difficulty", String)
                    .optional("tags", Array)
                    .optional("box_level", Integer)
                    .optional("next_review", Timestamp)
                    .optional("attempt_stats", Object)
                    .optional("standard_problem_id", String)
                    .foreign_key("standard_problem_id", "standard_problems", false),
            )
            .with(
                CollectionSchema::new("sessions", "id")
                    .required("id", String)
                    .required("date", Timestamp)
                    .required("status", String)
                    .optional("attempt_count", Integer)
                    .optional("session_type", String)
                    .referenced_by("attempts", "session_id"),
            )
            .with(
                CollectionSchema::new("attempts", "id")
                    .required("id", String)
                    .required("problem_id", String)
                    .optional("session_id", String)
                    .required("success", Boolean)
                    .required("time_spent", Number)
                    .optional("difficulty", String)
                    .required("attempt_date", Timestamp)
                    .foreign_key("problem_id", "problems", true)
                    .foreign_key("session_id", "sessions", false),
            )
            .with(
                CollectionSchema::new("tag_mastery", "tag")
                    .required("tag", String)
                    .required("total_attempts", Integer)
                    .required("successful_attempts", Integer)
                    .required("success_rate", Number)
                    .required("mastered", Boolean)
                    .optional("decay_score", Number)
                    .optional("last_attempt_date", Timestamp)
                    .optional("last_updated", Timestamp),
            )
            .with(
                CollectionSchema::new("session_analytics", "session_id")
                    .required("session_id", String)
                    .required("accuracy", Number)
                    .optional("total_time", Number)
                    .optional("avg_time", Number)
                    .optional("predominant_difficulty", String)
                    .optional("efficiency", Number)
                    .optional("improvement_areas", Array)
                    .foreign_key("session_id", "sessions", true),
            )
            .with(
                CollectionSchema::new("pattern_ladders", "tag")
                    .required("tag", String)
                    .required("problems", Array)
                    .optional("last_updated", Timestamp),
            )
            .with(
                CollectionSchema::new("problem_relationships", "id")
                    .required("id", String)
                    .required("problem_id1", String)
                    .required("problem_id2", String)
                    .required("strength", Number)
                    .required("relationship_type", String)
                    .foreign_key("problem_id1", "standard_problems", true)
                    .foreign_key("problem_id2", "standard_problems", true)
                    .graph(AdjacencyExtractor::EdgeRecord {
                        from_field: "problem_id1".to_string(),
                        to_field: "problem_id2".to_string(),
                    }),
            )
            .with(
                CollectionSchema::new("tag_relationships", "id")
                    .required("id", String)
                    .optional("prerequisites", Array)
                    .graph(AdjacencyExtractor::NodeList {
                        field: "prerequisites".to_string(),
                    }),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_consistent() {
        let registry = SchemaRegistry::default_catalog();
        registry.validate().unwrap();
        assert_eq!(registry.collections().len(), 9);
        assert_eq!(registry.key_path("tag_mastery"), Some("tag"));
        assert_eq!(registry.key_path("session_analytics"), Some("session_id"));
    }

    #[test]
    fn referencing_lists_inbound_keys() {
        let registry = SchemaRegistry::default_catalog();
        let inbound = registry.referencing("sessions");
        let sources: Vec<&str> = inbound.iter().map(|(c, _)| *c).collect();
        assert_eq!(sources, vec!["attempts", "session_analytics"]);
    }

    #[test]
    fn dangling_foreign_key_is_rejected() {
        let registry = SchemaRegistry::new()
            .with(CollectionSchema::new("a", "id").foreign_key("b_id", "b", true));
        assert!(matches!(
            registry.validate(),
            Err(MenderError::Schema { .. })
        ));
    }
}
