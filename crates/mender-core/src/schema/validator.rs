use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::SchemaRegistry;
use crate::record::{get_path, Record};
use crate::traits::SchemaValidator;

/// Outcome of validating one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl SchemaValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validates records against the registry's declared fields.
///
/// Undeclared fields are allowed. Optional fields may be null.
#[derive(Debug, Clone)]
pub struct DeclaredSchemaValidator {
    registry: Arc<SchemaRegistry>,
}

impl DeclaredSchemaValidator {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }
}

impl SchemaValidator for DeclaredSchemaValidator {
    fn validate(&self, collection: &str, record: &Record) -> SchemaValidation {
        let Some(schema) = self.registry.get(collection) else {
            return SchemaValidation::from_errors(vec![format!(
                "collection `{collection}` is not registered"
            )]);
        };
        if !record.is_object() {
            return SchemaValidation::from_errors(vec!["record is not a JSON object".to_string()]);
        }

        let mut errors = Vec::new();
        for spec in &schema.fields {
            match get_path(record, &spec.name) {
                None | Some(serde_json::Value::Null) => {
                    if spec.required {
                        errors.push(format!("required field `{}` is missing", spec.name));
                    }
                }
                Some(value) => {
                    if !spec.field_type.matches(value) {
                        errors.push(format!(
                            "field `{}` expected {}, found {}",
                            spec.name,
                            spec.field_type.as_str(),
                            json_kind(value)
                        ));
                    }
                }
            }
        }
        SchemaValidation::from_errors(errors)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> DeclaredSchemaValidator {
        DeclaredSchemaValidator::new(Arc::new(SchemaRegistry::default_catalog()))
    }

    #[test]
    fn valid_attempt_passes() {
        let rec = json!({
            "id": "a1", "problem_id": "p1", "session_id": null, "success": true,
            "time_spent": 600, "attempt_date": "2024-03-01T10:00:00Z"
        });
        let result = validator().validate("attempts", &rec);
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn type_mismatch_and_missing_required() {
        let rec = json!({"id": "a1", "problem_id": 5, "success": "yes", "time_spent": 1});
        let result = validator().validate("attempts", &rec);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 3, "{:?}", result.errors);
    }

    #[test]
    fn unknown_collection_is_invalid() {
        assert!(!validator().validate("nope", &json!({"id": "x"})).valid);
    }

    #[test]
    fn epoch_millis_count_as_timestamps() {
        let rec = json!({"id": "s1", "date": 1_709_287_200_000_i64, "status": "completed"});
        assert!(validator().validate("sessions", &rec).valid);
    }
}
