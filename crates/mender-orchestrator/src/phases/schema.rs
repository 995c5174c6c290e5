//! Schema phase: validate every record (or a sample) against its collection schema.

use mender_core::constants::MAX_SCHEMA_ERRORS_PER_COLLECTION;
use mender_core::errors::MenderResult;
use mender_core::models::{CollectionSchemaResult, SchemaPhaseResult};
use mender_core::record::Record;
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{DocumentStore, SchemaValidator};

/// Validate `records`, at most `sample` of them when set.
pub fn validate_collection(
    validator: &dyn SchemaValidator,
    registry: &SchemaRegistry,
    collection: &str,
    records: &[Record],
    sample: Option<usize>,
) -> CollectionSchemaResult {
    let take = sample.unwrap_or(records.len()).min(records.len());
    let key_path = registry.key_path(collection).unwrap_or("id");
    let mut result = CollectionSchemaResult {
        collection: collection.to_string(),
        records_checked: 0,
        valid_records: 0,
        invalid_records: 0,
        errors: Vec::new(),
    };
    for record in &records[..take] {
        result.records_checked += 1;
        let validation = validator.validate(collection, record);
        if validation.valid {
            result.valid_records += 1;
            continue;
        }
        result.invalid_records += 1;
        let key = record
            .get(key_path)
            .map(|k| k.as_str().map_or_else(|| k.to_string(), str::to_string))
            .unwrap_or_else(|| "<no key>".to_string());
        for message in validation.errors {
            if result.errors.len() >= MAX_SCHEMA_ERRORS_PER_COLLECTION {
                break;
            }
            result.errors.push(format!("{key}: {message}"));
        }
    }
    result
}

pub fn summarize(collections: Vec<CollectionSchemaResult>, sampled: bool) -> SchemaPhaseResult {
    let records_checked: usize = collections.iter().map(|c| c.records_checked).sum();
    let valid_records: usize = collections.iter().map(|c| c.valid_records).sum();
    let score = if records_checked == 0 {
        100.0
    } else {
        100.0 * valid_records as f64 / records_checked as f64
    };
    SchemaPhaseResult {
        collections,
        records_checked,
        valid_records,
        sampled,
        score,
    }
}

pub async fn run<S: DocumentStore>(
    store: &S,
    validator: &dyn SchemaValidator,
    registry: &SchemaRegistry,
    scope: &[String],
    sample: Option<usize>,
) -> MenderResult<SchemaPhaseResult> {
    let mut collections = Vec::with_capacity(scope.len());
    for collection in scope {
        let records = store.get_all(collection).await?;
        collections.push(validate_collection(
            validator, registry, collection, &records, sample,
        ));
    }
    Ok(summarize(collections, sample.is_some()))
}
