//! Declared collection schemas and the default validator.

mod declarations;
mod registry;
mod validator;

pub use declarations::{
    AdjacencyExtractor, CollectionSchema, FieldSpec, FieldType, ForeignKey, ReverseConstraint,
};
pub use registry::SchemaRegistry;
pub use validator::{DeclaredSchemaValidator, SchemaValidation};
