use serde::{Deserialize, Serialize};

/// Declared JSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    /// RFC 3339 string or epoch milliseconds.
    Timestamp,
    Any,
}

impl FieldType {
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match (self, value) {
            (Self::Any, _) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            (Self::Object, Value::Object(_)) => true,
            (Self::Timestamp, Value::String(s)) => {
                chrono::DateTime::parse_from_rfc3339(s).is_ok()
            }
            (Self::Timestamp, Value::Number(n)) => n.is_i64() || n.is_u64(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Timestamp => "timestamp",
            Self::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    /// Must be present and non-null.
    pub required: bool,
}

/// `field → collection.target_field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub field: String,
    pub collection: String,
    pub target_field: String,
    /// A required key must resolve; an optional one may be null or absent.
    pub required: bool,
    /// The field holds an array of keys.
    pub many: bool,
}

/// Records of the owning collection are expected to be referenced by
/// `source_collection.source_field`; unreferenced ones are orphans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseConstraint {
    pub source_collection: String,
    pub source_field: String,
}

/// How to read graph edges out of a collection's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdjacencyExtractor {
    /// Each record is a node; `field` lists the keys it points to.
    NodeList { field: String },
    /// Each record is one edge between two node ids.
    EdgeRecord {
        from_field: String,
        to_field: String,
    },
}

impl AdjacencyExtractor {
    pub fn describe_field(&self) -> String {
        match self {
            Self::NodeList { field } => field.clone(),
            Self::EdgeRecord {
                from_field,
                to_field,
            } => format!("{from_field}->{to_field}"),
        }
    }
}

/// Declared shape of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub key_path: String,
    pub fields: Vec<FieldSpec>,
    pub foreign_keys: Vec<ForeignKey>,
    pub reverse_constraints: Vec<ReverseConstraint>,
    pub graph: Option<AdjacencyExtractor>,
}

impl CollectionSchema {
    pub fn new(name: &str, key_path: &str) -> Self {
        Self {
            name: name.to_string(),
            key_path: key_path.to_string(),
            fields: vec![FieldSpec {
                name: key_path.to_string(),
                field_type: FieldType::Any,
                required: true,
            }],
            foreign_keys: Vec::new(),
            reverse_constraints: Vec::new(),
            graph: None,
        }
    }

    pub fn required(mut self, name: &str, field_type: FieldType) -> Self {
        self.push_field(name, field_type, true);
        self
    }

    pub fn optional(mut self, name: &str, field_type: FieldType) -> Self {
        self.push_field(name, field_type, false);
        self
    }

    pub fn foreign_key(mut self, field: &str, collection: &str, required: bool) -> Self {
        self.foreign_keys.push(ForeignKey {
            field: field.to_string(),
            collection: collection.to_string(),
            target_field: "id".to_string(),
            required,
            many: false,
        });
        self
    }

    pub fn foreign_key_many(mut self, field: &str, collection: &str, target_field: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            field: field.to_string(),
            collection: collection.to_string(),
            target_field: target_field.to_string(),
            required: false,
            many: true,
        });
        self
    }

    pub fn referenced_by(mut self, source_collection: &str, source_field: &str) -> Self {
        self.reverse_constraints.push(ReverseConstraint {
            source_collection: source_collection.to_string(),
            source_field: source_field.to_string(),
        });
        self
    }

    pub fn graph(mut self, extractor: AdjacencyExtractor) -> Self {
        self.graph = Some(extractor);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn push_field(&mut self, name: &str, field_type: FieldType, required: bool) {
        let spec = FieldSpec {
            name: name.to_string(),
            field_type,
            required,
        };
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
    }
}
