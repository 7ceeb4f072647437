//! Test data factories using builder pattern
//!
//! Produces raw source documents the way they appear in an import file.
use serde_json::{json, Map, Value};

pub struct SightingFactory {
    fields: Map<String, Value>,
}

impl SightingFactory {
    /// Document with every field filled in
    pub fn new(id: &str) -> Self {
        let Value::Object(fields) = json!({
            "id": id,
            "sighted": "2013-01-01T10:00:00Z",
            "reported": "2013-01-02T08:30:00Z",
            "location": "Phoenix, AZ",
            "shape": "light",
            "duration": "5 minutes",
            "description": "Three lights moving in a V formation",
            "read": false
        }) else {
            unreachable!()
        };
        Self { fields }
    }

    /// Document with only an id
    pub fn minimal(id: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(id));
        Self { fields }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.fields.remove(key);
        self
    }

    pub fn shape(self, shape: &str) -> Self {
        self.with("shape", json!(shape))
    }

    pub fn sighted(self, date: &str) -> Self {
        self.with("sighted", json!(date))
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }

    /// `count` full documents with ids `{prefix}-0 .. {prefix}-{count - 1}`
    pub fn batch(prefix: &str, count: usize) -> Value {
        Value::Array(
            (0..count)
                .map(|i| Self::new(&format!("{}-{}", prefix, i)).build())
                .collect(),
        )
    }
}
