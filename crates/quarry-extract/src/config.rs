//! Extractor configuration model.
//!
//! A configuration is an open map of JSON fields. The `extractor_type`
//! field names the concrete extractor the configuration belongs to; the
//! optional `auto_map` field maps loader entry points to custom class
//! names for configurations published from subclassed extractors.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{ExtractError, ExtractResult};

/// Field naming the concrete extractor type.
pub const EXTRACTOR_TYPE_KEY: &str = "extractor_type";

/// Field mapping loader entry points to custom class names.
pub const AUTO_MAP_KEY: &str = "auto_map";

/// Open extractor configuration.
///
/// Fields are kept in a sorted map so serialization is deterministic:
/// the same configuration always produces the same bytes, and therefore
/// the same content digest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractorConfig {
    fields: BTreeMap<String, Value>,
}

impl ExtractorConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from serialized JSON.
    pub fn from_json_str(content: &str) -> ExtractResult<Self> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| ExtractError::InvalidConfig {
                message: format!("not valid JSON: {}", e),
            })?;

        match value {
            Value::Object(map) => Ok(Self {
                fields: map.into_iter().collect(),
            }),
            other => Err(ExtractError::InvalidConfig {
                message: format!("expected a JSON object, got {}", type_name(&other)),
            }),
        }
    }

    /// Serialize to pretty-printed JSON with a trailing newline.
    pub fn to_json_string(&self) -> ExtractResult<String> {
        let mut out =
            serde_json::to_string_pretty(&self.fields).map_err(|e| ExtractError::InvalidConfig {
                message: format!("serialization failed: {}", e),
            })?;
        out.push('\n');
        Ok(out)
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// The declared extractor type, if present.
    pub fn extractor_type(&self) -> Option<&str> {
        self.fields.get(EXTRACTOR_TYPE_KEY).and_then(Value::as_str)
    }

    /// The auto-class map, if present.
    pub fn auto_map(&self) -> Option<BTreeMap<String, String>> {
        let map = self.fields.get(AUTO_MAP_KEY)?.as_object()?;
        Some(
            map.iter()
                .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                .collect(),
        )
    }

    /// Set the auto-class map.
    pub fn set_auto_map(&mut self, map: &BTreeMap<String, String>) {
        let value = map
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        self.fields.insert(AUTO_MAP_KEY.to_string(), Value::Object(value));
    }

    /// Iterate over all fields.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether every field of `self` is present in `other` with an equal
    /// value. Fields only in `other` do not count against equality.
    pub fn fields_subset_of(&self, other: &Self) -> bool {
        self.fields
            .iter()
            .all(|(k, v)| other.fields.get(k) == Some(v))
    }
}

impl From<BTreeMap<String, Value>> for ExtractorConfig {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
