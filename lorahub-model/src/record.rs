//! The device record envelope.

use chrono::{DateTime, Utc};
use lorahub_types::{EndDeviceIds, FieldPath};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A logical end-device record.
///
/// The underlying value is always a JSON object; fields are addressed by
/// `FieldPath`. The record is reconstructed fresh on every read — callers
/// must not assume it is materialized anywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRecord(Value);

impl Default for DeviceRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Wraps an existing JSON value. Non-object values are replaced by an
    /// empty object so path operations stay well-defined.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => Self(value),
            _ => Self::new(),
        }
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the record, returning the JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Whether the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.0.as_object().is_none_or(Map::is_empty)
    }

    /// Returns the value at `path`, if present.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let mut current = &self.0;
        for segment in path.segments() {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Returns the boolean at `path`, if present and boolean.
    pub fn get_bool(&self, path: &FieldPath) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// Returns the string at `path`, if present and a string.
    pub fn get_str(&self, path: &FieldPath) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Writes `value` at `path`, creating intermediate objects as needed.
    /// A non-object value in the middle of the path is replaced.
    pub fn set(&mut self, path: &FieldPath, value: Value) {
        let segments = path.segments();
        let mut current = &mut self.0;
        for segment in &segments[..segments.len() - 1] {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Value::Object(map) = current else { return };
            current = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else { return };
        map.insert(segments[segments.len() - 1].clone(), value);
    }

    /// Removes the value at `path`, returning it if it was present.
    pub fn remove(&mut self, path: &FieldPath) -> Option<Value> {
        let segments = path.segments();
        let mut current = &mut self.0;
        for segment in &segments[..segments.len() - 1] {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        current
            .as_object_mut()?
            .remove(&segments[segments.len() - 1])
    }

    /// Enumerates every leaf path of the record. Scalars, arrays, `null`s,
    /// and empty objects are leaves.
    pub fn leaf_paths(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        if let Some(map) = self.0.as_object() {
            for (key, value) in map {
                collect_leaves(value, vec![key.clone()], &mut out);
            }
        }
        out
    }

    /// Deserializes the `ids` block, if present and well-formed.
    pub fn ids(&self) -> Option<EndDeviceIds> {
        let ids = self.0.as_object()?.get("ids")?;
        serde_json::from_value(ids.clone()).ok()
    }

    /// Overwrites the `ids` block.
    pub fn set_ids(&mut self, ids: &EndDeviceIds) {
        if let (Some(map), Ok(value)) = (self.0.as_object_mut(), serde_json::to_value(ids)) {
            map.insert("ids".to_string(), value);
        }
    }

    /// The creation timestamp, if the record carries one.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp_field("created_at")
    }

    /// The last-update timestamp, if the record carries one.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp_field("updated_at")
    }

    fn timestamp_field(&self, key: &str) -> Option<DateTime<Utc>> {
        self.0
            .as_object()?
            .get(key)?
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn collect_leaves(value: &Value, segments: Vec<String>, out: &mut Vec<FieldPath>) {
    match value.as_object() {
        Some(map) if !map.is_empty() => {
            for (key, child) in map {
                let mut next = segments.clone();
                next.push(key.clone());
                collect_leaves(child, next, out);
            }
        }
        _ => out.push(FieldPath::from_segments(segments)),
    }
}
