//! Typed access over a loosely-typed JSON object.
//!
//! # Design
//! `JsonObject` owns a `serde_json::Map` and exposes only read access, so a
//! decoder sees exactly what the parser produced. Lookups come in two forms:
//! `get_required` treats absence as an error, `get_optional` treats absence
//! and JSON `null` as "no value". Both reject a present value of the wrong
//! shape with `DecodeError::UnexpectedType`.
//!
//! The per-type conversion lives in `FromJson`. Conversions are strict: a
//! string is never read as a number, and an integer type never accepts a
//! fractional or out-of-range number.

use serde_json::{Map, Value};

use crate::error::{ApiError, DecodeError};

/// A type that can construct itself from a `JsonObject`.
///
/// Implemented once per response type. Report the first missing or
/// mismatched field through the `DecodeError` returned by the accessors.
pub trait JsonDecodable: Sized {
    fn from_json(json: &JsonObject) -> Result<Self, DecodeError>;
}

/// Conversion from a single JSON value. `None` means the value has the wrong shape.
pub trait FromJson: Sized {
    fn from_json_value(value: &Value) -> Option<Self>;
}

impl FromJson for Value {
    fn from_json_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromJson for String {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FromJson for bool {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromJson for f64 {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromJson for i64 {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromJson for u64 {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_u64()
    }
}

impl FromJson for i32 {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|n| i32::try_from(n).ok())
    }
}

impl FromJson for u32 {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_u64().and_then(|n| u32::try_from(n).ok())
    }
}

impl<T: FromJson> FromJson for Vec<T> {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_array()?.iter().map(T::from_json_value).collect()
    }
}

impl FromJson for Map<String, Value> {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }
}

impl FromJson for JsonObject {
    fn from_json_value(value: &Value) -> Option<Self> {
        value.as_object().cloned().map(JsonObject::new)
    }
}

/// Read-only view over one decoded JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonObject {
    json: Map<String, Value>,
}

impl JsonObject {
    pub fn new(json: Map<String, Value>) -> Self {
        Self { json }
    }

    /// Parse a response body into an object.
    ///
    /// A body of only whitespace counts as empty.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::EmptyBody);
        }
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Wrap an already-parsed value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        match value {
            Value::Object(json) => Ok(Self::new(json)),
            _ => Err(ApiError::UnexpectedResponseType),
        }
    }

    /// Look up `key`, failing if it is absent or not readable as `T`.
    ///
    /// A JSON `null` is only accepted when `T` itself admits it (such as `Value`).
    pub fn get_required<T: FromJson>(&self, key: &str) -> Result<T, DecodeError> {
        let value = self
            .json
            .get(key)
            .ok_or_else(|| DecodeError::MissingRequiredKey(key.to_string()))?;
        T::from_json_value(value).ok_or_else(|| DecodeError::UnexpectedType { key: key.to_string() })
    }

    /// Look up `key`, returning `None` if it is absent or `null`.
    pub fn get_optional<T: FromJson>(&self, key: &str) -> Result<Option<T>, DecodeError> {
        match self.json.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_json_value(value)
                .map(Some)
                .ok_or_else(|| DecodeError::UnexpectedType { key: key.to_string() }),
        }
    }

    /// Decode the nested object under `key` as `T`.
    pub fn get_decodable<T: JsonDecodable>(&self, key: &str) -> Result<T, DecodeError> {
        let nested: JsonObject = self.get_required(key)?;
        T::from_json(&nested)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.json.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.json.len()
    }

    pub fn is_empty(&self) -> bool {
        self.json.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.json
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.json
    }
}

impl TryFrom<Value> for JsonObject {
    type Error = ApiError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for JsonObject {
    fn from(json: Map<String, Value>) -> Self {
        Self::new(json)
    }
}
