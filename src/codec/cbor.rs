//! Deterministic CBOR encoding for string/integer-keyed maps.
//!
//! This is the container format for COSE keys and attestation objects. Only
//! the shapes those structures need are representable: maps keyed by text or
//! integers, holding byte strings, text, integers, booleans, nested maps, or
//! null. Anything else is a decode error rather than a lossy conversion.

use ciborium::value::Value;

use super::CodecError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapKey {
    Int(i64),
    Text(String),
}

impl From<i64> for MapKey {
    fn from(v: i64) -> Self {
        MapKey::Int(v)
    }
}

impl From<&str> for MapKey {
    fn from(v: &str) -> Self {
        MapKey::Text(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapValue {
    Bytes(Vec<u8>),
    Text(String),
    Int(i64),
    Bool(bool),
    Map(CborMap),
    Null,
}

/// An ordered map; entries encode in insertion order and round-trip as-is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CborMap(pub Vec<(MapKey, MapValue)>);

impl CborMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<MapKey>, value: MapValue) {
        self.0.push((key.into(), value));
    }

    pub fn get(&self, key: &MapKey) -> Option<&MapValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_int(&self, key: i64) -> Option<i64> {
        match self.get(&MapKey::Int(key)) {
            Some(MapValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bytes(&self, key: i64) -> Option<&[u8]> {
        match self.get(&MapKey::Int(key)) {
            Some(MapValue::Bytes(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(&MapKey::Text(key.to_string())) {
            Some(MapValue::Text(v)) => Some(v),
            _ => None,
        }
    }
}

pub fn encode_map(map: &CborMap) -> Result<Vec<u8>, CodecError> {
    let value = map_to_value(map);
    let mut buf = Vec::new();
    ciborium::into_writer(&value, &mut buf).map_err(|e| CodecError::Encoding(e.to_string()))?;
    Ok(buf)
}

pub fn decode_map(bytes: &[u8]) -> Result<CborMap, CodecError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CodecError::Decoding(e.to_string()))?;
    match value {
        Value::Map(entries) => map_from_entries(entries),
        other => Err(CodecError::Decoding(format!(
            "top-level CBOR value is not a map: {other:?}"
        ))),
    }
}

fn map_to_value(map: &CborMap) -> Value {
    let entries = map
        .0
        .iter()
        .map(|(k, v)| (key_to_value(k), value_to_value(v)))
        .collect();
    Value::Map(entries)
}

fn key_to_value(key: &MapKey) -> Value {
    match key {
        MapKey::Int(i) => Value::Integer((*i).into()),
        MapKey::Text(s) => Value::Text(s.clone()),
    }
}

fn value_to_value(value: &MapValue) -> Value {
    match value {
        MapValue::Bytes(b) => Value::Bytes(b.clone()),
        MapValue::Text(s) => Value::Text(s.clone()),
        MapValue::Int(i) => Value::Integer((*i).into()),
        MapValue::Bool(b) => Value::Bool(*b),
        MapValue::Map(m) => map_to_value(m),
        MapValue::Null => Value::Null,
    }
}

fn map_from_entries(entries: Vec<(Value, Value)>) -> Result<CborMap, CodecError> {
    let mut map = CborMap::new();
    for (key, value) in entries {
        map.0.push((key_from_value(key)?, value_from_value(value)?));
    }
    Ok(map)
}

fn key_from_value(value: Value) -> Result<MapKey, CodecError> {
    match value {
        Value::Integer(i) => i64::try_from(i128::from(i))
            .map(MapKey::Int)
            .map_err(|_| CodecError::Decoding("integer key out of i64 range".into())),
        Value::Text(s) => Ok(MapKey::Text(s)),
        other => Err(CodecError::Decoding(format!(
            "unsupported map key type: {other:?}"
        ))),
    }
}

fn value_from_value(value: Value) -> Result<MapValue, CodecError> {
    match value {
        Value::Bytes(b) => Ok(MapValue::Bytes(b)),
        Value::Text(s) => Ok(MapValue::Text(s)),
        Value::Integer(i) => i64::try_from(i128::from(i))
            .map(MapValue::Int)
            .map_err(|_| CodecError::Decoding("integer value out of i64 range".into())),
        Value::Bool(b) => Ok(MapValue::Bool(b)),
        Value::Map(entries) => Ok(MapValue::Map(map_from_entries(entries)?)),
        Value::Null => Ok(MapValue::Null),
        other => Err(CodecError::Decoding(format!(
            "unsupported map value type: {other:?}"
        ))),
    }
}
