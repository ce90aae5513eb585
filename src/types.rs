//! Field type coercion applied to records before emission.
//!
//! Types are declared as `name:type` pairs separated by commas, for example
//! `pid:integer,cpu_percent:float`. Values that fail to convert are left as
//! they are.

use ahash::AHashMap as HashMap;
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::record::ProcessRecord;

/// Type declarations used when the configuration does not set `types`.
pub const DEFAULT_TYPES: &str =
    "pid:integer,parent_pid:integer,cpu_percent:float,memory_percent:float,mem_rss:integer,mem_size:integer";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown field type '{0}', expected string, integer, float or bool")]
    UnknownType(String),

    #[error("malformed type declaration '{0}', expected name:type")]
    MalformedEntry(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Bool,
}

impl FromStr for FieldType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "integer" | "int" => Ok(FieldType::Integer),
            "float" => Ok(FieldType::Float),
            "bool" | "boolean" => Ok(FieldType::Bool),
            other => Err(TypeError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Declared field types keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeMap {
    types: HashMap<String, FieldType>,
}

impl TypeMap {
    /// Parses a `name:type,name:type` declaration list.
    pub fn parse(spec: &str) -> Result<Self, TypeError> {
        let mut types = HashMap::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, ty) = entry
                .split_once(':')
                .ok_or_else(|| TypeError::MalformedEntry(entry.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(TypeError::MalformedEntry(entry.to_string()));
            }
            types.insert(name.to_string(), ty.parse()?);
        }
        Ok(Self { types })
    }

    pub fn get(&self, key: &str) -> Option<FieldType> {
        self.types.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Converts every declared field of `record` in place.
    pub fn apply(&self, record: &mut ProcessRecord) {
        if self.types.is_empty() {
            return;
        }
        for (key, value) in record.iter_mut() {
            let Some(ty) = self.get(key) else {
                continue;
            };
            match convert(value, ty) {
                Some(converted) => *value = converted,
                None => debug!("Leaving field {} unconverted: {} is not a valid {}", key, value, ty),
            }
        }
    }
}

fn convert(value: &Value, ty: FieldType) -> Option<Value> {
    match (ty, value) {
        (_, Value::Null) => Some(Value::Null),
        (FieldType::String, Value::String(_)) => Some(value.clone()),
        (FieldType::String, other) => Some(Value::String(other.to_string())),
        (FieldType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        (FieldType::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        (FieldType::Bool, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(Value::Bool(true)),
            "false" | "no" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        // Already typed values (JSON listings, derived fields) are kept.
        (_, other) => Some(other.clone()),
    }
}
