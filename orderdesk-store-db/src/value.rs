// SPDX-FileCopyrightText: 2025 orderdesk contributors
// SPDX-License-Identifier: MIT

//! Row and cell types for schema-less snapshot tables.
//!
//! Snapshot shapes are not fixed, so rows are decoded into an ordered
//! column → [`Value`] mapping rather than into per-entity structs.

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single cell of a snapshot row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Convert one JSON field of a snapshot object.
    ///
    /// Nested arrays and objects are kept as their compact JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Real),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            nested => Value::Text(nested.to_string()),
        }
    }

    /// Decode a stored cell. `affinity` is the declared column type, used to
    /// give booleans back their JSON type.
    pub(crate) fn from_sql(value: ValueRef<'_>, affinity: Option<Affinity>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) if affinity == Some(Affinity::Boolean) => Value::Bool(i != 0),
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) | ValueRef::Blob(t) => {
                Value::Text(String::from_utf8_lossy(t).into_owned())
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Real(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(b) => ToSqlOutput::from(*b),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Real(_) => serializer.serialize_unit(),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Column type inferred from the non-null values of a snapshot column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Boolean,
    Integer,
    Real,
    Text,
}

impl Affinity {
    /// Infer the column type of a sequence of cells. Columns holding only
    /// nulls, or mixed kinds, fall back to text.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        values
            .into_iter()
            .try_fold(None, |acc, value| {
                let next = match (acc, value) {
                    (acc, Value::Null) => return Some(acc),
                    (None | Some(Affinity::Boolean), Value::Bool(_)) => Affinity::Boolean,
                    (None | Some(Affinity::Integer), Value::Integer(_)) => Affinity::Integer,
                    (Some(Affinity::Real), Value::Integer(_)) => Affinity::Real,
                    (None | Some(Affinity::Integer | Affinity::Real), Value::Real(_)) => {
                        Affinity::Real
                    }
                    _ => return None,
                };
                Some(Some(next))
            })
            .flatten()
            .unwrap_or(Affinity::Text)
    }

    /// Declared SQL column type.
    pub fn sql_type(self) -> &'static str {
        match self {
            Affinity::Boolean => "BOOLEAN",
            Affinity::Integer => "INTEGER",
            Affinity::Real => "REAL",
            Affinity::Text => "TEXT",
        }
    }

    /// Map a declared column type back to an affinity.
    pub fn from_decl_type(decl: &str) -> Option<Self> {
        match decl.to_ascii_uppercase().as_str() {
            "BOOLEAN" => Some(Affinity::Boolean),
            "INTEGER" => Some(Affinity::Integer),
            "REAL" => Some(Affinity::Real),
            "TEXT" => Some(Affinity::Text),
            _ => None,
        }
    }
}

/// One table row, columns in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Render as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.columns
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
