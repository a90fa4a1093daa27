// SPDX-FileCopyrightText: 2025 orderdesk contributors
// SPDX-License-Identifier: MIT

//! Snapshot import: JSON array file → replaced SQLite table.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, params_from_iter};
use tracing::{info, warn};

use crate::connection::{StoreDb, quote_identifier};
use crate::error::{Error, Result};
use crate::value::{Affinity, Value};

/// A parsed snapshot, already shaped as a table.
#[derive(Debug)]
pub(crate) struct Snapshot {
    /// Union of object keys in first-seen order, with inferred types
    columns: Vec<(String, Affinity)>,
    /// One cell per column; keys missing from an object are null
    rows: Vec<Vec<Value>>,
}

impl Snapshot {
    /// Parse snapshot bytes. `path` is only used for error messages.
    pub(crate) fn parse(path: &Path, bytes: &[u8]) -> Result<Self> {
        let document: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| Error::invalid_data(path, e.to_string()))?;

        let elements = match document {
            serde_json::Value::Array(elements) => elements,
            other => {
                return Err(Error::invalid_data(
                    path,
                    format!("expected a JSON array of objects, found {}", kind(&other)),
                ));
            }
        };

        let mut objects = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            match element {
                serde_json::Value::Object(object) => objects.push(object),
                other => {
                    return Err(Error::invalid_data(
                        path,
                        format!("element {index} is {}, not an object", kind(&other)),
                    ));
                }
            }
        }

        // SQLite folds ASCII case in identifiers, so "ID" and "id" would be
        // the same column.
        let mut names: Vec<String> = Vec::new();
        let mut folded: HashMap<String, usize> = HashMap::new();
        for object in &objects {
            for key in object.keys() {
                if key.is_empty() {
                    return Err(Error::invalid_data(path, "empty field name"));
                }
                match folded.get(&key.to_ascii_lowercase()) {
                    Some(&i) if names[i] == *key => {}
                    Some(&i) => {
                        return Err(Error::invalid_data(
                            path,
                            format!("fields '{}' and '{key}' collide", names[i]),
                        ));
                    }
                    None => {
                        folded.insert(key.to_ascii_lowercase(), names.len());
                        names.push(key.clone());
                    }
                }
            }
        }

        // Objects without fields carry no data; import them like `[]`.
        if names.is_empty() {
            return Ok(Self {
                columns: Vec::new(),
                rows: Vec::new(),
            });
        }

        let rows: Vec<Vec<Value>> = objects
            .iter()
            .map(|object| {
                names
                    .iter()
                    .map(|name| object.get(name).map_or(Value::Null, Value::from_json))
                    .collect()
            })
            .collect();

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, Affinity::infer(rows.iter().map(|row| &row[i]))))
            .collect();

        Ok(Self { columns, rows })
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Replace `table` with this snapshot in a single transaction.
    ///
    /// An empty snapshot leaves the table dropped: SQLite has no zero-column
    /// tables, and lookups treat a missing table as "no match".
    pub(crate) fn replace_table(&self, conn: &mut Connection, table: &str) -> Result<usize> {
        let quoted = quote_identifier(table);
        let tx = conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {quoted}"), [])?;

        if !self.rows.is_empty() {
            let definitions = self
                .columns
                .iter()
                .map(|(name, affinity)| format!("{} {}", quote_identifier(name), affinity.sql_type()))
                .collect::<Vec<_>>()
                .join(", ");
            tx.execute(&format!("CREATE TABLE {quoted} ({definitions})"), [])?;

            let names = self
                .columns
                .iter()
                .map(|(name, _)| quote_identifier(name))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = (1..=self.columns.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            let mut stmt =
                tx.prepare(&format!("INSERT INTO {quoted} ({names}) VALUES ({placeholders})"))?;
            for row in &self.rows {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }

        tx.commit()?;
        Ok(self.rows.len())
    }
}

fn kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl StoreDb {
    /// Import a JSON snapshot into `table`, replacing whatever it held.
    ///
    /// Returns the number of rows imported. An empty array, or an array of
    /// objects without fields, imports zero rows and is not an error.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `json_file` does not exist
    /// - [`Error::InvalidData`] if it is not a JSON array of flat objects
    /// - [`Error::Storage`] if the table could not be written
    pub fn import<P: AsRef<Path>>(&self, table: &str, json_file: P) -> Result<usize> {
        let path = json_file.as_ref();
        if table.is_empty() {
            return Err(Error::InvalidArgument("table name must not be empty".into()));
        }

        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_owned(),
            },
            _ => Error::Io {
                context: format!("Failed to read snapshot {}", path.display()),
                source: e,
            },
        })?;

        let snapshot = Snapshot::parse(path, &bytes)?;
        let mut conn = self.connect()?;
        let rows = snapshot.replace_table(&mut conn, table)?;

        if snapshot.len() == 0 {
            warn!("JSON file {} has no rows; table '{table}' dropped", path.display());
        } else {
            info!(
                "Imported {rows} rows into table '{table}' from {}",
                path.display()
            );
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Snapshot> {
        Snapshot::parse(Path::new("test.json"), text.as_bytes())
    }

    #[test]
    fn test_union_of_keys_in_first_seen_order() {
        let snapshot = parse(
            r#"[
                {"order_no": "ORD1", "customer_id": "C1"},
                {"order_no": "ORD2", "order_status": "SHIPPED"}
            ]"#,
        )
        .unwrap();

        let names: Vec<&str> = snapshot.columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["order_no", "customer_id", "order_status"]);
        assert_eq!(snapshot.rows[0][2], Value::Null);
        assert_eq!(snapshot.rows[1][1], Value::Null);
    }

    #[test]
    fn test_inferred_types() {
        let snapshot = parse(
            r#"[
                {"qty": 1, "amount": 10, "paid": true, "note": null},
                {"qty": 2, "amount": 12.5, "paid": false, "note": null}
            ]"#,
        )
        .unwrap();

        let types: Vec<Affinity> = snapshot.columns.iter().map(|(_, a)| *a).collect();
        assert_eq!(
            types,
            [
                Affinity::Integer,
                Affinity::Real,
                Affinity::Boolean,
                Affinity::Text
            ]
        );
    }

    #[test]
    fn test_rejects_non_array() {
        let err = parse(r#"{"order_no": "ORD1"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }), "{err}");
        assert!(err.to_string().contains("found an object"));
    }

    #[test]
    fn test_rejects_non_object_element() {
        let err = parse(r#"[{"a": 1}, 2]"#).unwrap_err();
        assert!(err.to_string().contains("element 1 is a number"), "{err}");
    }

    #[test]
    fn test_rejects_syntax_error() {
        let err = parse("[{\"a\": 1},").unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn test_rejects_case_colliding_fields() {
        let err = parse(r#"[{"id": 1}, {"ID": 2}]"#).unwrap_err();
        assert!(err.to_string().contains("collide"), "{err}");
    }

    #[test]
    fn test_non_ascii_case_variants_do_not_collide() {
        let snapshot = parse(r#"[{"Émail": "a@example.com", "émail": "b@example.com"}]"#).unwrap();
        let names: Vec<&str> = snapshot.columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Émail", "émail"]);
    }

    #[test]
    fn test_objects_without_fields_import_nothing() {
        let snapshot = parse("[{}, {}]").unwrap();
        assert_eq!(snapshot.len(), 0);
        assert!(snapshot.columns.is_empty());
    }

    #[test]
    fn test_empty_array_is_valid() {
        let snapshot = parse("[]").unwrap();
        assert_eq!(snapshot.len(), 0);
        assert!(snapshot.columns.is_empty());
    }
}
