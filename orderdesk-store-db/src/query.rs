// SPDX-FileCopyrightText: 2025 orderdesk contributors
// SPDX-License-Identifier: MIT

//! Read query operations for the store database.

use rusqlite::{Connection, Params, ToSql, params};
use tracing::debug;

use crate::connection::{StoreDb, quote_identifier};
use crate::error::{Error, Result};
use crate::value::{Affinity, Row, Value};

/// Single-row equality selection against one table.
///
/// Renders as `SELECT * FROM "<table>" WHERE "<table>"."<column>" = ?1 LIMIT 1`;
/// the value is always bound, never spliced into the statement. The column is
/// table-qualified so an unknown column is an error instead of being read as
/// a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector<'a> {
    pub table: &'a str,
    pub column: &'a str,
    pub value: &'a str,
}

impl<'a> Selector<'a> {
    pub fn new(table: &'a str, column: &'a str, value: &'a str) -> Self {
        Self {
            table,
            column,
            value,
        }
    }

    fn sql(&self) -> String {
        let table = quote_identifier(self.table);
        format!(
            "SELECT * FROM {table} WHERE {table}.{} = ?1 LIMIT 1",
            quote_identifier(self.column)
        )
    }
}

impl StoreDb {
    /// Run a parameterized query and return every row.
    ///
    /// Use `?N` placeholders for all values. A query against a table that was
    /// never loaded returns no rows rather than an error.
    pub fn query(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>> {
        let conn = self.lookup_connection()?;
        query_rows(&conn, sql, params, None)
    }

    /// Fetch the first row matching `selector`.
    ///
    /// Returns `None` both when nothing matches and when the table does not
    /// exist; callers cannot tell the two apart through this call.
    pub fn query_one(&self, selector: &Selector<'_>) -> Result<Option<Row>> {
        let conn = self.lookup_connection()?;
        let rows = query_rows(&conn, &selector.sql(), params![selector.value], Some(1))?;
        Ok(rows.into_iter().next())
    }

    /// Connection for a lookup; an unavailable store is a failed query.
    fn lookup_connection(&self) -> Result<Connection> {
        self.connect().map_err(|e| match e {
            Error::DatabaseOpen { source, .. } | Error::Storage(source) => query_failed(source),
            other => other,
        })
    }

    /// Check whether `table` has been created by an import.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let conn = self.connect()?;
        table_exists(&conn, table)
    }

    /// Count the rows of `table`, or `None` if it has not been loaded.
    pub fn row_count(&self, table: &str) -> Result<Option<u64>> {
        let conn = self.connect()?;
        if !table_exists(&conn, table)? {
            return Ok(None);
        }
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(Some(count as u64))
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare_cached("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    Ok(stmt.exists(params![table])?)
}

fn is_missing_table(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such table")
    )
}

fn query_failed(source: rusqlite::Error) -> Error {
    Error::QueryFailed { source }
}

fn query_rows<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    limit: Option<usize>,
) -> Result<Vec<Row>> {
    let mut stmt = match conn.prepare(sql) {
        Ok(stmt) => stmt,
        Err(e) if is_missing_table(&e) => {
            debug!("Query against unloaded table: {e}");
            return Ok(Vec::new());
        }
        Err(e) => return Err(query_failed(e)),
    };

    let columns: Vec<(String, Option<Affinity>)> = stmt
        .columns()
        .iter()
        .map(|c| {
            (
                c.name().to_owned(),
                c.decl_type().and_then(Affinity::from_decl_type),
            )
        })
        .collect();

    let mut found = Vec::new();
    let mut rows = stmt.query(params).map_err(query_failed)?;
    while let Some(row) = rows.next().map_err(query_failed)? {
        let mut out = Row::new();
        for (i, (name, affinity)) in columns.iter().enumerate() {
            let cell = row.get_ref(i).map_err(query_failed)?;
            out.push(name.clone(), Value::from_sql(cell, *affinity));
        }
        found.push(out);
        if limit.is_some_and(|limit| found.len() >= limit) {
            break;
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_sql_quotes_identifiers() {
        let selector = Selector::new("orders", "order_no", "x'); DROP TABLE orders;--");
        assert_eq!(
            selector.sql(),
            r#"SELECT * FROM "orders" WHERE "orders"."order_no" = ?1 LIMIT 1"#
        );
    }

    #[test]
    fn test_missing_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = StoreDb::new(dir.path().join("store.db")).unwrap();

        assert_eq!(db.query_one(&Selector::new("orders", "order_no", "ORD1")).unwrap(), None);
        assert!(db.query("SELECT * FROM orders", &[]).unwrap().is_empty());
        assert!(!db.table_exists("orders").unwrap());
        assert_eq!(db.row_count("orders").unwrap(), None);
    }

    #[test]
    fn test_malformed_sql_is_query_failed() {
        let dir = tempfile::tempdir().unwrap();
        let db = StoreDb::new(dir.path().join("store.db")).unwrap();

        let err = db.query("SELEC nonsense", &[]).unwrap_err();
        assert!(matches!(err, Error::QueryFailed { .. }), "{err}");
    }

    #[test]
    fn test_unopenable_store_is_query_failed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the database file should be cannot be opened.
        let db = StoreDb::new(dir.path()).unwrap();

        let err = db
            .query_one(&Selector::new("orders", "order_no", "ORD1"))
            .unwrap_err();
        assert!(matches!(err, Error::QueryFailed { .. }), "{err}");

        let err = db.find_order("ORD1").unwrap_err();
        assert!(matches!(err, Error::QueryFailed { .. }), "{err}");
    }
}
