// SPDX-FileCopyrightText: 2025 orderdesk contributors
// SPDX-License-Identifier: MIT

//! Startup import of every entity table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::connection::StoreDb;
use crate::error::{Error, Result};
use crate::table::Table;

/// What happened to one table during initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableOutcome {
    /// Snapshot imported (possibly zero rows)
    Success {
        rows_imported: usize,
        source_file: String,
    },
    /// Snapshot file absent; table left as it was
    Skipped { reason: String },
    /// Snapshot present but unusable; table left as it was
    Error { error: String },
}

impl TableOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TableOutcome::Success { .. })
    }

    fn log(&self, table: Table) {
        match self {
            TableOutcome::Success { rows_imported, .. } => {
                info!("Table '{table}': SUCCESS ({rows_imported} rows)")
            }
            TableOutcome::Skipped { reason } => warn!("Table '{table}': SKIPPED ({reason})"),
            TableOutcome::Error { error } => error!("Table '{table}': ERROR ({error})"),
        }
    }
}

/// Per-table outcomes of [`StoreDb::initialize`], in import order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InitReport {
    tables: BTreeMap<Table, TableOutcome>,
}

impl InitReport {
    pub fn get(&self, table: Table) -> Option<&TableOutcome> {
        self.tables.get(&table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Table, &TableOutcome)> {
        self.tables.iter().map(|(table, outcome)| (*table, outcome))
    }

    /// True when every table imported successfully.
    pub fn is_complete(&self) -> bool {
        Table::ALL
            .iter()
            .all(|table| self.get(*table).is_some_and(TableOutcome::is_success))
    }
}

impl StoreDb {
    /// Import `<table>.json` from `data_dir` for every known table.
    ///
    /// A missing snapshot file marks that table `SKIPPED`; any other import
    /// failure marks it `ERROR`. Neither stops the remaining tables.
    ///
    /// Must run to completion before lookups are served: imports replace
    /// tables in place.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `data_dir` is not an existing directory. No
    /// table is touched in that case.
    pub fn initialize<P: AsRef<Path>>(&self, data_dir: P) -> Result<InitReport> {
        let data_dir = data_dir.as_ref();
        if !data_dir.is_dir() {
            return Err(Error::NotFound {
                path: data_dir.to_owned(),
            });
        }

        info!("Initializing database from JSON files in {}", data_dir.display());
        let mut report = InitReport::default();
        for table in Table::ALL {
            let json_file = data_dir.join(table.snapshot_file());
            let outcome = match self.import(table.name(), &json_file) {
                Ok(rows_imported) => TableOutcome::Success {
                    rows_imported,
                    source_file: json_file.display().to_string(),
                },
                Err(e) if e.is_not_found() => TableOutcome::Skipped {
                    reason: format!("JSON file not found: {}", json_file.display()),
                },
                Err(e) => TableOutcome::Error {
                    error: e.to_string(),
                },
            };
            outcome.log(table);
            report.tables.insert(table, outcome);
        }
        Ok(report)
    }
}
