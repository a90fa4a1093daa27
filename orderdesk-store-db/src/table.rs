// SPDX-FileCopyrightText: 2025 orderdesk contributors
// SPDX-License-Identifier: MIT

//! The fixed set of entity tables.

use std::fmt;

use serde::Serialize;

/// One of the four entity tables loaded at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Customers,
    Orders,
    Transactions,
    Refunds,
}

impl Table {
    /// All tables, in import order.
    pub const ALL: [Table; 4] = [
        Table::Customers,
        Table::Orders,
        Table::Transactions,
        Table::Refunds,
    ];

    /// Name of the backing table.
    pub fn name(self) -> &'static str {
        match self {
            Table::Customers => "customers",
            Table::Orders => "orders",
            Table::Transactions => "transactions",
            Table::Refunds => "refunds",
        }
    }

    /// Snapshot file name expected in the data directory.
    pub fn snapshot_file(self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
