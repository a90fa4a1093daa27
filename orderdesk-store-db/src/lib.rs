// SPDX-FileCopyrightText: 2025 orderdesk contributors
// SPDX-License-Identifier: MIT

//! SQLite-backed lookup layer for customer, order, transaction and refund records.
//!
//! Tables are (re)populated wholesale from JSON array snapshots and then
//! served through single-row lookups.
//!
//! **Lifecycle**: construct a [`StoreDb`], call [`StoreDb::initialize`] once,
//! then serve lookups. Every lookup opens its own connection.
//!
//! # Key Features
//!
//! - Schema inferred from snapshot shape (no fixed row structs)
//! - Replace-not-append imports, one transaction per table
//! - Per-table outcome report; only a missing data directory is fatal
//! - Placeholder-bound lookups; "no row" and "no table" both yield `None`
//!
//! # Example
//!
//! ```ignore
//! use orderdesk_store_db::StoreDb;
//!
//! let db = StoreDb::new("./data/temp/order-management.db")?;
//! let report = db.initialize("./data")?;
//! if let Some(order) = db.find_order("ORD00009998")? {
//!     println!("{}", serde_json::to_string(&order)?);
//! }
//! ```

mod connection;
mod error;
mod import;
mod init;
mod lookup;
mod query;
mod table;
mod value;

pub use connection::StoreDb;
pub use error::{Error, Result};
pub use init::{InitReport, TableOutcome};
pub use query::Selector;
pub use table::Table;
pub use value::{Affinity, Row, Value};
