// SPDX-FileCopyrightText: 2025 orderdesk contributors
// SPDX-License-Identifier: MIT

//! Entity lookups by their domain keys.
//!
//! Every lookup returns at most one row. Key uniqueness is assumed, not
//! enforced, so duplicates resolve to whichever row SQLite yields first.

use crate::connection::StoreDb;
use crate::error::{Error, Result};
use crate::query::Selector;
use crate::table::Table;
use crate::value::Row;

impl StoreDb {
    /// Find an order by order number.
    pub fn find_order(&self, order_no: &str) -> Result<Option<Row>> {
        self.query_one(&Selector::new(Table::Orders.name(), "order_no", order_no))
    }

    /// Find a transaction by transaction ID.
    pub fn find_transaction(&self, transaction_id: &str) -> Result<Option<Row>> {
        self.query_one(&Selector::new(
            Table::Transactions.name(),
            "transaction_id",
            transaction_id,
        ))
    }

    /// Get the first transaction recorded against an order.
    pub fn transaction_for_order(&self, order_no: &str) -> Result<Option<Row>> {
        self.query_one(&Selector::new(
            Table::Transactions.name(),
            "order_no",
            order_no,
        ))
    }

    /// Get the first refund recorded against an order.
    pub fn refund_for_order(&self, order_no: &str) -> Result<Option<Row>> {
        self.query_one(&Selector::new(Table::Refunds.name(), "order_no", order_no))
    }

    /// Find a customer by customer ID or email.
    ///
    /// A non-empty `customer_id` wins; `email` is only consulted when no
    /// customer ID is given. The two are never combined.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if both keys are missing or empty. This is
    /// checked before the database is touched.
    pub fn find_customer(
        &self,
        customer_id: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Row>> {
        let customer_id = customer_id.filter(|id| !id.is_empty());
        let email = email.filter(|email| !email.is_empty());

        let selector = match (customer_id, email) {
            (Some(id), _) => Selector::new(Table::Customers.name(), "customer_id", id),
            (None, Some(email)) => Selector::new(Table::Customers.name(), "email", email),
            (None, None) => {
                return Err(Error::InvalidArgument(
                    "Either customer_id or email must be provided".into(),
                ));
            }
        };
        self.query_one(&selector)
    }
}
