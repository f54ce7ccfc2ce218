//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and database functions for storing transactions
//! - The `TransactionSource` trait the analytics read user snapshots through
//! - Route handlers for listing and creating transactions

mod core;
mod endpoints;
mod source;

pub use core::{NewTransaction, Transaction, create_transaction, create_transaction_table};
pub use endpoints::{create_transaction_endpoint, get_transactions_endpoint};
pub use source::TransactionSource;

#[cfg(test)]
pub(crate) use core::create_test_transaction;
