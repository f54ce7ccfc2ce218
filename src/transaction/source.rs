//! Defines the read-only view of stored transactions used by the analytics and listing routes.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::{
    Category, Error, UserID,
    analytics::DateFilter,
    category::get_categories,
    database_id::CategoryId,
    transaction::{Transaction, core::map_transaction_row},
};

/// Supplies a user's transactions and the categories they refer to.
pub trait TransactionSource {
    /// Get the transactions owned by `user_id` whose date passes `filter`, newest first.
    ///
    /// Transactions on the same date are ordered by descending ID.
    fn snapshot(&self, user_id: UserID, filter: &DateFilter) -> Result<Vec<Transaction>, Error>;

    /// Get every category keyed by its ID.
    fn category_lookup(&self) -> Result<HashMap<CategoryId, Category>, Error>;
}

impl TransactionSource for Connection {
    fn snapshot(&self, user_id: UserID, filter: &DateFilter) -> Result<Vec<Transaction>, Error> {
        let (start, end) = match filter.date_range() {
            Some(range) => (Some(*range.start()), Some(*range.end())),
            None => (None, None),
        };

        let mut transactions = self
            .prepare(
                "SELECT id, user_id, date, category_id, description, amount, type
                 FROM \"transaction\"
                 WHERE user_id = ?1 AND (?2 IS NULL OR date BETWEEN ?2 AND ?3)
                 ORDER BY date DESC, id DESC",
            )?
            .query_map((user_id.as_i64(), start, end), map_transaction_row)?
            .collect::<Result<Vec<_>, _>>()?;

        transactions.retain(|transaction| filter.contains(transaction.date));

        Ok(transactions)
    }

    fn category_lookup(&self) -> Result<HashMap<CategoryId, Category>, Error> {
        Ok(get_categories(None, self)?
            .into_iter()
            .map(|category| (category.id, category))
            .collect())
    }
}
