//! Groups transactions by category for the breakdown chart.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::{
    Amount, Category, category::UNKNOWN_CATEGORY, database_id::CategoryId,
    transaction::Transaction,
};

/// The summed amount of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category's display name, or "Unknown" if it no longer exists.
    pub category: String,
    /// The category's icon token, empty if the category no longer exists.
    pub icon: String,
    /// The sum of the category's transaction amounts.
    pub amount: Amount,
}

/// Sums `transactions` per category, ordered by category ID.
///
/// Only categories with at least one transaction appear in the output. Callers
/// should pass transactions of a single type, otherwise expenses and revenues
/// in the same category are added together.
pub fn total_by_category<'a, I>(
    transactions: I,
    categories: &HashMap<CategoryId, Category>,
) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: BTreeMap<CategoryId, Amount> = BTreeMap::new();

    for transaction in transactions {
        *totals.entry(transaction.category_id).or_default() += transaction.amount;
    }

    totals
        .into_iter()
        .map(|(category_id, amount)| match categories.get(&category_id) {
            Some(category) => CategoryTotal {
                category: category.name.clone(),
                icon: category.icon.clone(),
                amount,
            },
            None => CategoryTotal {
                category: UNKNOWN_CATEGORY.to_owned(),
                icon: String::new(),
                amount,
            },
        })
        .collect()
}
