//! Totals of expenses and revenues and the resulting balance.

use serde::Serialize;

use crate::{Amount, TransactionType, transaction::Transaction};

/// The totals over a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    /// The sum of all expenses.
    pub total_expenses: Amount,
    /// The sum of all revenues.
    pub total_revenues: Amount,
    /// Revenues minus expenses.
    pub balance: Amount,
}

/// Sum up `transactions` by type.
pub fn summarize<'a, I>(transactions: I) -> Summary
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut total_expenses = Amount::ZERO;
    let mut total_revenues = Amount::ZERO;

    for transaction in transactions {
        match transaction.kind {
            TransactionType::Expense => total_expenses += transaction.amount,
            TransactionType::Revenue => total_revenues += transaction.amount,
        }
    }

    Summary {
        total_expenses,
        total_revenues,
        balance: total_revenues - total_expenses,
    }
}
