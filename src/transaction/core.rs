//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Serialize, Serializer};
use time::Date;

use crate::{
    Amount, Error, TransactionType, UserID,
    database_id::{CategoryId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or revenue, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    #[serde(skip)]
    pub user_id: UserID,
    /// When the transaction happened.
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned, always positive.
    pub amount: Amount,
    /// Whether money was spent or earned.
    ///
    /// This is independent of the category's type.
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// The data needed to insert a transaction with [create_transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// When the transaction happened.
    pub date: Date,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned.
    pub amount: Amount,
    /// Whether money was spent or earned.
    pub kind: TransactionType,
}

/// Serializes dates as `YYYY-MM-DD`.
pub(crate) fn serialize_date<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(date)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the user or category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, date, category_id, description, amount, type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, user_id, date, category_id, description, amount, type",
        )?
        .query_row(
            (
                transaction.user_id.as_i64(),
                transaction.date,
                transaction.category_id,
                transaction.description,
                transaction.amount,
                transaction.kind,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
#[cfg(test)]
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, date, category_id, description, amount, type
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                amount INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('expense', 'revenue')),
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE
                )",
        (),
    )?;

    // Used by every owner scoped, date filtered query.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// Expects the columns `id, user_id, date, category_id, description, amount, type`.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let date = row.get(2)?;
    let category_id = row.get(3)?;
    let description = row.get(4)?;
    let amount = row.get(5)?;
    let kind = row.get(6)?;

    Ok(Transaction {
        id,
        user_id,
        date,
        category_id,
        description,
        amount,
        kind,
    })
}

#[cfg(test)]
pub(crate) fn create_test_transaction(
    user_id: UserID,
    date: Date,
    category_id: CategoryId,
    cents: i64,
    kind: TransactionType,
    connection: &Connection,
) -> Transaction {
    create_transaction(
        NewTransaction {
            user_id,
            date,
            category_id,
            description: format!("{kind} on {date}"),
            amount: Amount::from_cents(cents),
            kind,
        },
        connection,
    )
    .expect("Could not create test transaction")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Amount, Error, TransactionType, UserID,
        category::create_test_category,
        db::initialize,
        transaction::core::{NewTransaction, create_transaction, get_transaction},
        user::create_test_user,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let category = create_test_category("Grocery", TransactionType::Expense, &conn);
        let amount = Amount::from_cents(1230);

        let transaction = create_transaction(
            NewTransaction {
                user_id: user.id,
                date: date!(2025 - 10 - 05),
                category_id: category.id,
                description: "Supermarket".to_owned(),
                amount,
                kind: TransactionType::Expense,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.amount, amount);
        assert_eq!(get_transaction(transaction.id, &conn), Ok(transaction));
    }

    #[test]
    fn create_fails_on_missing_category() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);

        let result = create_transaction(
            NewTransaction {
                user_id: user.id,
                date: date!(2025 - 10 - 05),
                category_id: 42,
                description: "Supermarket".to_owned(),
                amount: Amount::from_cents(100),
                kind: TransactionType::Expense,
            },
            &conn,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn create_fails_on_missing_user() {
        let conn = get_test_connection();
        let category = create_test_category("Grocery", TransactionType::Expense, &conn);

        let result = create_transaction(
            NewTransaction {
                user_id: UserID::new(999),
                date: date!(2025 - 10 - 05),
                category_id: category.id,
                description: "Supermarket".to_owned(),
                amount: Amount::from_cents(100),
                kind: TransactionType::Expense,
            },
            &conn,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn get_fails_for_missing_id() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(7, &conn), Err(Error::NotFound));
    }

    #[test]
    fn serializes_date_and_amount_as_strings() {
        let conn = get_test_connection();
        let user = create_test_user("alice", &conn);
        let category = create_test_category("Salary", TransactionType::Revenue, &conn);

        let transaction = create_transaction(
            NewTransaction {
                user_id: user.id,
                date: date!(2024 - 01 - 05),
                category_id: category.id,
                description: "January pay".to_owned(),
                amount: Amount::from_cents(350_000),
                kind: TransactionType::Revenue,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&transaction).unwrap(),
            json!({
                "id": transaction.id,
                "date": "2024-01-05",
                "category_id": category.id,
                "description": "January pay",
                "amount": "3500.00",
                "type": "revenue",
            })
        );
    }
}
