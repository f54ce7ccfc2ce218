//! Route handlers for listing and creating a user's transactions.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json, value::RawValue};
use time::{Date, macros::format_description};

use crate::{
    Amount, AppState, Category, Error, TransactionType, UserID,
    analytics::{PeriodQuery, PeriodSelector},
    category::{UNKNOWN_CATEGORY, get_category},
    database_id::{CategoryId, TransactionId},
    timezone::current_year,
    transaction::{
        NewTransaction, Transaction, TransactionSource,
        core::{create_transaction, serialize_date},
    },
};

/// The state needed for the transaction routes.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A transaction with the name and icon of its category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The category's display name.
    pub category_name: String,
    /// The category's icon token.
    pub category_icon: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned.
    pub amount: Amount,
    /// Whether money was spent or earned.
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl TransactionView {
    fn new(transaction: Transaction, category: Option<&Category>) -> Self {
        let (category_name, category_icon) = match category {
            Some(category) => (category.name.clone(), category.icon.clone()),
            None => (UNKNOWN_CATEGORY.to_owned(), String::new()),
        };

        Self {
            id: transaction.id,
            date: transaction.date,
            category_id: transaction.category_id,
            category_name,
            category_icon,
            description: transaction.description,
            amount: transaction.amount,
            kind: transaction.kind,
        }
    }
}

/// The query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    /// Only list transactions in this category.
    pub category_id: Option<String>,
    /// Only list transactions of this type.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The period to list transactions for.
    #[serde(flatten)]
    pub period: PeriodQuery,
}

/// A route handler for listing the user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Value>, Error> {
    let category_id = query
        .category_id
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            raw.parse::<CategoryId>().map_err(|_| {
                Error::Validation(format!("category_id must be an integer, got \"{raw}\""))
            })
        })
        .transpose()?;
    let kind = query
        .kind
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(TransactionType::from_str)
        .transpose()?;
    let selector = PeriodSelector::parse(&query.period, current_year(&state.local_timezone)?)?;

    let (transactions, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            connection.snapshot(user_id, &selector.date_filter())?,
            connection.category_lookup()?,
        )
    };

    let transactions: Vec<TransactionView> = transactions
        .into_iter()
        .filter(|transaction| category_id.is_none_or(|id| transaction.category_id == id))
        .filter(|transaction| kind.is_none_or(|kind| transaction.kind == kind))
        .map(|transaction| {
            let category = categories.get(&transaction.category_id);
            TransactionView::new(transaction, category)
        })
        .collect();

    Ok(Json(json!({ "transactions": transactions })))
}

/// The data sent to create a transaction.
///
/// `category_id` and `amount` may be sent as JSON numbers or strings.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionForm {
    /// The date in the format `YYYY-MM-DD`.
    pub date: Option<String>,
    /// The ID of an existing category.
    pub category_id: Option<Value>,
    /// What the transaction was for.
    pub description: Option<String>,
    /// A positive amount with at most two decimal places.
    ///
    /// Kept as raw JSON so that numbers are read from their exact text.
    pub amount: Option<Box<RawValue>>,
    /// `expense` or `revenue`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A route handler for creating a transaction owned by the user.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let (Some(date), Some(category_id), Some(description), Some(amount), Some(kind)) = (
        form.date,
        form.category_id,
        form.description,
        form.amount,
        form.kind,
    ) else {
        return Err(Error::Validation("All fields are required".to_owned()));
    };

    let kind = TransactionType::from_str(&kind)?;
    let date = parse_date(&date)?;
    let category_id = parse_category_id(&category_id)?;
    let amount = parse_amount(&amount)?;

    let description = description.trim();
    if description.is_empty() {
        return Err(Error::Validation("Description must not be empty".to_owned()));
    }

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = match get_category(category_id, &connection) {
        Ok(category) => category,
        Err(Error::NotFound) => {
            return Err(Error::Validation(format!(
                "Category {category_id} does not exist"
            )));
        }
        Err(error) => return Err(error),
    };

    let transaction = create_transaction(
        NewTransaction {
            user_id,
            date,
            category_id,
            description: description.to_owned(),
            amount,
            kind,
        },
        &connection,
    )?;

    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Transaction created successfully",
            "transaction": TransactionView::new(transaction, Some(&category)),
        })),
    ))
}

fn parse_date(raw: &str) -> Result<Date, Error> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        Error::Validation(format!(
            "date must be a valid date in the format YYYY-MM-DD, got \"{raw}\""
        ))
    })
}

fn number_or_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(string) => Some(string.trim().to_owned()),
        _ => None,
    }
}

fn parse_category_id(raw: &Value) -> Result<CategoryId, Error> {
    number_or_string(raw)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| Error::Validation(format!("category_id must be an integer, got {raw}")))
}

fn parse_amount(raw: &RawValue) -> Result<Amount, Error> {
    let amount = Amount::from_json(raw)?;

    if !amount.is_positive() {
        return Err(Error::Validation(format!(
            "amount must be greater than zero, got {amount}"
        )));
    }

    Ok(amount)
}
