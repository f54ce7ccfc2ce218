//! This file defines the `Category` type, the category table and the API routes for categories.
//! Categories are shared by all users, e.g. 'Grocery', 'Transport', 'Salary'.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{AppState, Error, TransactionType, database_id::CategoryId};

/// The name shown for a category ID that does not match any stored category.
pub(crate) const UNKNOWN_CATEGORY: &str = "Unknown";

/// A category for expenses or revenues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// The id of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
    /// Whether the category is meant for expenses or revenues.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// A short token naming the icon to display next to the category.
    pub icon: String,
}

/// The data needed to insert a category with [create_category].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    /// The display name of the category.
    pub name: String,
    /// Whether the category is meant for expenses or revenues.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// A short token naming the icon to display next to the category.
    pub icon: String,
}

/// Create the category table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('expense', 'revenue')),
                icon TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Insert a new category into the database.
///
/// # Errors
///
/// Returns an [Error::SqlError] if an SQL related error occurred.
pub fn create_category(category: NewCategory, connection: &Connection) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, type, icon) VALUES (?1, ?2, ?3)",
        (&category.name, category.kind, &category.icon),
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        name: category.name,
        kind: category.kind,
        icon: category.icon,
    })
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        icon: row.get(3)?,
    })
}

/// Get the category with the ID `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such category, or [Error::SqlError]
/// if an SQL related error occurred.
pub fn get_category(id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, type, icon FROM category WHERE id = :id")?
        .query_row(&[(":id", &id)], map_category_row)
        .map_err(|error| error.into())
}

/// Get all categories ordered by ID, optionally only those of type `kind`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if an SQL related error occurred.
pub fn get_categories(
    kind: Option<TransactionType>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let mut statement = connection.prepare(
        "SELECT id, name, type, icon FROM category
            WHERE ?1 IS NULL OR type = ?1
            ORDER BY id",
    )?;

    statement
        .query_map((kind,), map_category_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// The state needed for the category routes.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// Only list categories of this type.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// The data sent to create a category.
///
/// Fields are kept as strings so that missing or unknown values produce a
/// validation error rather than a generic rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryForm {
    /// The display name.
    #[serde(default)]
    pub name: String,
    /// `expense` or `revenue`.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// The icon token.
    #[serde(default)]
    pub icon: String,
}

/// A route handler for listing categories, optionally filtered by `?type=`.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Value>, Error> {
    let kind = query
        .kind
        .as_deref()
        .filter(|kind| !kind.is_empty())
        .map(str::parse::<TransactionType>)
        .transpose()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories(kind, &connection)?;

    Ok(Json(json!({ "categories": categories })))
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let name = form.name.trim();

    if name.is_empty() || form.kind.is_empty() || form.icon.is_empty() {
        return Err(Error::Validation(
            "Name, type, and icon are required".to_owned(),
        ));
    }

    let kind = form.kind.parse()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(
        NewCategory {
            name: name.to_owned(),
            kind,
            icon: form.icon,
        },
        &connection,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Category created successfully",
            "category": category,
        })),
    ))
}

#[cfg(test)]
pub(crate) fn create_test_category(
    name: &str,
    kind: TransactionType,
    connection: &Connection,
) -> Category {
    create_category(
        NewCategory {
            name: name.to_owned(),
            kind,
            icon: name.to_lowercase(),
        },
        connection,
    )
    .expect("Could not create test category")
}


#[cfg(test)]
mod category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        TransactionType,
        category::{
            CategoryState, create_category_endpoint, create_test_category,
            get_categories_endpoint,
        },
        db::initialize,
        endpoints,
    };

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_test_category("Grocery", TransactionType::Expense, &connection);
        create_test_category("Salary", TransactionType::Revenue, &connection);

        let state = CategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(
                endpoints::CATEGORIES_API,
                get(get_categories_endpoint).post(create_category_endpoint),
            )
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn lists_categories_of_requested_type() {
        let server = get_test_server();

        let response = server
            .get(endpoints::CATEGORIES_API)
            .add_query_param("type", "revenue")
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "categories": [
                { "id": 2, "name": "Salary", "type": "revenue", "icon": "salary" }
            ]
        }));
    }

    #[tokio::test]
    async fn listing_with_unknown_type_is_rejected() {
        let server = get_test_server();

        server
            .get(endpoints::CATEGORIES_API)
            .add_query_param("type", "gift")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn creates_category() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CATEGORIES_API)
            .json(&json!({ "name": "Health", "type": "expense", "icon": "heart" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(
            response.json::<Value>()["category"],
            json!({ "id": 3, "name": "Health", "type": "expense", "icon": "heart" })
        );
    }

    #[tokio::test]
    async fn create_category_fails_with_missing_icon() {
        let server = get_test_server();

        server
            .post(endpoints::CATEGORIES_API)
            .json(&json!({ "name": "Health", "type": "expense" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_category_fails_with_unknown_type() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CATEGORIES_API)
            .json(&json!({ "name": "Gifts", "type": "gift", "icon": "gift" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["message"],
            json!("Type must be either expense or revenue")
        );
    }
}
