//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Amount, Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Optional details a user may give about themselves when registering.
///
/// These are stored as given and echoed back when the user logs in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// The user's age in years.
    pub age: Option<i64>,
    /// What the user does for a living.
    pub occupation: Option<String>,
    /// Free text describing the user's household, e.g. "married, two kids".
    pub family_situation: Option<String>,
    /// How much the user aims to spend at most each month.
    pub monthly_spending_threshold: Option<Amount>,
    /// What the user is saving towards.
    pub financial_goal: Option<String>,
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's unique email address.
    pub email: String,
    /// The user's password hash.
    #[serde(skip)]
    pub password_hash: PasswordHash,
    /// The optional profile details.
    #[serde(flatten)]
    pub profile: Profile,
}

/// The data needed to insert a user with [create_user].
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's unique email address.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The optional profile details.
    pub profile: Profile,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                age INTEGER,
                occupation TEXT,
                family_situation TEXT,
                monthly_spending_threshold INTEGER,
                financial_goal TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateUsername] or [Error::DuplicateEmail] if the username or
///   email is already registered,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let profile = &new_user.profile;

    connection.execute(
        "INSERT INTO user (username, email, password, age, occupation, family_situation,
            monthly_spending_threshold, financial_goal)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            &new_user.username,
            &new_user.email,
            new_user.password_hash.to_string(),
            profile.age,
            &profile.occupation,
            &profile.family_situation,
            profile.monthly_spending_threshold,
            &profile.financial_goal,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());
    tracing::info!("Created user {} with ID {id}", new_user.username);

    Ok(User {
        id,
        username: new_user.username,
        email: new_user.email,
        password_hash: new_user.password_hash,
        profile: new_user.profile,
    })
}

const SELECT_USER: &str = "SELECT id, username, email, password, age, occupation,
    family_situation, monthly_spending_threshold, financial_goal FROM user";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        profile: Profile {
            age: row.get(4)?,
            occupation: row.get(5)?,
            family_situation: row.get(6)?,
            monthly_spending_threshold: row.get(7)?,
            financial_goal: row.get(8)?,
        },
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with the username `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered user ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE username = :username"))?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(|error| error.into())
}

#[cfg(test)]
pub(crate) fn create_test_user(username: &str, connection: &Connection) -> User {
    create_user(
        NewUser {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            profile: Profile::default(),
        },
        connection,
    )
    .expect("Could not create test user")
}
