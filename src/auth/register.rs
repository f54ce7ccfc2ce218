//! Handles requests to register a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Amount, AppState, Error, PasswordHash, ValidatedPassword,
    user::{NewUser, Profile, create_user},
};

/// The state needed for registering users.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost used to hash new passwords.
    pub password_hash_cost: u32,
    /// The database connection for inserting users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data sent to the registration endpoint.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// The name to log in with.
    #[serde(default)]
    pub username: String,
    /// The user's email address.
    #[serde(default)]
    pub email: String,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: String,
    /// The user's age in years.
    pub age: Option<i64>,
    /// What the user does for a living.
    pub occupation: Option<String>,
    /// The user's household situation.
    pub family_situation: Option<String>,
    /// How much the user aims to spend at most each month.
    pub monthly_spending_threshold: Option<Amount>,
    /// What the user is saving towards.
    pub financial_goal: Option<String>,
}

impl RegisterRequest {
    fn profile(&self) -> Profile {
        Profile {
            age: self.age,
            occupation: self.occupation.clone(),
            family_situation: self.family_situation.clone(),
            monthly_spending_threshold: self.monthly_spending_threshold,
            financial_goal: self.financial_goal.clone(),
        }
    }
}

/// Register a new user.
///
/// # Errors
///
/// This function will return an error if:
/// - the username, email or password is empty ([Error::Validation]),
/// - the password is too weak ([Error::TooWeak]),
/// - the username or email is already registered,
/// - the password could not be hashed or the user could not be stored.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let username = request.username.trim();
    let email = request.email.trim();

    if username.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(Error::Validation(
            "Username, email and password are required".to_owned(),
        ));
    }

    let password = ValidatedPassword::new(&request.password, &[username, email])?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_user(
        NewUser {
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash,
            profile: request.profile(),
        },
        &connection,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully" })),
    ))
}
