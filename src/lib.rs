//! Antigravity is a web server for tracking personal finances.
//!
//! Registered users record their expenses and revenues and ask the server for
//! analytics over a period: a summary of totals, expenses broken down by
//! category and a timeline of expenses and revenues.
//!
//! This library provides a JSON REST API. Every route under `/api`, apart
//! from registering and logging in, requires a bearer token issued by the log
//! in endpoint.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod amount;
mod analytics;
mod app_state;
mod auth;
mod category;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod routing;
mod timezone;
mod transaction;
mod transaction_type;
mod user;

pub use amount::Amount;
pub use analytics::{
    CategoryTotal, Charts, DateFilter, Period, PeriodQuery, PeriodSelector, Summary,
    TimelineBucket, TimelineMode, build_charts, build_summary, bucket_timeline, summarize,
    total_by_category,
};
pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use category::{Category, NewCategory, create_category};
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{NewTransaction, Transaction, TransactionSource, create_transaction};
pub use transaction_type::TransactionType;
pub use user::{NewUser, Profile, User, UserID, create_user, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not include an `Authorization` header.
    #[error("Token is missing")]
    AuthMissing,

    /// The bearer token was well-formed but its validity window has elapsed.
    #[error("Token has expired")]
    AuthExpired,

    /// The bearer token was malformed or its signature did not match.
    #[error("Invalid token")]
    AuthInvalid,

    /// The bearer token was valid but names a user that no longer exists.
    #[error("User not found")]
    AuthUserNotFound,

    /// The client sent a value that is malformed or out of range.
    ///
    /// The string should explain which value was rejected and why.
    #[error("{0}")]
    Validation(String),

    /// The username and password given at log in did not match a user.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The username is already taken by another user.
    #[error("Username already exists")]
    DuplicateUsername,

    /// The email address is already registered to another user.
    #[error("Email already exists")]
    DuplicateEmail,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A token could not be signed for a user that logged in.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Any other unexpected failure, carrying the underlying failure's message.
    #[error("{0}")]
    Internal(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 787 => {
                Error::Validation("a referenced record does not exist".to_owned())
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The machine readable reason code sent alongside the message.
    fn reason_code(&self) -> &'static str {
        match self {
            Error::AuthMissing => "auth_missing",
            Error::AuthExpired => "auth_expired",
            Error::AuthInvalid => "auth_invalid",
            Error::AuthUserNotFound => "auth_user_not_found",
            Error::Validation(_)
            | Error::DuplicateUsername
            | Error::DuplicateEmail
            | Error::TooWeak(_) => "validation_error",
            Error::InvalidCredentials => "invalid_credentials",
            Error::NotFound => "not_found",
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_)
            | Error::Internal(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::AuthMissing
            | Error::AuthExpired
            | Error::AuthInvalid
            | Error::AuthUserNotFound
            | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Validation(_)
            | Error::DuplicateUsername
            | Error::DuplicateEmail
            | Error::TooWeak(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            format!("An error occurred: {self}")
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": self.reason_code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use serde_json::{Value, json};

    use crate::Error;

    async fn into_status_and_json(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn auth_errors_are_unauthorized_with_reason_code() {
        let cases = [
            (Error::AuthMissing, "auth_missing"),
            (Error::AuthExpired, "auth_expired"),
            (Error::AuthInvalid, "auth_invalid"),
            (Error::AuthUserNotFound, "auth_user_not_found"),
        ];

        for (error, want_code) in cases {
            let (status, body) = into_status_and_json(error).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"], json!(want_code));
        }
    }

    #[tokio::test]
    async fn validation_error_is_bad_request_with_message() {
        let (status, body) =
            into_status_and_json(Error::Validation("month is out of range".to_owned())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("validation_error"));
        assert_eq!(body["message"], json!("month is out of range"));
    }

    #[tokio::test]
    async fn internal_error_carries_underlying_message() {
        let (status, body) =
            into_status_and_json(Error::Internal("disk on fire".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("internal_error"));
        assert_eq!(body["message"], json!("An error occurred: disk on fire"));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
