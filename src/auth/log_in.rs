//! Handles log in requests by checking the user's password and issuing a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{AppState, Error, User, auth::token::issue_token, user::get_user_by_username};

/// The state needed for logging in.
#[derive(Clone)]
pub struct LogInState {
    /// The key used to sign new tokens.
    pub encoding_key: EncodingKey,
    /// How long issued tokens stay valid.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            encoding_key: state.token_keys.encoding_key.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials sent to the log in endpoint.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LogInRequest {
    /// The name the user registered with.
    #[serde(default)]
    pub username: String,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: String,
}

/// A successful log in.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogInResponse<U = User> {
    /// The bearer token to send with subsequent requests.
    pub token: String,
    /// The user that logged in.
    pub user: U,
}

/// Handler for log in requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username or password is empty ([Error::Validation]).
/// - The username does not belong to a registered user or the password is wrong
///   ([Error::InvalidCredentials]).
/// - An internal error occurred when verifying the password or signing the token.
pub async fn post_log_in(
    State(state): State<LogInState>,
    Json(request): Json<LogInRequest>,
) -> Result<Json<LogInResponse>, Error> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(Error::Validation(
            "Username and password are required".to_owned(),
        ));
    }

    let user = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_username(&request.username, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_correct = user
        .password_hash
        .verify(&request.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = issue_token(
        user.id,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.encoding_key,
    )?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(LogInResponse { token, user }))
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::OffsetDateTime;

    use crate::{
        PasswordHash, ValidatedPassword,
        auth::{
            log_in::{LogInRequest, LogInResponse, LogInState, post_log_in},
            token::{DEFAULT_TOKEN_DURATION, TokenKeys, verify_token},
        },
        db::initialize,
        endpoints,
        user::{NewUser, Profile, create_user},
    };

    fn get_test_server() -> (TestServer, TokenKeys) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_user(
            NewUser {
                username: "demo".to_owned(),
                email: "demo@example.com".to_owned(),
                password_hash: PasswordHash::new(ValidatedPassword::new_unchecked("demo123"), 4)
                    .unwrap(),
                profile: Profile {
                    occupation: Some("Engineer".to_owned()),
                    ..Default::default()
                },
            },
            &connection,
        )
        .unwrap();

        let keys = TokenKeys::from_secret("foobar");
        let state = LogInState {
            encoding_key: keys.encoding_key.clone(),
            token_duration: DEFAULT_TOKEN_DURATION,
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(state);

        (
            TestServer::new(app),
            keys,
        )
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let (server, keys) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&LogInRequest {
                username: "demo".to_owned(),
                password: "demo123".to_owned(),
            })
            .await;

        response.assert_status_ok();
        let body = response.json::<LogInResponse<Value>>();
        assert_eq!(body.user["username"], json!("demo"));
        assert_eq!(body.user["occupation"], json!("Engineer"));
        let claims =
            verify_token(&body.token, &keys.decoding_key, OffsetDateTime::now_utc()).unwrap();
        assert_eq!(body.user["id"], json!(claims.user_id.as_i64()));
    }

    #[tokio::test]
    async fn issued_token_lasts_seven_days() {
        let (server, keys) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&LogInRequest {
                username: "demo".to_owned(),
                password: "demo123".to_owned(),
            })
            .await;

        let body = response.json::<LogInResponse<Value>>();
        let claims =
            verify_token(&body.token, &keys.decoding_key, OffsetDateTime::now_utc()).unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&LogInRequest {
                username: "demo".to_owned(),
                password: "definitelyNotTheCorrectPassword".to_owned(),
            })
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.json::<Value>()["error"],
            json!("invalid_credentials")
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let (server, _) = get_test_server();

        server
            .post(endpoints::LOG_IN_API)
            .json(&LogInRequest {
                username: "nobody".to_owned(),
                password: "demo123".to_owned(),
            })
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({ "username": "demo" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], json!("validation_error"));
    }
}
