//! Authentication middleware that validates bearer tokens and resolves them to a user.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejectionReason,
};
use jsonwebtoken::DecodingKey;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{AppState, Error, UserID, auth::token::verify_token, get_user_by_id};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key used to verify token signatures.
    pub decoding_key: DecodingKey,
    /// The database connection used to check that the token's user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.token_keys.decoding_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The user ID is placed into the request extensions and the request executed
/// normally if the token is valid, otherwise a 401 JSON response with the
/// reason is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let user_id = match authenticate(&mut parts, &state).await {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::info!(
                "Rejected request to {} {}: {error}",
                parts.method,
                parts.uri.path()
            );
            return error.into_response();
        }
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

async fn authenticate(parts: &mut Parts, state: &AuthState) -> Result<UserID, Error> {
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| match rejection.reason() {
                TypedHeaderRejectionReason::Missing => Error::AuthMissing,
                _ => Error::AuthInvalid,
            })?;

    let claims = verify_token(bearer.token(), &state.decoding_key, OffsetDateTime::now_utc())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(claims.user_id, &connection) {
        Ok(user) => Ok(user.id),
        Err(Error::NotFound) => Err(Error::AuthUserNotFound),
        Err(error) => Err(error),
    }
}
