//! Signed, time-limited bearer tokens.
//!
//! Tokens are HS256 JSON Web Tokens carrying the user ID and an expiry time.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID};

/// How long a token is valid for after it is issued.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(7);

/// The contents of a token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// When the token was issued, as a Unix timestamp.
    pub iat: i64,
    /// When the token expires, as a Unix timestamp.
    pub exp: i64,
}

/// The key pair used to sign and verify tokens, derived from one shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    /// Signs new tokens.
    pub encoding_key: EncodingKey,
    /// Verifies token signatures.
    pub decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Create the key pair from a `secret` string.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Sign a token for `user_id` that expires `duration` after `issued_at`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn issue_token(
    user_id: UserID,
    issued_at: OffsetDateTime,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let claims = Claims {
        user_id,
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + duration).unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Check a token at time `now` and return its claims.
///
/// Expiry is checked before the signature, so an expired token is reported as
/// expired whether or not its signature is valid.
///
/// # Errors
///
/// Returns:
/// - [Error::AuthExpired] if the token expired at or before `now`,
/// - [Error::AuthInvalid] if the token is malformed or its signature does not match.
pub fn verify_token(
    token: &str,
    decoding_key: &DecodingKey,
    now: OffsetDateTime,
) -> Result<Claims, Error> {
    let mut unverified = Validation::new(Algorithm::HS256);
    unverified.insecure_disable_signature_validation();
    unverified.validate_exp = false;

    let claims = decode::<Claims>(token, decoding_key, &unverified)
        .inspect_err(|error| tracing::debug!("could not parse token: {error}"))
        .map_err(|_| Error::AuthInvalid)?
        .claims;

    if claims.exp <= now.unix_timestamp() {
        return Err(Error::AuthExpired);
    }

    // Expiry was checked against `now` above.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    decode::<Claims>(token, decoding_key, &validation)
        .map(|token_data| token_data.claims)
        .inspect_err(|error| tracing::debug!("could not verify token: {error}"))
        .map_err(|_| Error::AuthInvalid)
}
