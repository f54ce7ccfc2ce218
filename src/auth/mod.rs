//! Registration, log in and bearer token authentication.

mod log_in;
mod middleware;
mod password;
mod register;
pub(crate) mod token;

pub use log_in::post_log_in;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register::register_user;
pub use token::{DEFAULT_TOKEN_DURATION, TokenKeys};
