//! Authentication error types.

use classtrack_core::error::ClasstrackError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email is already registered")]
    EmailTaken,

    #[error("institute subscription has expired")]
    SubscriptionExpired,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for ClasstrackError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => ClasstrackError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::EmailTaken => ClasstrackError::AlreadyExists {
                entity: "user".into(),
            },
            AuthError::SubscriptionExpired => ClasstrackError::SubscriptionInactive,
            AuthError::Validation(message) => ClasstrackError::Validation { message },
            AuthError::Crypto(msg) => ClasstrackError::Internal(msg),
        }
    }
}
