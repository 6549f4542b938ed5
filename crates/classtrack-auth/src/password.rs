//! Argon2id password verification for the login flow.
//!
//! Hashing happens in the user repository at account creation; here we
//! only check a login attempt against the stored PHC-format hash. An
//! optional pepper is prepended before verification and must match the
//! one used at hash time.

use std::borrow::Cow;

use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

fn peppered<'a>(password: &'a str, pepper: Option<&str>) -> Cow<'a, [u8]> {
    match pepper {
        Some(p) => Cow::Owned(format!("{p}{password}").into_bytes()),
        None => Cow::Borrowed(password.as_bytes()),
    }
}

/// Check `password` against a stored Argon2id hash.
///
/// `Ok(false)` means a plain mismatch; `Err(AuthError::Crypto)` means
/// the stored hash itself is unusable.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let parsed = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("stored hash is not valid PHC: {e}")))?;

    match Argon2::default().verify_password(&peppered(password, pepper), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("password verification: {e}"))),
    }
}
