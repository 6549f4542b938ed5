//! Authentication configuration.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256 JWT signing and verification.
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Access token lifetime in seconds (default: 604_800 = 7 days).
    pub access_token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id
    /// verification. Must match the pepper used at hashing time.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Trial subscription length in days for newly registered
    /// institutes.
    pub trial_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "classtrack".into(),
            access_token_lifetime_secs: 604_800,
            pepper: None,
            min_password_length: 6,
            trial_days: 30,
        }
    }
}

impl AuthConfig {
    /// Build a config from the environment. `CLASSTRACK_JWT_SECRET` is
    /// mandatory; everything else falls back to the defaults.
    pub fn from_env() -> Result<Self, crate::error::AuthError> {
        let jwt_secret = std::env::var("CLASSTRACK_JWT_SECRET").map_err(|_| {
            crate::error::AuthError::Crypto("CLASSTRACK_JWT_SECRET is not set".into())
        })?;
        Ok(Self {
            jwt_secret,
            pepper: std::env::var("CLASSTRACK_PASSWORD_PEPPER").ok(),
            ..Self::default()
        })
    }
}
