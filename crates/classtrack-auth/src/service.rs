//! Authentication service — institute registration, login, and the
//! subscription gate.

use chrono::{Duration, Utc};
use classtrack_core::context::TenantContext;
use classtrack_core::error::{ClasstrackError, ClasstrackResult};
use classtrack_core::models::institute::{CreateInstitute, Institute, SubscriptionStatus};
use classtrack_core::models::user::{CreateUser, User, UserRole};
use classtrack_core::repository::{InstituteRepository, UserRepository};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// How many times institute creation retries on a code collision
/// before giving up. Collisions need two institutes to share both the
/// name-derived prefix and the random tail, so one retry is almost
/// always enough.
const CODE_RETRY_LIMIT: u32 = 3;

/// Input for institute registration.
#[derive(Debug)]
pub struct RegisterInput {
    pub institute_name: String,
    pub owner_name: String,
    pub email: String,
    pub contact_number: String,
    pub address: Option<String>,
    pub username: String,
    pub password: String,
}

/// Successful registration result.
#[derive(Debug)]
pub struct RegisterOutput {
    pub institute: Institute,
    pub owner: User,
    pub trial_days: i64,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user: User,
    pub institute: Institute,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
#[derive(Clone)]
pub struct AuthService<U: UserRepository, I: InstituteRepository> {
    user_repo: U,
    institute_repo: I,
    config: AuthConfig,
}

/// Derive an institute code: the first three letters of the name,
/// uppercased, plus a four-character random alphanumeric tail.
///
/// Uniqueness is not guaranteed here — the unique index on
/// `institute.code` is the arbiter, and `register` retries on a
/// collision.
fn derive_institute_code(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();

    let tail: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .collect::<String>()
        .to_ascii_uppercase();

    format!("{prefix}{tail}")
}

fn validate_register(input: &RegisterInput, config: &AuthConfig) -> Result<(), AuthError> {
    let len = |s: &str| s.trim().chars().count();

    if !(3..=100).contains(&len(&input.institute_name)) {
        return Err(AuthError::Validation(
            "institute name must be 3-100 characters".into(),
        ));
    }
    if !(3..=50).contains(&len(&input.owner_name)) {
        return Err(AuthError::Validation(
            "owner name must be 3-50 characters".into(),
        ));
    }
    if !(3..=20).contains(&len(&input.username)) {
        return Err(AuthError::Validation(
            "username must be 3-20 characters".into(),
        ));
    }
    if !input.email.contains('@') {
        return Err(AuthError::Validation("valid email required".into()));
    }
    if input.contact_number.len() != 10
        || !input.contact_number.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AuthError::Validation(
            "contact number must be 10 digits".into(),
        ));
    }
    if input.password.chars().count() < config.min_password_length {
        return Err(AuthError::Validation(format!(
            "password must be at least {} characters",
            config.min_password_length
        )));
    }
    Ok(())
}

impl<U: UserRepository, I: InstituteRepository> AuthService<U, I> {
    pub fn new(user_repo: U, institute_repo: I, config: AuthConfig) -> Self {
        Self {
            user_repo,
            institute_repo,
            config,
        }
    }

    /// Register a new institute together with its owner account.
    ///
    /// The institute starts on a trial subscription; the owner user is
    /// created with the [`UserRole::Owner`] role.
    pub async fn register(&self, input: RegisterInput) -> ClasstrackResult<RegisterOutput> {
        validate_register(&input, &self.config)?;

        // 1. Reject an already-registered email up front. The unique
        //    index on user.email still backstops a racing registration.
        match self.user_repo.get_by_email(&input.email).await {
            Ok(_) => return Err(AuthError::EmailTaken.into()),
            Err(ClasstrackError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        // 2. Create the institute, retrying on a code collision.
        let expiry = Utc::now() + Duration::days(self.config.trial_days);
        let mut institute = None;
        for _ in 0..CODE_RETRY_LIMIT {
            let attempt = self
                .institute_repo
                .create(CreateInstitute {
                    name: input.institute_name.trim().to_string(),
                    code: derive_institute_code(&input.institute_name),
                    address: input.address.clone().unwrap_or_default(),
                    contact_number: input.contact_number.clone(),
                    email: input.email.clone(),
                    owner_name: input.owner_name.trim().to_string(),
                    subscription_status: SubscriptionStatus::Trial,
                    subscription_expiry: expiry,
                })
                .await;
            match attempt {
                Ok(created) => {
                    institute = Some(created);
                    break;
                }
                Err(ClasstrackError::ConstraintViolation { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        let institute = institute.ok_or(ClasstrackError::AlreadyExists {
            entity: "institute".into(),
        })?;

        // 3. Create the owner account (password hashed by the repo).
        let owner = self
            .user_repo
            .create(CreateUser {
                institute_id: institute.id,
                username: input.username.trim().to_string(),
                email: input.email,
                password: input.password,
                full_name: input.owner_name.trim().to_string(),
                role: UserRole::Owner,
            })
            .await
            .map_err(|e| match e {
                // Email raced past the step-1 check.
                ClasstrackError::ConstraintViolation { .. } => AuthError::EmailTaken.into(),
                other => other,
            })?;

        Ok(RegisterOutput {
            institute,
            owner,
            trial_days: self.config.trial_days,
        })
    }

    /// Authenticate a user with email + password and issue a token.
    pub async fn login(&self, input: LoginInput) -> ClasstrackResult<LoginOutput> {
        // 1. Look up user by email.
        let user = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .map_err(|e| match e {
                ClasstrackError::NotFound { .. } => AuthError::InvalidCredentials.into(),
                other => other,
            })?;

        // 2. Verify password.
        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )
        .map_err(ClasstrackError::from)?;

        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        // 3. Check the institute subscription.
        let institute = self.institute_repo.get_by_id(user.institute_id).await?;
        if institute.subscription_status == SubscriptionStatus::Inactive {
            return Err(AuthError::SubscriptionExpired.into());
        }

        // 4. Issue JWT access token.
        let access_token = token::issue_access_token(user.id, institute.id, &self.config)?;

        Ok(LoginOutput {
            access_token,
            expires_in: self.config.access_token_lifetime_secs,
            user,
            institute,
        })
    }

    /// Verify a bearer token and resolve the tenant context for the
    /// request — the upstream gate every registrar operation sits
    /// behind.
    ///
    /// Rejects expired/invalid tokens, unknown users, and institutes
    /// whose subscription is inactive.
    pub async fn resolve_context(&self, bearer_token: &str) -> ClasstrackResult<TenantContext> {
        let claims = token::decode_access_token(bearer_token, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))?;
        let user = self.user_repo.get_by_id(user_id).await.map_err(map_stale_user)?;

        let institute = self.institute_repo.get_by_id(user.institute_id).await?;
        if institute.subscription_status == SubscriptionStatus::Inactive {
            return Err(AuthError::SubscriptionExpired.into());
        }

        Ok(TenantContext {
            institute_id: institute.id,
            institute_code: institute.code,
            institute_name: institute.name,
        })
    }
}

/// A token referencing a deleted user is an auth failure, not a 404.
fn map_stale_user(e: ClasstrackError) -> ClasstrackError {
    match e {
        ClasstrackError::NotFound { .. } => {
            AuthError::TokenInvalid("user no longer exists".into()).into()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_code_is_uppercase_alphanumeric() {
        let code = derive_institute_code("Sunrise Tutorials");
        assert!(code.starts_with("SUN"));
        assert_eq!(code.len(), 7);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(code, code.to_ascii_uppercase());
    }

    #[test]
    fn derived_code_skips_non_letters() {
        let code = derive_institute_code("3M Classes");
        assert!(code.starts_with("MCL"));
    }
}
