//! CLASSTRACK Auth — password authentication, JWT issuance and
//! validation, institute registration, and the subscription gate.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, RegisterInput, RegisterOutput};
pub use token::AccessTokenClaims;
