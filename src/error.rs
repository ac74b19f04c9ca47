use thiserror::Error;
use crate::store::StoreError;
use crate::utils::MailError;

/// Everything that can stop a verification email from going out or a
/// verification link from being checked.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// A required setting, form field or template name is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("mail transport error: {0}")]
    Transport(#[from] MailError),

    #[error("user store error: {0}")]
    Store(#[from] StoreError),

    #[error("token error: {0}")]
    Token(String),

    #[error("malformed encoded value: {0}")]
    Decode(String),

    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl From<pasetors::errors::Error> for VerificationError {
    fn from(e: pasetors::errors::Error) -> Self {
        VerificationError::Token(e.to_string())
    }
}
