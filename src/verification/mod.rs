//! Email verification of newly registered accounts.
//!
//! 1. [`send_verification_email`] saves the submitted user as inactive, builds
//!    a link of the form `<site>/verification/user/verify-email/<email>/<token>/`
//!    (both segments URL-safe base64) and mails it. If anything fails after the
//!    user row exists, the row is deleted again.
//! 2. [`verify_user`] decodes the two segments, checks the token against the
//!    stored user and, on success, marks the account active and stamps
//!    `last_login`. The token is bound to the user's state, so the same link
//!    does not validate twice.

mod activation;
mod link;
mod sender;

use crate::error::VerificationError;
use crate::settings::{Settings, VerificationSettings};
use crate::store::UserStore;
use crate::types::RegistrationForm;
use crate::utils::{Mailer, Templates, TokenGenerator};

pub use link::VERIFY_EMAIL_PATH;

/// Everything the verification flow needs, built once at startup.
pub struct EmailVerification<S: UserStore, M: Mailer> {
    settings: VerificationSettings,
    site_origin: String,
    debug: bool,
    tokens: TokenGenerator,
    templates: Templates,
    store: S,
    mailer: M,
}

impl<S: UserStore, M: Mailer> EmailVerification<S, M> {
    pub fn new(
        settings: &Settings,
        templates: Templates,
        store: S,
        mailer: M,
    ) -> Result<Self, VerificationError> {
        Ok(Self {
            settings: settings.verification.clone(),
            site_origin: settings.application.site_origin(),
            debug: settings.debug,
            tokens: TokenGenerator::new(&settings.secret)?,
            templates,
            store,
            mailer,
        })
    }

    pub fn settings(&self) -> &VerificationSettings {
        &self.settings
    }

    /// When set, HTTP handlers expose error details to the client.
    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Registers the user from `form` as inactive and emails the verification link.
pub async fn send_verification_email<S: UserStore, M: Mailer>(
    verification: &EmailVerification<S, M>,
    form: &RegistrationForm,
) -> Result<(), VerificationError> {
    verification.send_verification_link(form).await
}

/// Activates the user behind an encoded email/token pair. Any failure,
/// including an unknown email, yields `false`.
pub async fn verify_user<S: UserStore, M: Mailer>(
    verification: &EmailVerification<S, M>,
    useremail: &str,
    usertoken: &str,
) -> bool {
    verification.verify_token(useremail, usertoken).await
}
