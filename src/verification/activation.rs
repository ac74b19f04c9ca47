use chrono::Utc;
use crate::store::UserStore;
use crate::types::User;
use crate::utils::{decode_to_string, Mailer};
use crate::verification::EmailVerification;

impl<S: UserStore, M: Mailer> EmailVerification<S, M> {
    #[tracing::instrument(name = "Verifying email token", skip(self, useremail, usertoken))]
    pub(crate) async fn verify_token(&self, useremail: &str, usertoken: &str) -> bool {
        let (email, token) = match (decode_to_string(useremail), decode_to_string(usertoken)) {
            (Ok(email), Ok(token)) => (email, token),
            (Err(e), _) | (_, Err(e)) => {
                tracing::event!(target: "verify_email", tracing::Level::INFO, "Malformed verification link: {}", e);
                return false;
            }
        };

        // An unknown address is a failed verification, not an error.
        let mut inactive_user = match self.store.find_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::event!(target: "verify_email", tracing::Level::INFO, "No user registered with the verified email");
                return false;
            }
            Err(e) => {
                tracing::event!(target: "verify_email", tracing::Level::ERROR, "User lookup failed: {}", e);
                return false;
            }
        };

        if !self.tokens.check_token(&inactive_user, &token) {
            tracing::event!(target: "verify_email", tracing::Level::INFO,
                "Invalid or used verification token for user {}", inactive_user.id);
            return false;
        }

        self.activate_user(&mut inactive_user).await
    }

    /// Flips the account to active. Only the request that wins the
    /// conditional update reports success, so concurrent submissions of the
    /// same link activate the account once.
    async fn activate_user(&self, user: &mut User) -> bool {
        user.is_active = true;
        user.last_login = Some(Utc::now());

        match self.store.activate(user).await {
            Ok(true) => {
                tracing::event!(target: "verify_email", tracing::Level::INFO, "User {} was activated successfully", user.id);
                true
            }
            Ok(false) => {
                tracing::event!(target: "verify_email", tracing::Level::INFO, "User {} was already activated", user.id);
                false
            }
            Err(e) => {
                tracing::event!(target: "verify_email", tracing::Level::ERROR, "Cannot activate user {}: {}", user.id, e);
                false
            }
        }
    }
}
