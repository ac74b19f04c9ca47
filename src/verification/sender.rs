use minijinja::{context, Value};
use crate::error::VerificationError;
use crate::settings::SettingKey;
use crate::store::UserStore;
use crate::types::{NewUser, RegistrationForm, User};
use crate::utils::{hash, strip_tags, Mailer, OutgoingEmail};
use crate::verification::link::build_link;
use crate::verification::EmailVerification;

impl<S: UserStore, M: Mailer> EmailVerification<S, M> {
    /// Saves the form as an inactive user and mails the verification link.
    ///
    /// Once the user row exists, any failure deletes it before the error is
    /// returned, so no unconfirmable account is left behind.
    #[tracing::instrument(name = "Sending verification link", skip(self, form))]
    pub(crate) async fn send_verification_link(
        &self,
        form: &RegistrationForm,
    ) -> Result<(), VerificationError> {
        let email_field_name = self.settings.require(SettingKey::EmailFieldName)?;
        let useremail = form
            .field(email_field_name)
            .ok_or_else(|| {
                VerificationError::Configuration(format!(
                    "No field named `{}` in the registration form. Name the email field `{}` \
                    or set `verification.email_field_name` to the field carrying the email address.",
                    email_field_name, email_field_name
                ))
            })?
            .to_string();

        let password = match form.password() {
            Some(password) => Some(hash(password.as_bytes()).await?),
            None => None,
        };
        let new_user = NewUser {
            email: useremail.clone(),
            password,
            first_name: form.field("first_name").map(str::to_string),
            last_name: form.field("last_name").map(str::to_string),
        };

        let inactive_user = self.store.create_inactive(&new_user).await?;
        tracing::event!(target: "verify_email", tracing::Level::INFO, "Inactive user {} created", inactive_user.id);

        match self.dispatch_verification_email(&inactive_user, &useremail).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::event!(target: "verify_email", tracing::Level::ERROR,
                    "Verification email for user {} failed: {}", inactive_user.id, e);
                self.discard_inactive_user(&inactive_user).await;
                Err(e)
            }
        }
    }

    async fn dispatch_verification_email(
        &self,
        inactive_user: &User,
        useremail: &str,
    ) -> Result<(), VerificationError> {
        let verification_url = build_link(&self.site_origin, &self.tokens, inactive_user, useremail)?;

        let template = self.settings.require(SettingKey::HtmlMessageTemplate)?;
        let html = self.templates.render(template, context! { link => Value::from_safe_string(verification_url) })?;

        let email = OutgoingEmail {
            from: self.settings.require(SettingKey::FromAlias)?.to_string(),
            to: useremail.to_string(),
            subject: self.settings.require(SettingKey::Subject)?.to_string(),
            text: strip_tags(&html),
            html,
        };
        self.mailer.send(email).await?;
        Ok(())
    }

    async fn discard_inactive_user(&self, inactive_user: &User) {
        match self.store.delete(inactive_user.id).await {
            Ok(()) => {
                tracing::event!(target: "verify_email", tracing::Level::WARN,
                    "Deleted user {} after failed verification email", inactive_user.id);
            }
            Err(e) => {
                tracing::event!(target: "verify_email", tracing::Level::ERROR,
                    "Could not delete user {}, it stays inactive: {}", inactive_user.id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::VerificationError;
    use crate::store::StoreError;
    use crate::testing::{
        registration_form, test_settings, verification, verification_with, InMemoryUserStore,
        RecordingMailer,
    };
    use crate::types::RegistrationForm;
    use crate::utils::MailError;

    #[tokio::test]
    async fn form_fields_are_stored_with_a_hashed_password() {
        let store = InMemoryUserStore::default();
        let verification = verification(store.clone(), RecordingMailer::default());
        let form: RegistrationForm = [
            ("email", "a@b.com"),
            ("password", "s3cret-pass"),
            ("first_name", "Ada"),
            ("last_name", "Lovelace"),
        ]
        .into_iter()
        .collect();

        verification.send_verification_link(&form).await.unwrap();

        let user = store.get_by_email("a@b.com").unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.last_name.as_deref(), Some("Lovelace"));
        assert!(user.password.unwrap().starts_with("$argon2"));
    }

    #[tokio::test]
    async fn configured_email_field_name_is_used() {
        let store = InMemoryUserStore::default();
        let mailer = RecordingMailer::default();
        let mut settings = test_settings();
        settings.verification.email_field_name = Some("user_email".to_string());
        let verification = verification_with(&settings, store.clone(), mailer.clone());

        let form: RegistrationForm = [("user_email", "a@b.com")].into_iter().collect();
        verification.send_verification_link(&form).await.unwrap();

        assert!(store.get_by_email("a@b.com").is_some());
        assert_eq!(mailer.sent()[0].to, "a@b.com");
    }

    #[tokio::test]
    async fn missing_email_field_is_a_configuration_error() {
        let store = InMemoryUserStore::default();
        let mailer = RecordingMailer::default();
        let verification = verification(store.clone(), mailer.clone());

        let form: RegistrationForm = [("username", "ada")].into_iter().collect();
        let result = verification.send_verification_link(&form).await;

        assert!(matches!(result, Err(VerificationError::Configuration(_))));
        assert!(store.is_empty());
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_template_deletes_the_user() {
        let store = InMemoryUserStore::default();
        let mailer = RecordingMailer::default();
        let mut settings = test_settings();
        settings.verification.html_message_template =
            Some("verify_email/does_not_exist.html".to_string());
        let verification = verification_with(&settings, store.clone(), mailer.clone());

        let result = verification
            .send_verification_link(&registration_form("a@b.com"))
            .await;

        assert!(matches!(result, Err(VerificationError::Template(_))));
        assert!(store.is_empty());
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn unset_template_setting_deletes_the_user() {
        let store = InMemoryUserStore::default();
        let mut settings = test_settings();
        settings.verification.html_message_template = None;
        let verification = verification_with(&settings, store.clone(), RecordingMailer::default());

        let result = verification
            .send_verification_link(&registration_form("a@b.com"))
            .await;

        assert!(matches!(result, Err(VerificationError::Configuration(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn bad_header_deletes_the_user() {
        let store = InMemoryUserStore::default();
        let mailer = RecordingMailer::failing(MailError::BadHeader("newline in subject".to_string()));
        let verification = verification(store.clone(), mailer);

        let result = verification
            .send_verification_link(&registration_form("a@b.com"))
            .await;

        assert!(matches!(result, Err(VerificationError::Transport(MailError::BadHeader(_)))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_keeps_the_existing_user() {
        let store = InMemoryUserStore::default();
        let mailer = RecordingMailer::default();
        let verification = verification(store.clone(), mailer.clone());

        verification
            .send_verification_link(&registration_form("a@b.com"))
            .await
            .unwrap();
        let result = verification
            .send_verification_link(&registration_form("a@b.com"))
            .await;

        assert!(matches!(result, Err(VerificationError::Store(StoreError::AlreadyExists))));
        assert!(store.get_by_email("a@b.com").is_some());
        assert_eq!(mailer.sent().len(), 1);
    }
}
