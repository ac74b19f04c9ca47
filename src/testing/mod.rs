//! In-memory collaborators and fixtures for the verification tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use chrono::Utc;
use uuid::Uuid;
use crate::settings::{
    ApplicationSettings, DatabaseSettings, EmailSettings, Secret, Settings, VerificationSettings,
};
use crate::store::{StoreError, UserStore};
use crate::types::{NewUser, RegistrationForm, User};
use crate::utils::{MailError, Mailer, OutgoingEmail, Templates};
use crate::verification::{EmailVerification, VERIFY_EMAIL_PATH};

pub type TestVerification = EmailVerification<InMemoryUserStore, RecordingMailer>;

pub fn test_secret() -> Secret {
    Secret {
        secret_key: "0123456789abcdef0123456789abcdef".to_string(),
        token_expiration: 60,
        hmac_secret: "test-hmac-secret".to_string(),
    }
}

pub fn test_settings() -> Settings {
    let database: DatabaseSettings = serde_json::from_value(serde_json::json!({
        "username": "postgres",
        "password": "password",
        "port": 5432,
        "host": "localhost",
        "database_name": "verify_email_test",
        "require_ssl": false,
    }))
    .expect("database settings");

    Settings {
        application: ApplicationSettings {
            port: 0,
            host: "127.0.0.1".to_string(),
            base_url: "testserver".to_string(),
            protocol: "http".to_string(),
        },
        debug: false,
        database,
        secret: test_secret(),
        email: EmailSettings {
            host: "localhost".to_string(),
            host_user: "user".to_string(),
            host_user_password: "password".to_string(),
        },
        verification: VerificationSettings {
            success_template: Some("verify_email/email_verification_successful.html".to_string()),
            failed_template: Some("verify_email/email_verification_failed.html".to_string()),
            html_message_template: Some("verify_email/email_verification_msg.html".to_string()),
            ..Default::default()
        },
    }
}

pub fn verification(store: InMemoryUserStore, mailer: RecordingMailer) -> TestVerification {
    verification_with(&test_settings(), store, mailer)
}

pub fn verification_with(
    settings: &Settings,
    store: InMemoryUserStore,
    mailer: RecordingMailer,
) -> TestVerification {
    EmailVerification::new(settings, Templates::from_directory("templates"), store, mailer)
        .expect("verification context")
}

pub fn registration_form(email: &str) -> RegistrationForm {
    [("email", email), ("password", "correct horse battery")]
        .into_iter()
        .collect()
}

pub fn inactive_user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password: Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string()),
        first_name: None,
        last_name: None,
        is_active: false,
        last_login: None,
        date_joined: Utc::now(),
    }
}

/// Splits the first verification link found in `text` into its encoded
/// email and token segments.
pub fn link_segments(text: &str) -> (String, String) {
    let start = text.find(VERIFY_EMAIL_PATH).expect("verification link") + VERIFY_EMAIL_PATH.len();
    let rest = text[start..].trim_start_matches('/');
    let end = rest.find(|c: char| c == '"' || c == '<' || c.is_whitespace()).unwrap_or(rest.len());
    let mut segments = rest[..end].split('/');
    let useremail = segments.next().expect("email segment").to_string();
    let usertoken = segments.next().expect("token segment").to_string();
    (useremail, usertoken)
}

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
    lookups_fail: Arc<AtomicBool>,
    updates_fail: Arc<AtomicBool>,
}

impl InMemoryUserStore {
    /// `find_by_email` and `ping` fail from now on.
    pub fn fail_lookups(&self) {
        self.lookups_fail.store(true, Ordering::SeqCst);
    }

    /// `activate` and `delete` fail from now on. Inserts still succeed.
    pub fn fail_updates(&self) {
        self.updates_fail.store(true, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn get_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().unwrap().is_empty()
    }
}

impl UserStore for InMemoryUserStore {
    async fn create_inactive(&self, new_user: &NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|user| user.email == new_user.email) {
            return Err(StoreError::AlreadyExists);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            password: new_user.password.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            is_active: false,
            last_login: None,
            date_joined: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Self::check(&self.lookups_fail)?;
        Ok(self.get_by_email(email))
    }

    async fn activate(&self, user: &User) -> Result<bool, StoreError> {
        Self::check(&self.updates_fail)?;
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user.id) {
            Some(stored) if !stored.is_active => {
                stored.is_active = true;
                stored.last_login = user.last_login;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        Self::check(&self.updates_fail)?;
        self.users.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Self::check(&self.lookups_fail)
    }
}

/// Records every message instead of sending it, or fails every send.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    failure: Option<MailError>,
}

impl RecordingMailer {
    pub fn failing(error: MailError) -> Self {
        Self {
            failure: Some(error),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}
