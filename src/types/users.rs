use std::collections::HashMap;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

/// Row data for an account that has not been confirmed yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Argon2 PHC string, never the plain password.
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Submitted registration form. The field carrying the email address is
/// looked up by the configured `email_field_name`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct RegistrationForm {
    fields: HashMap<String, String>,
}

impl RegistrationForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn password(&self) -> Option<&str> {
        self.fields.get("password").map(String::as_str).filter(|p| !p.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RegistrationForm {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
