use std::env::{current_dir, var};
use config::{Config, File};
use serde::Deserialize;
use sqlx::ConnectOptions;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgSslMode::{Prefer, Require};
use crate::error::VerificationError;

/// Global settings exposing every preconfigured variable of the service.
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub debug: bool,
    pub database: DatabaseSettings,
    pub secret: Secret,
    pub email: EmailSettings,
    #[serde(default)]
    pub verification: VerificationSettings,
}

/// Application-level settings: `port`, `host`, `protocol` and the public
/// address the verification links point at.
#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    pub base_url: String,
    pub protocol: String,
}

impl ApplicationSettings {
    /// Origin prepended to every verification link.
    pub fn site_origin(&self) -> String {
        format!("{}://{}", self.protocol, self.base_url.trim_end_matches('/'))
    }
}

/// Database settings for the whole application
#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    username: String,
    password: String,
    port: u16,
    host: String,
    database_name: String,
    require_ssl: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Secret {
    pub secret_key: String,
    pub token_expiration: i64,
    pub hmac_secret: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct EmailSettings {
    pub host: String,
    pub host_user: String,
    pub host_user_password: String,
}

/// Options of the verification flow. Unset keys fall back to the defaults
/// returned by [`VerificationSettings::get`].
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct VerificationSettings {
    pub success_redirect: Option<String>,
    pub failed_redirect: Option<String>,
    pub success_msg: Option<String>,
    pub failed_msg: Option<String>,
    pub success_template: Option<String>,
    pub failed_template: Option<String>,
    pub subject: Option<String>,
    pub email_field_name: Option<String>,
    pub from_alias: Option<String>,
    pub html_message_template: Option<String>,
}

/// Named options understood by [`VerificationSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    SuccessRedirect,
    FailedRedirect,
    SuccessMsg,
    FailedMsg,
    SuccessTemplate,
    FailedTemplate,
    Subject,
    EmailFieldName,
    FromAlias,
    HtmlMessageTemplate,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::SuccessRedirect => "success_redirect",
            SettingKey::FailedRedirect => "failed_redirect",
            SettingKey::SuccessMsg => "success_msg",
            SettingKey::FailedMsg => "failed_msg",
            SettingKey::SuccessTemplate => "success_template",
            SettingKey::FailedTemplate => "failed_template",
            SettingKey::Subject => "subject",
            SettingKey::EmailFieldName => "email_field_name",
            SettingKey::FromAlias => "from_alias",
            SettingKey::HtmlMessageTemplate => "html_message_template",
        }
    }

    fn default_value(&self) -> Option<&'static str> {
        match self {
            SettingKey::SuccessMsg => Some(
                "Your Email is verified successfully and account has been activated. \
                You can login with the credentials now...",
            ),
            SettingKey::FailedMsg => {
                Some("There is something wrong with this link, unable to verify the user...")
            }
            SettingKey::Subject => Some("Email Verification Mail"),
            SettingKey::EmailFieldName => Some("email"),
            SettingKey::FromAlias => Some("noreply <noreply@example.com>"),
            _ => None,
        }
    }
}

impl VerificationSettings {
    /// Returns the configured value for `key`, or its default.
    pub fn get(&self, key: SettingKey) -> Option<&str> {
        let configured = match key {
            SettingKey::SuccessRedirect => &self.success_redirect,
            SettingKey::FailedRedirect => &self.failed_redirect,
            SettingKey::SuccessMsg => &self.success_msg,
            SettingKey::FailedMsg => &self.failed_msg,
            SettingKey::SuccessTemplate => &self.success_template,
            SettingKey::FailedTemplate => &self.failed_template,
            SettingKey::Subject => &self.subject,
            SettingKey::EmailFieldName => &self.email_field_name,
            SettingKey::FromAlias => &self.from_alias,
            SettingKey::HtmlMessageTemplate => &self.html_message_template,
        };
        configured
            .as_deref()
            .filter(|value| !value.is_empty())
            .or_else(|| key.default_value())
    }

    /// Like [`get`](Self::get), but a missing value is a configuration error.
    pub fn require(&self, key: SettingKey) -> Result<&str, VerificationError> {
        self.get(key).ok_or_else(|| {
            VerificationError::Configuration(format!(
                "`verification.{}` must be set in the settings",
                key.as_str()
            ))
        })
    }
}

impl DatabaseSettings {
    pub fn connect_to_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl { Require } else { Prefer };
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .port(self.port)
            .ssl_mode(ssl_mode)
            .database(&self.database_name);
        options.log_statements(tracing::log::LevelFilter::Trace);
        options
    }
}

/// Runtime environment of the application.
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `development` or `production`.",
                other
            )),
        }
    }
}

/// Detects the running environment through the `APP_ENVIRONMENT` variable.
///
/// ```text
/// APP_ENVIRONMENT = development | production.
/// ```
///
/// The matching `.yaml` file is layered over `settings/base.yaml`, then
/// environment variables override anything from the files.
/// Variables MUST be upper case and start with `APP`, followed by the `_`
/// separator, the settings category, the `__` separator and the field,
/// e.g. `APP_APPLICATION__PORT=5001` sets the port to `5001`.
pub fn get_settings() -> Result<Settings, config::ConfigError> {
    let base_path = current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let setting_directory = base_path.join("settings");

    // Defaults to `development` when nothing is set.
    let environment: Environment = var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = Config::builder()
        .add_source(File::from(setting_directory.join("base.yaml")))
        .add_source(File::from(setting_directory.join(environment_filename)))
        // `APP_APPLICATION__PORT=5001` sets `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
