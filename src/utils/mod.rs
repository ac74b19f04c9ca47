mod auth;
mod emails;
mod encoding;
mod templates;

pub use auth::password::hash;

pub use auth::tokens::TokenGenerator;

pub use emails::{strip_tags, MailError, Mailer, OutgoingEmail, SmtpMailer};

pub use encoding::{decode, decode_to_string, encode};

pub use templates::Templates;
