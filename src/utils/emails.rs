use std::future::Future;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use crate::settings::EmailSettings;

#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// Sender, recipient or headers could not form a valid message.
    #[error("invalid message header: {0}")]
    BadHeader(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// A multipart message: `text` and `html` carry the same content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub trait Mailer: Send + Sync + 'static {
    fn send(&self, email: OutgoingEmail) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// SMTP relay transport configured from [`EmailSettings`].
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &EmailSettings) -> Result<Self, MailError> {
        let credentials = Credentials::new(
            settings.host_user.clone(),
            settings.host_user_password.clone(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| MailError::Smtp(e.to_string()))?
            .credentials(credentials)
            .build();

        Ok(Self { transport })
    }
}

impl Mailer for SmtpMailer {
    #[tracing::instrument(name = "Sending verification email", skip(self, email),
    fields(recipient_email = %email.to))]
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| MailError::BadHeader(format!("sender `{}`: {}", email.from, e)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| MailError::BadHeader(format!("recipient `{}`: {}", email.to, e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .map_err(|e| MailError::BadHeader(e.to_string()))?;

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::event!(target: "verify_email", tracing::Level::INFO, "Email successfully sent!");
                Ok(())
            }
            Err(e) => {
                tracing::event!(target: "verify_email", tracing::Level::ERROR, "Could not send email: {:#?}", e);
                Err(MailError::Smtp(e.to_string()))
            }
        }
    }
}

/// Plain-text alternative of an HTML body: drops markup, keeps text.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}
