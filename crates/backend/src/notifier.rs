//! Best-effort outbound email.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;

pub const WELCOME_SUBJECT: &str = "Welcome to Our Platform!";

/// Outbound mail. `send` never fails the caller: delivery problems are
/// logged and reported as `false`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> bool;
}

/// Body of the mail sent to a user whose account was created by Google login.
pub fn welcome_body(display_name: Option<&str>, email: &str, temporary_password: &str) -> String {
    let greeting = display_name.filter(|n| !n.is_empty()).unwrap_or(email);
    format!(
        "Hello {greeting},\n\n\
         Your account has been created with Google.\n\n\
         Your temporary password is: {temporary_password}\n\n\
         Please change it after you log in.\n\n\
         Thanks,\n\
         The Team"
    )
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<Message> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> bool {
        let message = match self.build_message(to, subject, body) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!("Failed to build email to {}: {}", to, e);
                return false;
            }
        };

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::info!("Email sent to {}", to);
                true
            }
            Err(e) => {
                tracing::error!("Failed to send email to {}: {}", to, e);
                false
            }
        }
    }
}

/// Used when no mail relay is configured.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> bool {
        tracing::warn!(
            "Mail relay not configured, dropping email to {} ({:?})",
            to,
            subject
        );
        false
    }
}
