use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
};
use log::*;
use widget_payment_engine::traits::{EmailError, EmailSender, OutgoingEmail};
use wpg_common::helpers::mask_email;

use crate::{config::MailConfig, errors::ServerError};

/// Sends transactional e-mail over SMTP with STARTTLS. When mail is disabled in the configuration, messages are
/// written to the log instead.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.transport {
            Some(_) => write!(f, "SmtpMailer(smtp)"),
            None => write!(f, "SmtpMailer(log only)"),
        }
    }
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, ServerError> {
        if config.disabled {
            return Ok(Self::log_only());
        }
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| ServerError::ConfigurationError(format!("Invalid SMTP relay {}. {e}", config.smtp_host)))?
            .port(config.smtp_port);
        if let Some(username) = &config.username {
            builder = builder.credentials(Credentials::new(username.clone(), config.password.reveal().clone()));
        }
        info!("📧️ Sending mail through {}:{}", config.smtp_host, config.smtp_port);
        Ok(Self { transport: Some(builder.build()) })
    }

    pub fn log_only() -> Self {
        Self { transport: None }
    }
}

impl EmailSender for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let Some(transport) = &self.transport else {
            info!("📧️ Mail is disabled. '{}' for {}:\n{}", email.subject, mask_email(&email.to), redacted_body(&email));
            debug!("📧️ Unredacted body of '{}':\n{}", email.subject, render_body(&email));
            return Ok(());
        };
        let message = build_message(&email)?;
        transport.send(message).await.map_err(|e| EmailError::DeliveryError(e.to_string()))?;
        debug!("📧️ Sent '{}' ({}) to {}", email.subject, email.template, mask_email(&email.to));
        Ok(())
    }
}

fn build_message(email: &OutgoingEmail) -> Result<Message, EmailError> {
    let from = email.from.parse().map_err(|_| EmailError::InvalidAddress(email.from.clone()))?;
    let to = email.to.parse().map_err(|_| EmailError::InvalidAddress(email.to.clone()))?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(render_body(email))
        .map_err(|e| EmailError::MessageError(e.to_string()))
}

/// A plain-text body listing the template's data, one `key: value` pair per line.
pub fn render_body(email: &OutgoingEmail) -> String {
    body_with(email, |_, value| value)
}

/// Like [`render_body`], but signed links are left out.
fn redacted_body(email: &OutgoingEmail) -> String {
    body_with(email, |key, value| if key == "link" { "[redacted]" } else { value })
}

fn body_with<'a>(email: &'a OutgoingEmail, show: impl Fn(&str, &'a str) -> &'a str) -> String {
    let mut body = format!("{}\n\n", email.subject);
    for (key, value) in &email.data {
        body.push_str(&format!("{}: {}\n", key.replace('_', " "), show(key, value)));
    }
    body
}
