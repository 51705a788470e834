use std::time::Duration;

use anyhow::Context;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::SmtpSettings,
    notifier::{Email, Mailer},
};

/// Sends mail through an SMTP relay (for example the SES SMTP interface)
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    const TIMEOUT: Duration = Duration::from_secs(30);
    const IMPLICIT_TLS_PORT: u16 = 465;

    pub fn new(settings: &SmtpSettings) -> anyhow::Result<Self> {
        let builder = if settings.port == Self::IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .with_context(|| format!("Invalid SMTP relay host: {}", settings.host))?;

        let mut builder = builder.port(settings.port).timeout(Some(Self::TIMEOUT));

        match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }
            (None, None) => {}
            _ => tracing::warn!("Only one of SMTP_USERNAME / SMTP_PASSWORD is set; sending unauthenticated"),
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    pub(crate) fn build_message(email: &Email) -> anyhow::Result<Message> {
        let sender = email
            .sender
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid sender address: {}", email.sender))?;

        let mut builder = Message::builder().from(sender).subject(email.subject.as_str());
        for recipient in &email.recipients {
            let mailbox = recipient
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid recipient address: {recipient}"))?;
            builder = builder.to(mailbox);
        }

        builder
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())
            .context("Failed to build email message")
    }
}

impl Mailer for SmtpMailer {
    #[tracing::instrument(skip_all, fields(subject = %email.subject, recipients = email.recipients.len()))]
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        let message = Self::build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to send email"))
            .context("Failed to send email")?;

        tracing::info!(code = %response.code(), "Email sent");
        Ok(())
    }
}
