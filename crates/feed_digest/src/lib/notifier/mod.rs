pub mod smtp;

use std::future::Future;

use anyhow::Context;

/// A fully addressed HTML email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

pub trait Mailer {
    /// Sends exactly once; failures are returned, never retried
    fn send(&self, email: &Email) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: Mailer + Send + Sync> Mailer for &T {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        (**self).send(email).await
    }
}

/// Offline stand-in that prints what would have been sent
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl LogMailer {
    const PREVIEW_CHARS: usize = 500;
}

impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        let preview = email
            .html_body
            .chars()
            .take(Self::PREVIEW_CHARS)
            .collect::<String>();

        tracing::info!(
            to = ?email.recipients,
            subject = %email.subject,
            body_preview = %preview,
            "[log-only mailer] would send email"
        );
        Ok(())
    }
}

/// Splits a comma separated recipient list, trimming entries and dropping empty ones
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect()
}

/// Builds digest emails with a fixed sender, recipient list and subject prefix
#[derive(Debug, Clone)]
pub struct EmailComposer {
    sender: Option<String>,
    recipients: Vec<String>,
    subject_prefix: String,
    link_label: String,
}

impl Default for EmailComposer {
    fn default() -> Self {
        Self {
            sender: None,
            recipients: Vec::new(),
            subject_prefix: "Summary".into(),
            link_label: "Open".into(),
        }
    }
}

impl EmailComposer {
    pub fn new(
        sender: Option<String>,
        recipients: Option<&str>,
        subject_prefix: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.filter(|s| !s.trim().is_empty()),
            recipients: recipients.map(parse_recipients).unwrap_or_default(),
            subject_prefix: subject_prefix.into(),
            ..Default::default()
        }
    }

    pub fn with_link_label(mut self, label: impl Into<String>) -> Self {
        self.link_label = label.into();
        self
    }

    pub fn subject(&self, title: &str) -> String {
        format!("{}: {}", self.subject_prefix, title)
    }

    /// Heading, optional link, rule, then the summary body
    pub fn render_body(&self, title: &str, link: Option<&str>, summary_html: &str) -> String {
        let mut body = format!("<h2>{}</h2>", escape_html(title));
        if let Some(link) = link {
            body.push_str(&format!(
                "<p><a href='{}'>{}</a></p>",
                escape_html(link),
                escape_html(&self.link_label)
            ));
        }
        body.push_str("<hr>");
        body.push_str(summary_html);
        body
    }

    pub fn compose(
        &self,
        title: &str,
        link: Option<&str>,
        summary_html: &str,
    ) -> anyhow::Result<Email> {
        let sender = self.sender.clone().context("SENDER_EMAIL not set")?;
        if self.recipients.is_empty() {
            anyhow::bail!("RECIPIENT_EMAIL not set or empty");
        }

        Ok(Email {
            sender,
            recipients: self.recipients.clone(),
            subject: self.subject(title),
            html_body: self.render_body(title, link, summary_html),
        })
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
