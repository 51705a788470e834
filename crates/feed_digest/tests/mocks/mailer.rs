use std::sync::{Arc, Mutex};

use feed_digest::notifier::{Email, Mailer};

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<Email>>>,
    pub fail_with: Option<String>,
}

impl MockMailer {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl Mailer for MockMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
