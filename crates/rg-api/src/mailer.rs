//! Confirmation mail that only reaches the log.

use async_trait::async_trait;
use rg_core::Mailer;

pub struct LogMailer {
    public_url: String,
    sender: String,
}

impl LogMailer {
    /// `public_url` is the externally visible base of this server, `sender` the From address.
    pub fn new(public_url: &str, sender: &str) -> Self {
        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
            sender: sender.to_string(),
        }
    }

    pub fn confirmation_link(&self, token: &str) -> String {
        format!("{}/auth/confirmed_email/{}", self.public_url, token)
    }

    fn render(&self, email: &str, username: &str, token: &str) -> String {
        format!(
            "confirmation mail from {} to {} <{}>: {}",
            self.sender,
            username,
            email,
            self.confirmation_link(token)
        )
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation(&self, email: &str, username: &str, token: &str) -> anyhow::Result<()> {
        log::info!("{}", self.render(email, username, token));
        Ok(())
    }
}
