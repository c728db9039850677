use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Outbound mail for account flows.
///
/// Delivery is fire-and-forget for callers: a failed send is logged and
/// never undoes the token that was issued.
pub trait Mailer: Send + Sync {
    fn send_confirmation(&self, email: &str, token: &str) -> Result<(), MailError>;

    fn send_password_reset(&self, email: &str, token: &str) -> Result<(), MailError>;
}

/// Link prefixes the emailed token is appended to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailLinks {
    pub confirmation_url: String,
    pub password_reset_url: String,
}

impl Default for MailLinks {
    fn default() -> Self {
        Self {
            confirmation_url: "http://localhost:8080/confirm?token=".to_string(),
            password_reset_url: "http://localhost:8080/reset-password?token=".to_string(),
        }
    }
}

/// Writes the would-be email through `tracing` instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    links: MailLinks,
}

impl LogMailer {
    pub fn new(links: MailLinks) -> Self {
        Self { links }
    }
}

impl Mailer for LogMailer {
    fn send_confirmation(&self, email: &str, token: &str) -> Result<(), MailError> {
        let url = format!("{}{}", self.links.confirmation_url, token);
        info!(to = %email, url = %url, "confirmation mail");
        Ok(())
    }

    fn send_password_reset(&self, email: &str, token: &str) -> Result<(), MailError> {
        let url = format!("{}{}", self.links.password_reset_url, token);
        info!(to = %email, url = %url, "password reset mail");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use recording::{RecordingMailer, SentMail};


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_mailer_never_fails() {
        let m = LogMailer::default();
        assert!(m.send_confirmation("a@x.io", "t").is_ok());
        assert!(m.send_password_reset("a@x.io", "t").is_ok());
    }

    #[test]
    fn test_recording_mailer() {
        let m = RecordingMailer::default();
        m.send_confirmation("a@x.io", "c1").unwrap();
        m.send_password_reset("a@x.io", "r1").unwrap();
        assert_eq!(m.sent().len(), 2);
        assert_eq!(m.last_token().as_deref(), Some("r1"));
        assert!(RecordingMailer::failing().send_confirmation("a@x.io", "c").is_err());
    }
}
