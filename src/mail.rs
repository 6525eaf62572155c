use async_trait::async_trait;
use lettre::message::header::ContentType;
use std::time::Duration;

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Mail {
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
}

impl Mail {
    pub fn verification_code(username: &str, email: &str, code: &str, ttl: Duration) -> Self {
        let lifetime = describe_ttl(ttl);
        let html_body = format!(
            r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif">
    <p>Hi {username},</p>
    <p>Welcome to MyGram!</p>
    <p>Here is your approval code. This code expires in {lifetime}</p>
    <p style="font-size: 24px; font-weight: bold; color: #22BC66">{code}</p>
  </body>
</html>"#
        );

        Self {
            to_name: username.to_string(),
            to_email: email.to_string(),
            subject: "Verify your MyGram email".to_string(),
            html_body,
        }
    }
}

fn describe_ttl(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_string(),
        (minutes, 0) if minutes > 0 => format!("{} minutes", minutes),
        (0, 1) => "1 second".to_string(),
        _ => format!("{} seconds", secs),
    }
}

/// Recipient mailbox built from typed parts so lettre quotes the display
/// name. Usernames may contain `,` `@` or parentheses.
fn recipient(mail: &Mail) -> Result<Mailbox, AppError> {
    let address = mail
        .to_email
        .parse::<Address>()
        .map_err(|e| AppError::MailDelivery(format!("bad recipient {}: {}", mail.to_email, e)))?;

    Ok(Mailbox::new(Some(mail.to_name.clone()), address))
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), AppError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, cfg: &MailConfig) -> Result<Self, AppError> {
        let from = cfg
            .from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid MAIL_FROM: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP_HOST: {}", e)))?
            .port(cfg.smtp_port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: Mail) -> Result<(), AppError> {
        let to = recipient(&mail)?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body)
            .map_err(|e| AppError::MailDelivery(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::MailDelivery(e.to_string()))?;

        tracing::info!(to = %mail.to_email, "verification mail sent");
        Ok(())
    }
}

/// Development fallback when no SMTP relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), AppError> {
        tracing::warn!(
            to = %mail.to_email,
            subject = %mail.subject,
            "SMTP not configured, mail body follows:\n{}",
            mail.html_body
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_for(username: &str) -> Mail {
        Mail::verification_code(username, "a@x.com", "4821", Duration::from_secs(300))
    }

    #[test]
    fn test_verification_mail_contains_code() {
        let mail = mail_for("alice");
        assert_eq!(mail.to_email, "a@x.com");
        assert!(mail.html_body.contains("4821"));
        assert!(mail.html_body.contains("alice"));
        assert!(mail.html_body.contains("5 minutes"));
    }

    #[test]
    fn test_mail_text_follows_code_ttl() {
        let mail = Mail::verification_code("alice", "a@x.com", "4821", Duration::from_secs(600));
        assert!(mail.html_body.contains("expires in 10 minutes"));

        assert_eq!(describe_ttl(Duration::from_secs(60)), "1 minute");
        assert_eq!(describe_ttl(Duration::from_secs(90)), "90 seconds");
        assert_eq!(describe_ttl(Duration::from_secs(45)), "45 seconds");
    }

    #[test]
    fn test_recipient_accepts_any_username() {
        for name in ["alice", "john.doe", "Zoë", "bob, jr", "x@y", "(cool)", "say \"hi\""] {
            let mailbox = recipient(&mail_for(name)).unwrap();
            assert_eq!(mailbox.name.as_deref(), Some(name));
            assert_eq!(mailbox.email.to_string(), "a@x.com");

            let message = Message::builder()
                .from("MyGram <noreply@x.com>".parse::<Mailbox>().unwrap())
                .to(mailbox)
                .subject("verify")
                .body("body".to_string());
            assert!(message.is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_recipient_rejects_bad_address() {
        let mail = Mail::verification_code("alice", "not-an-address", "4821", Duration::from_secs(300));
        assert!(matches!(recipient(&mail), Err(AppError::MailDelivery(_))));
    }
}
