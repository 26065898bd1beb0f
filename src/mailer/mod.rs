//! Outbound email collaborator for the password-reset flow.
//!
//! The credential core issues reset tokens; this module delivers them. The
//! [`ResetMailer`] trait is the seam the presentation layer wires against,
//! with [`SmtpMailer`] as the production implementation.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

pub mod templates;

/// Email delivery errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// Transport credentials are missing
    #[error("Email transport not configured: {0}")]
    NotConfigured(String),

    /// Sender or recipient address failed to parse
    #[error("Invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),

    /// Message could not be assembled
    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    /// SMTP transport failure
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// SMTP transport configuration.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,

    /// From address; falls back to the SMTP username when empty.
    pub from_email: String,
    pub from_name: String,

    /// Base URL reset links point at.
    pub app_url: String,

    /// Token lifetime quoted in the email body.
    pub token_expiry_minutes: i64,
}

impl MailerConfig {
    /// Load transport settings from the environment.
    ///
    /// - `SMTP_HOST` (default `smtp.gmail.com`), `SMTP_PORT` (default 587)
    /// - `SMTP_USERNAME`, `SMTP_PASSWORD` (app password for Gmail)
    /// - `SMTP_FROM_EMAIL`, `SMTP_FROM_NAME` (default `ClassTrack`)
    /// - `APP_URL` — base link target
    /// - `TOKEN_EXPIRY_MINUTES` (default 30) — quoted in the message only
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self {
            smtp_host: var("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            smtp_username: var("SMTP_USERNAME", ""),
            smtp_password: var("SMTP_PASSWORD", ""),
            from_email: var("SMTP_FROM_EMAIL", ""),
            from_name: var("SMTP_FROM_NAME", "ClassTrack"),
            app_url: var("APP_URL", ""),
            token_expiry_minutes: std::env::var("TOKEN_EXPIRY_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Whether the transport has credentials to authenticate with.
    pub fn is_configured(&self) -> bool {
        !self.smtp_username.is_empty() && !self.smtp_password.is_empty()
    }
}

/// Delivery capability consumed by the reset flow.
///
/// Implementations report delivery truthfully; it is the presentation
/// layer's responsibility to show end users a generic "check your email"
/// outcome regardless, so the reset flow never discloses whether an address
/// has an account.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    /// Deliver a reset token to `to`, addressed to `display_name`.
    async fn send_reset_email(
        &self,
        to: &str,
        token: &str,
        display_name: &str,
    ) -> Result<(), MailError>;
}

/// Production mailer: authenticated SMTP relay over STARTTLS.
pub struct SmtpMailer {
    config: MailerConfig,
}

impl SmtpMailer {
    pub fn new(config: MailerConfig) -> Self {
        Self { config }
    }

    fn from_mailbox(&self) -> Result<Mailbox, MailError> {
        let address = if self.config.from_email.is_empty() {
            &self.config.smtp_username
        } else {
            &self.config.from_email
        };
        Ok(format!("{} <{}>", self.config.from_name, address).parse()?)
    }
}

#[async_trait]
impl ResetMailer for SmtpMailer {
    async fn send_reset_email(
        &self,
        to: &str,
        token: &str,
        display_name: &str,
    ) -> Result<(), MailError> {
        if !self.config.is_configured() {
            return Err(MailError::NotConfigured(
                "SMTP_USERNAME and SMTP_PASSWORD must be set".to_string(),
            ));
        }

        let reset_link = templates::reset_link(&self.config.app_url, token);
        let (html, plain) =
            templates::reset_email(&reset_link, display_name, self.config.token_expiry_minutes);

        let message = Message::builder()
            .from(self.from_mailbox()?)
            .to(to.parse()?)
            .subject(templates::RESET_SUBJECT)
            .multipart(MultiPart::alternative_plain_html(plain, html))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(
            &self.config.smtp_host,
        )?
        .credentials(Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        ))
        .port(self.config.smtp_port)
        .build();

        transport.send(message).await?;
        log::info!("password reset email sent to {to}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn bare_config() -> MailerConfig {
        MailerConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: String::new(),
            from_name: "ClassTrack".to_string(),
            app_url: "https://classtrack.example.com".to_string(),
            token_expiry_minutes: 30,
        }
    }

    #[test]
    fn unconfigured_transport_is_detected() {
        let config = bare_config();
        assert!(!config.is_configured());

        let configured = MailerConfig {
            smtp_username: "mailer@example.com".to_string(),
            smtp_password: "app-password".to_string(),
            ..bare_config()
        };
        assert!(configured.is_configured());
    }

    #[tokio::test]
    async fn sending_without_credentials_fails_fast() {
        let mailer = SmtpMailer::new(bare_config());
        let err = mailer
            .send_reset_email("alice@example.com", "tok", "Alice A")
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::NotConfigured(_)));
    }

    #[test]
    fn from_mailbox_falls_back_to_the_smtp_username() {
        let mailer = SmtpMailer::new(MailerConfig {
            smtp_username: "relay@example.com".to_string(),
            smtp_password: "secret".to_string(),
            ..bare_config()
        });
        let mailbox = mailer.from_mailbox().unwrap();
        assert_eq!(mailbox.email.to_string(), "relay@example.com");
    }

    #[test]
    #[serial]
    fn config_reads_environment_defaults() {
        unsafe {
            std::env::remove_var("SMTP_HOST");
            std::env::remove_var("SMTP_PORT");
            std::env::remove_var("SMTP_FROM_NAME");
        }
        let config = MailerConfig::from_env();
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.from_name, "ClassTrack");
    }
}
