//! Email service for late loan notifications

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

/// Outgoing mail collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send one message to every recipient
    async fn send_mails(&self, recipients: &[String], subject: &str, body: &str) -> AppResult<()>;
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, recipients: &[String], subject: &str, body: &str) -> AppResult<Message> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Library");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Email(format!("Invalid from address: {}", e)))?;

        // Recipients go in Bcc
        let mut builder = Message::builder()
            .from(from_mailbox.clone())
            .to(from_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in recipients {
            let mailbox = Mailbox::from_str(recipient)
                .map_err(|e| AppError::Email(format!("Invalid to address {}: {}", recipient, e)))?;
            builder = builder.bcc(mailbox);
        }

        builder
            .body(body.to_string())
            .map_err(|e| AppError::Email(format!("Failed to build email: {}", e)))
    }

    fn transport(&self) -> AppResult<SmtpTransport> {
        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Email(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        Ok(mailer_builder.build())
    }
}

#[async_trait]
impl EmailSender for EmailService {
    async fn send_mails(&self, recipients: &[String], subject: &str, body: &str) -> AppResult<()> {
        let email = self.build_message(recipients, subject, body)?;
        let mailer = self.transport()?;

        // SmtpTransport blocks on network I/O
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Email(format!("Failed to send email: {}", e)))?;

        tracing::info!("Sent \"{}\" to {} recipient(s)", subject, recipients.len());
        Ok(())
    }
}
