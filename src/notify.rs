//! Admin email sent after each block.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{EmailConfig, SmtpSecurity};
use crate::dispatch::BlockOutcome;
use crate::error::BotError;
use crate::mention::Mention;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("SMTP transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &AdminEmail) -> Result<(), MailError>;
}

pub fn compose(
    email: &EmailConfig,
    profile_base_url: &str,
    mention: &Mention,
    outcome: &BlockOutcome,
) -> AdminEmail {
    let profile_base = profile_base_url.trim_end_matches('/');
    let handle = &outcome.handle;

    let body = format!(
        "Your block bot just blocked @{handle} (rule: {label}) for the following tweet:\n\
         {text}\n\
         \n\
         User:  {profile_base}/{handle}\n\
         Tweet: {profile_base}/{handle}/status/{id}\n",
        label = outcome.label,
        text = mention.text,
        id = mention.id,
    );

    AdminEmail {
        from: email.from_address.clone(),
        to: email.admin_address.clone(),
        subject: format!("[BlockBot] Blocked @{handle}"),
        body,
    }
}

pub struct Notifier<'a> {
    mailer: &'a dyn Mailer,
    email: &'a EmailConfig,
    profile_base_url: &'a str,
}

impl<'a> Notifier<'a> {
    pub fn new(mailer: &'a dyn Mailer, email: &'a EmailConfig, profile_base_url: &'a str) -> Self {
        Notifier {
            mailer,
            email,
            profile_base_url,
        }
    }

    pub async fn notify(&self, mention: &Mention, outcome: &BlockOutcome) -> Result<AdminEmail, BotError> {
        let message = compose(self.email, self.profile_base_url, mention, outcome);
        log::debug!(
            "Admin email:\nFrom: {}\nTo: {}\nSubject: {}\n\n{}",
            message.from,
            message.to,
            message.subject,
            message.body
        );

        self.mailer
            .send(&message)
            .await
            .map_err(|source| BotError::Mail {
                handle: outcome.handle.clone(),
                source,
            })?;

        log::info!("Emailed {} about @{}", message.to, outcome.handle);
        Ok(message)
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, MailError> {
        let tls = match config.security {
            SmtpSecurity::None => Tls::None,
            SmtpSecurity::Starttls => Tls::Required(tls_parameters(config)?),
            SmtpSecurity::Tls => Tls::Wrapper(tls_parameters(config)?),
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
            .port(config.port)
            .tls(tls)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(SmtpMailer { transport })
    }
}

fn tls_parameters(config: &EmailConfig) -> Result<TlsParameters, MailError> {
    TlsParameters::builder(config.server.clone())
        .dangerous_accept_invalid_certs(config.accept_invalid_certs)
        .build_rustls()
        .map_err(|e| MailError::Transport(e.to_string()))
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|e| MailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &AdminEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(mailbox(&email.from)?)
            .to(mailbox(&email.to)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeMailer {
        pub sent: Mutex<Vec<AdminEmail>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, email: &AdminEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Transport("connection refused".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }
}
