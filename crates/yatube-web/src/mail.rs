//! Outgoing mail.
//!
//! [`Mailer`] builds every message the same way and hands it to one of three
//! transports: SMTP, the log (no SMTP host configured) or an in-memory
//! [`Outbox`] that tests can inspect.

use std::sync::{Arc, Mutex};

use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::MailConfig;

pub const SIGNUP_SUBJECT: &str = "Yatube registration confirmation";
pub const SIGNUP_BODY: &str = "You are registered!";

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid address: {0}")]
  Address(#[from] lettre::address::AddressError),
  #[error("failed to build message: {0}")]
  Message(#[from] lettre::error::Error),
  #[error("smtp: {0}")]
  Smtp(#[from] lettre::transport::smtp::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A delivered message as recorded by the in-memory transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
  pub from:    String,
  pub to:      String,
  pub subject: String,
  pub body:    String,
}

/// Messages captured by [`Mailer::in_memory`].
#[derive(Debug, Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<SentMail>>>);

impl Outbox {
  pub fn messages(&self) -> Vec<SentMail> {
    self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }

  fn push(&self, mail: SentMail) {
    self.0.lock().unwrap_or_else(|e| e.into_inner()).push(mail);
  }
}

enum Transport {
  Smtp(AsyncSmtpTransport<Tokio1Executor>),
  Log,
  Memory(Outbox),
}

pub struct Mailer {
  from:      Mailbox,
  transport: Transport,
}

impl Mailer {
  /// SMTP when `smtp_host` is set, otherwise log-only.
  pub fn from_config(config: &MailConfig) -> Result<Self> {
    let from = config.from.parse::<Mailbox>()?;

    let transport = if config.smtp_host.trim().is_empty() {
      warn!("SMTP host not configured; outgoing mail will only be logged");
      Transport::Log
    } else {
      let builder = if config.starttls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
      } else {
        AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
      }
      .port(config.smtp_port);

      let builder = match (&config.smtp_username, &config.smtp_password) {
        (Some(username), Some(password)) => {
          builder.credentials(Credentials::new(username.clone(), password.clone()))
        }
        _ => builder,
      };
      Transport::Smtp(builder.build())
    };

    Ok(Self { from, transport })
  }

  /// A mailer that keeps every message in the returned [`Outbox`].
  pub fn in_memory(from: &str) -> Result<(Self, Outbox)> {
    let outbox = Outbox::default();
    let mailer = Self {
      from:      from.parse()?,
      transport: Transport::Memory(outbox.clone()),
    };
    Ok((mailer, outbox))
  }

  pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
    let message = Message::builder()
      .from(self.from.clone())
      .to(to.parse::<Mailbox>()?)
      .subject(subject)
      .header(ContentType::TEXT_PLAIN)
      .body(body.to_string())?;

    match &self.transport {
      Transport::Smtp(transport) => {
        transport.send(message).await?;
        info!(to, subject, "mail sent");
      }
      Transport::Log => {
        info!(to, subject, body, "mail delivery disabled; message logged");
      }
      Transport::Memory(outbox) => outbox.push(SentMail {
        from:    self.from.to_string(),
        to:      to.to_string(),
        subject: subject.to_string(),
        body:    body.to_string(),
      }),
    }
    Ok(())
  }

  /// The confirmation sent to every new account.
  pub async fn send_signup_confirmation(&self, to: &str) -> Result<()> {
    self.send(to, SIGNUP_SUBJECT, SIGNUP_BODY).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn memory_transport_records_messages() {
    let (mailer, outbox) = Mailer::in_memory("Yatube.ru <admin@yatube.ru>").unwrap();
    mailer.send_signup_confirmation("leo@example.com").await.unwrap();

    let sent = outbox.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "leo@example.com");
    assert_eq!(sent[0].subject, SIGNUP_SUBJECT);
    assert_eq!(sent[0].body, SIGNUP_BODY);
    assert!(sent[0].from.contains("admin@yatube.ru"));
  }

  #[tokio::test]
  async fn bad_recipient_is_an_error() {
    let (mailer, outbox) = Mailer::in_memory("admin@yatube.ru").unwrap();
    let err = mailer.send("not an address", "s", "b").await.unwrap_err();
    assert!(matches!(err, Error::Address(_)));
    assert!(outbox.messages().is_empty());
  }

  #[test]
  fn empty_host_selects_log_transport() {
    let mailer = Mailer::from_config(&MailConfig::default()).unwrap();
    assert!(matches!(mailer.transport, Transport::Log));
  }

  #[test]
  fn bad_sender_is_rejected() {
    let config = MailConfig { from: "nobody".into(), ..MailConfig::default() };
    assert!(matches!(Mailer::from_config(&config), Err(Error::Address(_))));
  }
}
