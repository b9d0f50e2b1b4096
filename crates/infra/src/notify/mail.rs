use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid mail address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build mail: {0}")]
    Build(String),

    #[error("mail delivery failed: {0}")]
    Delivery(String),

    #[error("mail transport is not configured")]
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: MailAttachment,
}

/// Delivers a single mail with one attachment.
pub trait MailTransport: Send + Sync {
    fn send(&self, mail: OutgoingMail) -> Result<(), TransportError>;
}

impl<T> MailTransport for std::sync::Arc<T>
where
    T: MailTransport + ?Sized,
{
    fn send(&self, mail: OutgoingMail) -> Result<(), TransportError> {
        (**self).send(mail)
    }
}

/// SMTP relay settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

/// Blocking SMTP delivery through an authenticated relay (STARTTLS/TLS via rustls).
#[derive(Clone)]
pub struct SmtpMailTransport {
    mailer: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self, TransportError> {
        let from = parse_mailbox(&settings.from)?;
        let creds = Credentials::new(settings.username.clone(), settings.password.clone());

        let mailer = SmtpTransport::relay(&settings.host)
            .map_err(|e| TransportError::Build(e.to_string()))?
            .credentials(creds)
            .port(settings.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %settings.host, port = settings.port, "SMTP mail transport initialized");

        Ok(Self { mailer, from })
    }
}

impl MailTransport for SmtpMailTransport {
    fn send(&self, mail: OutgoingMail) -> Result<(), TransportError> {
        let message = build_message(self.from.clone(), mail)?;
        self.mailer
            .send(&message)
            .map(|_| ())
            .map_err(|e| TransportError::Delivery(e.to_string()))
    }
}

/// Stand-in used when no SMTP relay is configured; every send fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredMailTransport;

impl MailTransport for UnconfiguredMailTransport {
    fn send(&self, mail: OutgoingMail) -> Result<(), TransportError> {
        tracing::warn!(to = %mail.to, subject = %mail.subject, "mail dropped: no transport configured");
        Err(TransportError::NotConfigured)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| TransportError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

fn build_message(from: Mailbox, mail: OutgoingMail) -> Result<Message, TransportError> {
    let to = parse_mailbox(&mail.to)?;
    let content_type = ContentType::parse(&mail.attachment.content_type)
        .map_err(|e| TransportError::Build(format!("attachment content type: {e}")))?;

    let attachment = Attachment::new(mail.attachment.filename).body(mail.attachment.bytes, content_type);

    Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(mail.body))
                .singlepart(attachment),
        )
        .map_err(|e| TransportError::Build(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(to: &str) -> OutgoingMail {
        OutgoingMail {
            to: to.to_string(),
            subject: "Invoice #700001".to_string(),
            body: "Please find attached the invoice for your recent purchase.".to_string(),
            attachment: MailAttachment {
                filename: "Invoice_700001.txt".to_string(),
                content_type: "text/plain; charset=utf-8".to_string(),
                bytes: b"INVOICE #700001".to_vec(),
            },
        }
    }

    #[test]
    fn builds_multipart_message_with_attachment() {
        let from = parse_mailbox("billing@example.com").unwrap();
        let message = build_message(from, mail("alice@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Invoice #700001"));
        assert!(raw.contains("To: alice@example.com"));
        assert!(raw.contains("Invoice_700001.txt"));
        assert!(raw.contains("multipart/mixed"));
    }

    #[test]
    fn invalid_recipient_is_a_transport_error() {
        let from = parse_mailbox("billing@example.com").unwrap();
        let err = build_message(from, mail("not an address")).unwrap_err();
        assert!(matches!(err, TransportError::InvalidAddress { .. }));
    }

    #[test]
    fn unconfigured_transport_always_fails() {
        let err = UnconfiguredMailTransport.send(mail("alice@example.com")).unwrap_err();
        assert_eq!(err, TransportError::NotConfigured);
    }
}
