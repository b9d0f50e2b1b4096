//! Outbound document collaborators: invoice rendering and mail delivery.

pub mod mail;
pub mod render;

pub use mail::{
    MailAttachment, MailTransport, OutgoingMail, SmtpMailTransport, SmtpSettings, TransportError,
    UnconfiguredMailTransport,
};
pub use render::{InvoiceRenderer, RenderError, RenderedDocument, TextInvoiceRenderer};
