//! Configuration loading and representation.
//!
//! Everything comes from `BILLING_*` environment variables. Missing values fall back
//! to development defaults; values that are present but malformed are errors.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use billing_core::allocator::DEFAULT_MAX_ATTEMPTS;
use billing_customers::SecretString;

use crate::notify::{MailTransport, SmtpMailTransport, SmtpSettings, TransportError, UnconfiguredMailTransport};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SMTP_PORT: u16 = 587;
const DEV_DEFAULT_CUSTOMER_PASSWORD: &str = "your-default-password";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid {expected}: '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub bind_addr: SocketAddr,
    /// Password given to customers registered without one.
    pub default_customer_password: SecretString,
    /// `None` unless host, username, password and sender are all set.
    pub smtp: Option<SmtpSettings>,
    pub id_max_attempts: u32,
}

impl BillingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests, alternative sources).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("BILLING_BIND_ADDR") {
            Some(raw) => parse("BILLING_BIND_ADDR", "socket address", raw)?,
            None => parse("BILLING_BIND_ADDR", "socket address", DEFAULT_BIND_ADDR.to_string())?,
        };

        let default_customer_password = match get("BILLING_DEFAULT_CUSTOMER_PASSWORD") {
            Some(raw) => SecretString::new(raw),
            None => {
                tracing::warn!("BILLING_DEFAULT_CUSTOMER_PASSWORD not set; using insecure dev default");
                SecretString::new(DEV_DEFAULT_CUSTOMER_PASSWORD)
            }
        };

        let id_max_attempts = match get("BILLING_ID_MAX_ATTEMPTS") {
            Some(raw) => parse::<u32>("BILLING_ID_MAX_ATTEMPTS", "positive integer", raw)?.max(1),
            None => DEFAULT_MAX_ATTEMPTS,
        };

        let port = match get("BILLING_SMTP_PORT") {
            Some(raw) => parse("BILLING_SMTP_PORT", "port number", raw)?,
            None => DEFAULT_SMTP_PORT,
        };

        let smtp = match (
            get("BILLING_SMTP_HOST"),
            get("BILLING_SMTP_USERNAME"),
            get("BILLING_SMTP_PASSWORD"),
            get("BILLING_SMTP_FROM"),
        ) {
            (Some(host), Some(username), Some(password), Some(from)) => Some(SmtpSettings {
                host,
                port,
                username,
                password,
                from,
            }),
            (None, None, None, None) => None,
            _ => {
                tracing::warn!(
                    "SMTP partially configured; BILLING_SMTP_HOST, BILLING_SMTP_USERNAME, \
                     BILLING_SMTP_PASSWORD and BILLING_SMTP_FROM are all required. Invoice mail is disabled"
                );
                None
            }
        };

        Ok(Self {
            bind_addr,
            default_customer_password,
            smtp,
            id_max_attempts,
        })
    }

    /// The mail transport this configuration asks for.
    pub fn mail_transport(&self) -> Result<Arc<dyn MailTransport>, TransportError> {
        match &self.smtp {
            Some(settings) => Ok(Arc::new(SmtpMailTransport::new(settings)?)),
            None => {
                tracing::warn!("SMTP not configured; invoice mail will not be delivered");
                Ok(Arc::new(UnconfiguredMailTransport))
            }
        }
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, expected: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        expected,
        value: raw,
    })
}
