//! Service-level error model.
//!
//! Lifecycle managers and the report engine return [`ServiceError`]. It folds the
//! domain, storage, hashing and collaborator errors into one taxonomy that callers
//! can map onto their own surface (HTTP status codes, CLI exit codes).

use thiserror::Error;

use billing_core::{AllocError, CustomerId, DomainError};
use billing_identity::HashError;

use crate::notify::{RenderError, TransportError};
use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A customer exists without its paired identity (store corruption, not absence).
    #[error("identity missing for customer {0}")]
    IdentityMissing(CustomerId),

    #[error("invalid invoice: {0}")]
    InvalidInvoice(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("identifier space exhausted after {attempts} attempts")]
    AllocatorExhausted { attempts: u32 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn customer_not_found(id: CustomerId) -> Self {
        Self::not_found("customer", id)
    }

    pub fn invoice_not_found(id: billing_core::InvoiceId) -> Self {
        Self::not_found("invoice", id)
    }

    /// Whether the error is the caller's fault (bad input) rather than ours.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::NotFound { .. } | ServiceError::InvalidInvoice(_) | ServiceError::Validation(_)
        )
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::Invariant(msg),
            DomainError::InvalidInvoice(msg) => ServiceError::InvalidInvoice(msg),
        }
    }
}

impl From<AllocError<ServiceError>> for ServiceError {
    fn from(value: AllocError<ServiceError>) -> Self {
        match value {
            AllocError::Exhausted { attempts } => ServiceError::AllocatorExhausted { attempts },
            AllocError::Probe(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_keep_their_category() {
        let err: ServiceError = DomainError::invalid_invoice("no items").into();
        assert_eq!(err, ServiceError::InvalidInvoice("no items".to_string()));
        assert!(err.is_client_error());

        let err: ServiceError = DomainError::invariant("ids differ").into();
        assert!(matches!(err, ServiceError::Invariant(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn malformed_ids_are_validation_errors() {
        let err: ServiceError = DomainError::invalid_id("InvoiceId: invalid digit").into();
        assert_eq!(err, ServiceError::Validation("InvoiceId: invalid digit".to_string()));
        assert!(err.is_client_error());
    }

    #[test]
    fn allocator_failures_keep_the_underlying_error() {
        let down = ServiceError::Store(StoreError::Unavailable("down".into()));
        let err: ServiceError = AllocError::Probe(down.clone()).into();
        assert_eq!(err, down);

        let err: ServiceError = AllocError::<ServiceError>::Exhausted { attempts: 3 }.into();
        assert_eq!(err, ServiceError::AllocatorExhausted { attempts: 3 });
        assert_eq!(err.to_string(), "identifier space exhausted after 3 attempts");
    }

    #[test]
    fn not_found_names_entity_and_id() {
        let err = ServiceError::customer_not_found(CustomerId::new(482_913));
        assert_eq!(err.to_string(), "customer 482913 not found");
    }
}
