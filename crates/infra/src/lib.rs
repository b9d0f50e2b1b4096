//! Infrastructure layer: storage, lifecycle services, reports, config, external collaborators.
//!
//! The domain crates (`billing-customers`, `billing-invoicing`, ...) are pure; this crate
//! composes them with stores and collaborators into the operations callers use.

pub mod clock;
pub mod config;
pub mod customer_service;
pub mod error;
pub mod invoice_service;
pub mod locks;
pub mod notify;
pub mod reports;
pub mod store;

#[cfg(test)]
mod testing;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BillingConfig, ConfigError};
pub use customer_service::CustomerService;
pub use error::{ServiceError, ServiceResult};
pub use invoice_service::InvoiceService;
pub use locks::KeyedLocks;
pub use reports::{InvoiceReport, OutstandingInvoiceReport, OutstandingSummary, ReportEngine};
pub use store::{InMemoryStore, InvoiceStore, Store, StoreError};
