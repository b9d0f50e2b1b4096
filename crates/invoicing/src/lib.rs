//! Invoicing domain module.
//!
//! This crate contains business rules for invoices and their line items,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod invoice;

pub use invoice::{Invoice, InvoiceItem, InvoiceStatus, NewInvoice, NewInvoiceItem};
