//! `billing-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! numeric identifiers, the identifier allocator and the domain error model.

pub mod allocator;
pub mod entity;
pub mod error;
pub mod id;

pub use allocator::{AllocError, IdAllocator};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, InvoiceId, ProductId};
