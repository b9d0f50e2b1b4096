//! Keyed record storage boundary.
//!
//! Services only talk to the [`Store`] traits; the in-memory implementation backs
//! tests, benchmarks and the default HTTP wiring. A durable backend plugs in by
//! implementing the same traits.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use r#trait::{InvoiceStore, Store, StoreError};
