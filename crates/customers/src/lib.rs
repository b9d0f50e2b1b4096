//! Customers domain module.
//!
//! This crate contains business rules for customers and the customer/identity
//! pair, implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod account;
pub mod customer;

pub use account::CustomerAccount;
pub use customer::{Customer, CustomerPatch, NewCustomer, ProfilePatch, SecretString};
