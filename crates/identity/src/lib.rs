//! `billing-identity`: login identity records paired with customers.
//!
//! This crate has no HTTP or storage dependencies. Password hashing
//! sits behind [`PasswordHasher`] so the algorithm stays a collaborator choice.

pub mod identity;
pub mod password;
pub mod roles;

pub use identity::Identity;
pub use password::{Argon2PasswordHasher, HashError, PasswordHasher};
pub use roles::Role;
