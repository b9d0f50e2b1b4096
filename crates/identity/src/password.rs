//! Password hashing boundary.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    Malformed(String),
}

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string (salt included).
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// Check a plaintext password against a previously produced hash.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
}

impl<H> PasswordHasher for std::sync::Arc<H>
where
    H: PasswordHasher + ?Sized,
{
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        (**self).hash(plaintext)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        (**self).verify(plaintext, hash)
    }
}

/// Argon2id with default parameters; output is a PHC string.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| HashError::Hashing(e.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            tracing::warn!(error = %e, "stored password hash is not a PHC string");
            HashError::Malformed(e.to_string())
        })?;
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                tracing::error!(error = %e, algorithm = %parsed.algorithm, "password verification failed");
                Err(HashError::Hashing(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let hasher = Argon2PasswordHasher::new();
        let a = hasher.hash("s3cret-pass").unwrap();
        let b = hasher.hash("s3cret-pass").unwrap();

        assert_ne!(a, b, "salts must differ");
        assert!(a.starts_with("$argon2id$"));
        assert!(!a.contains("s3cret-pass"));
        assert!(hasher.verify("s3cret-pass", &a).unwrap());
        assert!(!hasher.verify("wrong", &a).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hasher = Argon2PasswordHasher::new();
        let err = hasher.verify("anything", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, HashError::Malformed(_)));
    }
}
