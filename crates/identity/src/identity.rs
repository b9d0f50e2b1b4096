//! Identity ("user") record for login management.
//!
//! Every identity is paired one-to-one with a customer and shares its id.

use billing_core::{CustomerId, Entity};

use crate::password::{HashError, PasswordHasher};
use crate::Role;

/// Login identity paired with a customer.
///
/// # Invariants
/// - `id` equals the paired customer's id; the pair is created and deleted together.
/// - `password_hash` only ever holds output of a [`PasswordHasher`].
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: CustomerId,
    pub username: String,
    pub email: String,
    pub mobile_number: String,
    pub password_hash: String,
    pub role: Role,
}

impl Identity {
    /// Identity for a freshly registered customer (role `CUSTOMER`).
    pub fn for_customer(
        id: CustomerId,
        username: impl Into<String>,
        email: impl Into<String>,
        mobile_number: impl Into<String>,
        password_hash: String,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            mobile_number: mobile_number.into(),
            password_hash,
            role: Role::customer(),
        }
    }

    pub fn verify_password(
        &self,
        hasher: &dyn PasswordHasher,
        plaintext: &str,
    ) -> Result<bool, HashError> {
        hasher.verify(plaintext, &self.password_hash)
    }
}

impl Entity for Identity {
    type Id = CustomerId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl core::fmt::Debug for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("mobile_number", &self.mobile_number)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Argon2PasswordHasher;

    #[test]
    fn customer_identity_gets_customer_role() {
        let identity = Identity::for_customer(
            CustomerId::new(482_913),
            "Alice",
            "a@x.com",
            "555",
            "hash".to_string(),
        );

        assert_eq!(identity.role, Role::customer());
        assert_eq!(identity.role.as_str(), "CUSTOMER");
        assert_eq!(Entity::id(&identity), CustomerId::new(482_913));
    }

    #[test]
    fn debug_output_redacts_hash() {
        let identity = Identity::for_customer(
            CustomerId::new(100_001),
            "Bob",
            "b@x.com",
            "",
            "$argon2id$v=19$secret".to_string(),
        );

        let rendered = format!("{identity:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("argon2id"));
    }

    #[test]
    fn verifies_password_through_hasher() {
        let hasher = Argon2PasswordHasher::new();
        let identity = Identity::for_customer(
            CustomerId::new(123_456),
            "Carol",
            "c@x.com",
            "777",
            hasher.hash("open-sesame").unwrap(),
        );

        assert!(identity.verify_password(&hasher, "open-sesame").unwrap());
        assert!(!identity.verify_password(&hasher, "closed").unwrap());
    }
}
