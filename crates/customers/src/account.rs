//! The customer/identity pair treated as one consistency boundary.

use billing_core::{CustomerId, DomainError, DomainResult};
use billing_identity::Identity;

use crate::customer::{Customer, CustomerPatch, NewCustomer, ProfilePatch};

/// Aggregate: a customer together with its login identity.
///
/// # Invariants
/// - `customer.id == identity.id`.
/// - Identity username/email mirror the customer's name/email after every profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerAccount {
    customer: Customer,
    identity: Identity,
}

impl CustomerAccount {
    /// Build a brand-new pair sharing `id`.
    pub fn register(id: CustomerId, input: &NewCustomer, password_hash: String) -> DomainResult<Self> {
        let customer = Customer::new(id, input)?;
        let identity = Identity::for_customer(
            id,
            input.name.clone(),
            input.email.clone(),
            input.mobile_number.clone(),
            password_hash,
        );
        Ok(Self { customer, identity })
    }

    /// Reassemble a pair loaded from the two stores.
    pub fn from_parts(customer: Customer, identity: Identity) -> DomainResult<Self> {
        let account = Self { customer, identity };
        account.ensure_paired()?;
        Ok(account)
    }

    pub fn id(&self) -> CustomerId {
        self.customer.id
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn into_parts(self) -> (Customer, Identity) {
        (self.customer, self.identity)
    }

    pub fn ensure_paired(&self) -> DomainResult<()> {
        if self.customer.id != self.identity.id {
            return Err(DomainError::invariant(format!(
                "customer {} is paired with identity {}",
                self.customer.id, self.identity.id
            )));
        }
        Ok(())
    }

    /// Apply a profile update to both records.
    ///
    /// `new_password_hash` must already be hashed; `None` leaves the stored hash as is.
    pub fn apply_profile(
        &mut self,
        patch: &ProfilePatch,
        new_password_hash: Option<String>,
    ) -> DomainResult<()> {
        let details: CustomerPatch = patch.details();
        self.customer.apply_patch(&details)?;

        self.identity.username = self.customer.name.clone();
        self.identity.email = self.customer.email.clone();
        if let Some(mobile) = patch.mobile_number() {
            self.identity.mobile_number = mobile.to_string();
        }
        if let Some(hash) = new_password_hash {
            self.identity.password_hash = hash;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SecretString;
    use billing_identity::Role;

    fn registered() -> CustomerAccount {
        let input = NewCustomer {
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            mobile_number: "555".to_string(),
            raw_password: None,
        };
        CustomerAccount::register(CustomerId::new(482_913), &input, "h0".to_string()).unwrap()
    }

    #[test]
    fn register_pairs_customer_and_identity() {
        let account = registered();

        assert_eq!(account.customer().id, account.identity().id);
        assert_eq!(account.identity().username, "Alice");
        assert_eq!(account.identity().role, Role::customer());
        assert_eq!(account.identity().password_hash, "h0");
    }

    #[test]
    fn mismatched_parts_are_rejected() {
        let (customer, mut identity) = registered().into_parts();
        identity.id = CustomerId::new(1);

        let err = CustomerAccount::from_parts(customer, identity).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn profile_update_mirrors_identity() {
        let mut account = registered();
        let patch = ProfilePatch {
            name: "Alicia".to_string(),
            email: "alicia@x.com".to_string(),
            mobile_number: Some("999".to_string()),
            new_password: Some(SecretString::new("new-pass")),
        };

        account.apply_profile(&patch, Some("h1".to_string())).unwrap();

        assert_eq!(account.customer().name, "Alicia");
        assert_eq!(account.identity().username, "Alicia");
        assert_eq!(account.identity().email, "alicia@x.com");
        assert_eq!(account.identity().mobile_number, "999");
        assert_eq!(account.customer().mobile_number, "999");
        assert_eq!(account.identity().password_hash, "h1");
    }

    #[test]
    fn profile_update_without_password_keeps_hash() {
        let mut account = registered();
        let patch = ProfilePatch {
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            mobile_number: Some(String::new()),
            new_password: None,
        };

        account.apply_profile(&patch, None).unwrap();

        assert_eq!(account.identity().password_hash, "h0");
        assert_eq!(account.identity().mobile_number, "555");
        assert_eq!(account.customer().mobile_number, "555");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: an empty or absent mobile number never changes either record.
            #[test]
            fn blank_mobile_is_ignored(
                name in "[A-Za-z][A-Za-z ]{0,20}",
                email in "[a-z]{1,8}@[a-z]{1,8}\\.com",
                absent in any::<bool>(),
            ) {
                let mut account = registered();
                let patch = ProfilePatch {
                    name,
                    email,
                    mobile_number: if absent { None } else { Some(String::new()) },
                    new_password: None,
                };
                account.apply_profile(&patch, None).unwrap();

                prop_assert_eq!(&account.customer().mobile_number, "555");
                prop_assert_eq!(&account.identity().mobile_number, "555");
            }

            /// Property: a non-empty mobile number replaces both records.
            #[test]
            fn supplied_mobile_replaces(mobile in "[0-9]{1,12}") {
                let mut account = registered();
                let patch = ProfilePatch {
                    name: "Alice".to_string(),
                    email: "a@x.com".to_string(),
                    mobile_number: Some(mobile.clone()),
                    new_password: None,
                };
                account.apply_profile(&patch, None).unwrap();

                prop_assert_eq!(&account.customer().mobile_number, &mobile);
                prop_assert_eq!(&account.identity().mobile_number, &mobile);
            }
        }
    }
}
