//! Customer lifecycle: the customer record and its login identity, managed as one.
//!
//! The two records live in separate stores but share an id. Every sequence that
//! touches both runs under that id's lock, and multi-step writes are compensated
//! so a failure part-way never leaves a customer without its identity.
//!
//! ## Write order
//!
//! - create: identity, then customer. An orphan identity is tolerated transiently; an
//!   orphan customer never is.
//! - update_profile: identity, then customer (previous identity restored on failure).
//! - delete: identity, then customer (identity re-inserted on failure).

use std::sync::Arc;

use tracing::{error, info, warn};

use billing_core::{CustomerId, IdAllocator};
use billing_customers::{Customer, CustomerAccount, CustomerPatch, NewCustomer, ProfilePatch, SecretString};
use billing_identity::{Identity, PasswordHasher};

use crate::error::{ServiceError, ServiceResult};
use crate::locks::KeyedLocks;
use crate::store::{Store, StoreError};

pub struct CustomerService<C, I> {
    customers: C,
    identities: I,
    hasher: Arc<dyn PasswordHasher>,
    allocator: IdAllocator,
    default_password: SecretString,
    locks: KeyedLocks<CustomerId>,
}

impl<C, I> CustomerService<C, I>
where
    C: Store<Customer>,
    I: Store<Identity>,
{
    pub fn new(
        customers: C,
        identities: I,
        hasher: Arc<dyn PasswordHasher>,
        default_password: SecretString,
    ) -> Self {
        Self {
            customers,
            identities,
            hasher,
            allocator: IdAllocator::six_digit(),
            default_password,
            locks: KeyedLocks::new(),
        }
    }

    pub fn with_allocator(mut self, allocator: IdAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Register a customer together with its `CUSTOMER` identity.
    ///
    /// The id is allocated against the identity store and claimed with a create-only
    /// insert; losing a race for the same id draws a new one from the same attempt budget.
    pub fn create(&self, input: NewCustomer) -> ServiceResult<Customer> {
        let password = input.password().unwrap_or(&self.default_password);
        let password_hash = self.hasher.hash(password.expose())?;

        let customer = self.allocator.claim(
            |candidate| {
                self.identities
                    .exists_by_id(CustomerId::new(candidate))
                    .map_err(ServiceError::from)
            },
            |candidate| -> ServiceResult<Option<Customer>> {
                let id = CustomerId::new(candidate);
                let account = CustomerAccount::register(id, &input, password_hash.clone())?;
                match self.locks.with_lock(id, || self.persist_new(account)) {
                    Ok(customer) => Ok(Some(customer)),
                    Err(ServiceError::Store(StoreError::Duplicate(_))) => {
                        warn!(customer_id = %id, "customer id claimed concurrently; re-allocating");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            },
        )?;

        info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    fn persist_new(&self, account: CustomerAccount) -> ServiceResult<Customer> {
        let id = account.id();
        let (customer, identity) = account.into_parts();

        self.identities.insert(identity)?;

        match self.customers.insert(customer) {
            Ok(customer) => Ok(customer),
            Err(e) => {
                if let Err(cleanup) = self.identities.delete_by_id(id) {
                    error!(customer_id = %id, error = %cleanup, "failed to remove identity after customer insert failed");
                }
                Err(e.into())
            }
        }
    }

    /// Replace name and email; replace the mobile number only when one is supplied.
    ///
    /// The paired identity is left untouched.
    pub fn update(&self, id: CustomerId, patch: CustomerPatch) -> ServiceResult<Customer> {
        self.locks.with_lock(id, || {
            let mut customer = self
                .customers
                .find_by_id(id)?
                .ok_or_else(|| ServiceError::customer_not_found(id))?;

            customer.apply_patch(&patch)?;
            let saved = self.customers.save(customer)?;

            info!(customer_id = %id, "customer updated");
            Ok(saved)
        })
    }

    /// Update the customer and mirror the change onto its identity.
    pub fn update_profile(&self, id: CustomerId, patch: ProfilePatch) -> ServiceResult<Customer> {
        let new_hash = patch
            .new_password()
            .map(|p| self.hasher.hash(p.expose()))
            .transpose()?;

        self.locks.with_lock(id, || {
            let customer = self
                .customers
                .find_by_id(id)?
                .ok_or_else(|| ServiceError::customer_not_found(id))?;
            let identity = self.paired_identity(id)?;

            let previous = identity.clone();
            let mut account = CustomerAccount::from_parts(customer, identity)?;
            account.apply_profile(&patch, new_hash)?;
            let (customer, identity) = account.into_parts();

            self.identities.save(identity)?;
            let saved = match self.customers.save(customer) {
                Ok(saved) => saved,
                Err(e) => {
                    if let Err(restore) = self.identities.save(previous) {
                        error!(customer_id = %id, error = %restore, "failed to restore identity after customer save failed");
                    }
                    return Err(e.into());
                }
            };

            info!(customer_id = %id, password_changed = patch.new_password().is_some(), "customer profile updated");
            Ok(saved)
        })
    }

    /// Delete the customer and its identity, or neither.
    pub fn delete(&self, id: CustomerId) -> ServiceResult<()> {
        self.locks.with_lock(id, || {
            if !self.customers.exists_by_id(id)? {
                return Err(ServiceError::customer_not_found(id));
            }
            let identity = self.paired_identity(id)?;

            self.identities.delete_by_id(id)?;
            if let Err(e) = self.customers.delete_by_id(id) {
                if let Err(restore) = self.identities.insert(identity) {
                    error!(customer_id = %id, error = %restore, "failed to restore identity after customer delete failed");
                }
                return Err(e.into());
            }

            info!(customer_id = %id, "customer deleted");
            Ok(())
        })
    }

    pub fn get_by_id(&self, id: CustomerId) -> ServiceResult<Customer> {
        self.customers
            .find_by_id(id)?
            .ok_or_else(|| ServiceError::customer_not_found(id))
    }

    /// All customers in store iteration order.
    pub fn list_all(&self) -> ServiceResult<Vec<Customer>> {
        Ok(self.customers.find_all()?)
    }

    /// Check `password` against the customer's identity.
    pub fn authenticate(&self, id: CustomerId, password: &str) -> ServiceResult<bool> {
        if !self.customers.exists_by_id(id)? {
            return Err(ServiceError::customer_not_found(id));
        }
        let identity = self.paired_identity(id)?;
        let ok = identity.verify_password(self.hasher.as_ref(), password)?;
        if !ok {
            warn!(customer_id = %id, "password check failed");
        }
        Ok(ok)
    }

    fn paired_identity(&self, id: CustomerId) -> ServiceResult<Identity> {
        self.identities.find_by_id(id)?.ok_or_else(|| {
            warn!(customer_id = %id, "customer has no paired identity");
            ServiceError::IdentityMissing(id)
        })
    }
}
