use serde::{Deserialize, Serialize};

use billing_core::{CustomerId, DomainError, DomainResult, Entity};

/// Customer record as stored and returned to callers.
///
/// No password field: passwords are write-only and only
/// travel inside [`NewCustomer`] / [`ProfilePatch`] on their way to the hasher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub mobile_number: String,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Plaintext secret that never shows up in `Debug` output and is not serializable.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretString(<redacted>)")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Input: register a customer (and its identity).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    /// Optional initial password; the configured default is used when absent or empty.
    pub raw_password: Option<SecretString>,
}

impl NewCustomer {
    /// Supplied password, if it is non-empty.
    pub fn password(&self) -> Option<&SecretString> {
        self.raw_password.as_ref().filter(|p| !p.is_empty())
    }
}

/// Input: replace a customer's details.
///
/// `name` and `email` are always replaced; `mobile_number` only when it is present
/// and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomerPatch {
    pub name: String,
    pub email: String,
    pub mobile_number: Option<String>,
}

impl CustomerPatch {
    pub fn mobile_number(&self) -> Option<&str> {
        non_empty(self.mobile_number.as_deref())
    }
}

/// Input: profile update that also propagates to the paired identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfilePatch {
    pub name: String,
    pub email: String,
    pub mobile_number: Option<String>,
    pub new_password: Option<SecretString>,
}

impl ProfilePatch {
    pub fn mobile_number(&self) -> Option<&str> {
        non_empty(self.mobile_number.as_deref())
    }

    /// New password, if one was supplied and is non-empty.
    pub fn new_password(&self) -> Option<&SecretString> {
        self.new_password.as_ref().filter(|p| !p.is_empty())
    }

    /// The customer-facing part of the patch.
    pub fn details(&self) -> CustomerPatch {
        CustomerPatch {
            name: self.name.clone(),
            email: self.email.clone(),
            mobile_number: self.mobile_number.clone(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub(crate) fn ensure_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

impl Customer {
    pub fn new(id: CustomerId, input: &NewCustomer) -> DomainResult<Self> {
        ensure_name(&input.name)?;
        Ok(Self {
            id,
            name: input.name.clone(),
            email: input.email.clone(),
            mobile_number: input.mobile_number.clone(),
        })
    }

    /// Full replace of name/email; mobile number only when supplied.
    pub fn apply_patch(&mut self, patch: &CustomerPatch) -> DomainResult<()> {
        ensure_name(&patch.name)?;
        self.name = patch.name.clone();
        self.email = patch.email.clone();
        if let Some(mobile) = patch.mobile_number() {
            self.mobile_number = mobile.to_string();
        }
        Ok(())
    }
}
