use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier attached to an identity.
///
/// Roles are opaque strings at this layer; the well-known ones have
/// constructors so call sites don't repeat string literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const CUSTOMER: &'static str = "CUSTOMER";
    pub const ADMIN: &'static str = "ADMIN";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Role assigned to every identity created alongside a customer.
    pub fn customer() -> Self {
        Self(Cow::Borrowed(Self::CUSTOMER))
    }

    pub fn admin() -> Self {
        Self(Cow::Borrowed(Self::ADMIN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
