use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use billing_core::Entity;
use billing_invoicing::Invoice;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A create-only insert hit an existing key.
    #[error("record already exists: {0}")]
    Duplicate(String),

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed storage for one record type.
///
/// Records carry their own key ([`Entity::id`]), so `save` and `insert` take the
/// record alone.
///
/// ## Write semantics
///
/// - `save` is an upsert and returns the stored record.
/// - `insert` is create-only. It fails with [`StoreError::Duplicate`] when the key is
///   taken, which lets callers claim a freshly allocated id atomically.
/// - `delete_by_id` reports whether a record was removed; deleting an absent key is
///   not an error.
pub trait Store<V: Entity>: Send + Sync {
    fn exists_by_id(&self, id: V::Id) -> Result<bool, StoreError>;

    fn find_by_id(&self, id: V::Id) -> Result<Option<V>, StoreError>;

    fn save(&self, record: V) -> Result<V, StoreError>;

    fn insert(&self, record: V) -> Result<V, StoreError>;

    fn delete_by_id(&self, id: V::Id) -> Result<bool, StoreError>;

    fn find_all(&self) -> Result<Vec<V>, StoreError>;
}

impl<V, S> Store<V> for Arc<S>
where
    V: Entity,
    S: Store<V> + ?Sized,
{
    fn exists_by_id(&self, id: V::Id) -> Result<bool, StoreError> {
        (**self).exists_by_id(id)
    }

    fn find_by_id(&self, id: V::Id) -> Result<Option<V>, StoreError> {
        (**self).find_by_id(id)
    }

    fn save(&self, record: V) -> Result<V, StoreError> {
        (**self).save(record)
    }

    fn insert(&self, record: V) -> Result<V, StoreError> {
        (**self).insert(record)
    }

    fn delete_by_id(&self, id: V::Id) -> Result<bool, StoreError> {
        (**self).delete_by_id(id)
    }

    fn find_all(&self) -> Result<Vec<V>, StoreError> {
        (**self).find_all()
    }
}

/// Invoice storage with the creation-date query used by reports.
pub trait InvoiceStore: Store<Invoice> {
    /// Invoices with `from <= created_at <= to`.
    ///
    /// The default scans [`Store::find_all`]; indexed backends should override it.
    fn find_by_created_at_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Invoice>, StoreError> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|invoice| invoice.created_at() >= from && invoice.created_at() <= to)
            .collect())
    }
}

impl<S> InvoiceStore for Arc<S>
where
    S: InvoiceStore + ?Sized,
{
    fn find_by_created_at_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Invoice>, StoreError> {
        (**self).find_by_created_at_between(from, to)
    }
}
