use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use billing_core::Entity;
use billing_invoicing::Invoice;

use super::r#trait::{InvoiceStore, Store, StoreError};

/// In-memory keyed store.
///
/// Intended for tests/dev and the default server wiring. `find_all` returns
/// records in no particular order.
#[derive(Debug)]
pub struct InMemoryStore<V: Entity> {
    records: RwLock<HashMap<V::Id, V>>,
}

impl<V: Entity> InMemoryStore<V> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Entity> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

impl<V> Store<V> for InMemoryStore<V>
where
    V: Entity + Clone + Send + Sync,
{
    fn exists_by_id(&self, id: V::Id) -> Result<bool, StoreError> {
        let map = self.records.read().map_err(|_| poisoned())?;
        Ok(map.contains_key(&id))
    }

    fn find_by_id(&self, id: V::Id) -> Result<Option<V>, StoreError> {
        let map = self.records.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    fn save(&self, record: V) -> Result<V, StoreError> {
        let mut map = self.records.write().map_err(|_| poisoned())?;
        map.insert(record.id(), record.clone());
        Ok(record)
    }

    fn insert(&self, record: V) -> Result<V, StoreError> {
        let mut map = self.records.write().map_err(|_| poisoned())?;
        match map.entry(record.id()) {
            Entry::Occupied(slot) => Err(StoreError::Duplicate(slot.key().to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    fn delete_by_id(&self, id: V::Id) -> Result<bool, StoreError> {
        let mut map = self.records.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id).is_some())
    }

    fn find_all(&self) -> Result<Vec<V>, StoreError> {
        let map = self.records.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }
}

impl InvoiceStore for InMemoryStore<Invoice> {}
