//! Test doubles shared by the service tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use billing_core::Entity;
use billing_identity::{HashError, PasswordHasher};
use billing_invoicing::Invoice;

use crate::notify::{InvoiceRenderer, MailTransport, OutgoingMail, RenderError, RenderedDocument, TransportError};
use crate::store::{InMemoryStore, InvoiceStore, Store, StoreError};

/// Reversible "hash" so tests don't pay for Argon2.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(format!("plain${plaintext}"))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        Ok(hash == format!("plain${plaintext}"))
    }
}

/// In-memory store whose writes can be switched to fail.
#[derive(Debug)]
pub struct FlakyStore<V: Entity> {
    inner: InMemoryStore<V>,
    pub fail_insert: AtomicBool,
    pub fail_save: AtomicBool,
    pub fail_delete: AtomicBool,
    /// Number of upcoming inserts to reject as if another writer took the id first.
    pub lost_inserts: AtomicU32,
}

impl<V: Entity> FlakyStore<V> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_insert: AtomicBool::new(false),
            fail_save: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            lost_inserts: AtomicU32::new(0),
        }
    }

    pub fn fail(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{op} failed (injected)")));
        }
        Ok(())
    }
}

impl<V> Store<V> for FlakyStore<V>
where
    V: Entity + Clone + Send + Sync,
{
    fn exists_by_id(&self, id: V::Id) -> Result<bool, StoreError> {
        self.inner.exists_by_id(id)
    }

    fn find_by_id(&self, id: V::Id) -> Result<Option<V>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn save(&self, record: V) -> Result<V, StoreError> {
        Self::check(&self.fail_save, "save")?;
        self.inner.save(record)
    }

    fn insert(&self, record: V) -> Result<V, StoreError> {
        Self::check(&self.fail_insert, "insert")?;
        let lost = self
            .lost_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            return Err(StoreError::Duplicate(record.id().to_string()));
        }
        self.inner.insert(record)
    }

    fn delete_by_id(&self, id: V::Id) -> Result<bool, StoreError> {
        Self::check(&self.fail_delete, "delete")?;
        self.inner.delete_by_id(id)
    }

    fn find_all(&self) -> Result<Vec<V>, StoreError> {
        self.inner.find_all()
    }
}

impl InvoiceStore for FlakyStore<Invoice> {}

/// Mail transport that keeps every mail it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

impl MailTransport for RecordingMailer {
    fn send(&self, mail: OutgoingMail) -> Result<(), TransportError> {
        self.sent
            .lock()
            .map_err(|_| TransportError::Delivery("poisoned".to_string()))?
            .push(mail);
        Ok(())
    }
}

/// Renderer that always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrokenRenderer;

impl InvoiceRenderer for BrokenRenderer {
    fn render_invoice(&self, invoice: &Invoice) -> Result<RenderedDocument, RenderError> {
        Err(RenderError::Failed {
            invoice_id: invoice.id(),
            reason: "template missing".to_string(),
        })
    }
}
