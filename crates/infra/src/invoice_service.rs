//! Invoice lifecycle: creation, lookup, controlled updates and mailing.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use billing_core::{CustomerId, IdAllocator, InvoiceId};
use billing_customers::Customer;
use billing_invoicing::{Invoice, InvoiceStatus, NewInvoice};

use crate::clock::{Clock, SystemClock};
use crate::error::{ServiceError, ServiceResult};
use crate::locks::KeyedLocks;
use crate::notify::{InvoiceRenderer, MailAttachment, MailTransport, OutgoingMail};
use crate::store::{InvoiceStore, Store, StoreError};

pub const INVOICE_MAIL_BODY: &str = "Please find attached the invoice for your recent purchase.";

pub struct InvoiceService<S, C> {
    invoices: S,
    customers: C,
    renderer: Arc<dyn InvoiceRenderer>,
    mailer: Arc<dyn MailTransport>,
    allocator: IdAllocator,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks<InvoiceId>,
}

impl<S, C> InvoiceService<S, C>
where
    S: InvoiceStore,
    C: Store<Customer>,
{
    pub fn new(
        invoices: S,
        customers: C,
        renderer: Arc<dyn InvoiceRenderer>,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            invoices,
            customers,
            renderer,
            mailer,
            allocator: IdAllocator::six_digit(),
            clock: Arc::new(SystemClock),
            locks: KeyedLocks::new(),
        }
    }

    pub fn with_allocator(mut self, allocator: IdAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate, allocate an id and persist a new invoice (status `Paid`).
    pub fn create(&self, input: NewInvoice) -> ServiceResult<Invoice> {
        input.validate()?;

        let invoice = self.allocator.claim(
            |candidate| {
                self.invoices
                    .exists_by_id(InvoiceId::new(candidate))
                    .map_err(ServiceError::from)
            },
            |candidate| -> ServiceResult<Option<Invoice>> {
                let id = InvoiceId::new(candidate);
                let invoice = Invoice::create(id, &input, self.clock.now())?;
                match self.invoices.insert(invoice) {
                    Ok(invoice) => Ok(Some(invoice)),
                    Err(StoreError::Duplicate(_)) => {
                        warn!(invoice_id = %id, "invoice id claimed concurrently; re-allocating");
                        Ok(None)
                    }
                    Err(e) => Err(e.into()),
                }
            },
        )?;

        info!(
            invoice_id = %invoice.id(),
            customer_id = %invoice.customer_id(),
            items = invoice.items().len(),
            total = %invoice.total_amount(),
            "invoice created"
        );
        Ok(invoice)
    }

    /// `None` when absent; only store failures are errors.
    pub fn get_by_id(&self, id: InvoiceId) -> ServiceResult<Option<Invoice>> {
        Ok(self.invoices.find_by_id(id)?)
    }

    pub fn list_all(&self) -> ServiceResult<Vec<Invoice>> {
        Ok(self.invoices.find_all()?)
    }

    /// Remove the invoice with its items. Deleting an absent id is not an error.
    pub fn delete(&self, id: InvoiceId) -> ServiceResult<bool> {
        let removed = self.locks.with_lock(id, || self.invoices.delete_by_id(id))?;
        info!(invoice_id = %id, removed, "invoice deleted");
        Ok(removed)
    }

    pub fn register_payment(&self, id: InvoiceId, amount: Decimal) -> ServiceResult<Invoice> {
        self.locks.with_lock(id, || {
            let mut invoice = self.load(id)?;
            invoice.register_payment(amount)?;
            let saved = self.invoices.save(invoice)?;

            info!(invoice_id = %id, amount = %amount, outstanding = %saved.outstanding_amount(), "payment registered");
            Ok(saved)
        })
    }

    pub fn set_status(&self, id: InvoiceId, status: InvoiceStatus) -> ServiceResult<Invoice> {
        self.locks.with_lock(id, || {
            let mut invoice = self.load(id)?;
            let previous = invoice.status();
            invoice.set_status(status);
            let saved = self.invoices.save(invoice)?;

            info!(invoice_id = %id, from = %previous, to = %status, "invoice status changed");
            Ok(saved)
        })
    }

    /// Render the invoice and mail it to the customer.
    ///
    /// Returns `false` on any failure; the cause is logged, never returned. Use
    /// [`InvoiceService::try_send_invoice_email`] to get the error itself.
    pub fn send_invoice_email(&self, customer_id: CustomerId, invoice_id: InvoiceId) -> bool {
        match self.try_send_invoice_email(customer_id, invoice_id) {
            Ok(()) => true,
            Err(e) => {
                error!(customer_id = %customer_id, invoice_id = %invoice_id, error = %e, "failed to send invoice email");
                false
            }
        }
    }

    pub fn try_send_invoice_email(&self, customer_id: CustomerId, invoice_id: InvoiceId) -> ServiceResult<()> {
        let customer = self
            .customers
            .find_by_id(customer_id)?
            .ok_or_else(|| ServiceError::customer_not_found(customer_id))?;
        let invoice = self.load(invoice_id)?;

        let document = self.renderer.render_invoice(&invoice)?;

        self.mailer.send(OutgoingMail {
            to: customer.email.clone(),
            subject: format!("Invoice #{invoice_id}"),
            body: INVOICE_MAIL_BODY.to_string(),
            attachment: MailAttachment {
                filename: format!("Invoice_{invoice_id}.{}", document.extension),
                content_type: document.content_type,
                bytes: document.bytes,
            },
        })?;

        info!(customer_id = %customer_id, invoice_id = %invoice_id, "invoice email sent");
        Ok(())
    }

    fn load(&self, id: InvoiceId) -> ServiceResult<Invoice> {
        self.invoices
            .find_by_id(id)?
            .ok_or_else(|| ServiceError::invoice_not_found(id))
    }
}
