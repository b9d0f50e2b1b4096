//! Service wiring: in-memory stores shared between the lifecycle managers and reports.

use std::sync::Arc;

use billing_core::IdAllocator;
use billing_customers::Customer;
use billing_identity::{Argon2PasswordHasher, Identity, PasswordHasher};
use billing_infra::notify::{InvoiceRenderer, MailTransport, TextInvoiceRenderer, TransportError};
use billing_infra::{
    BillingConfig, Clock, CustomerService, InMemoryStore, InvoiceService, ReportEngine, SystemClock,
};
use billing_invoicing::Invoice;

pub type SharedCustomers = Arc<InMemoryStore<Customer>>;
pub type SharedIdentities = Arc<InMemoryStore<Identity>>;
pub type SharedInvoices = Arc<InMemoryStore<Invoice>>;

pub struct AppServices {
    pub customers: CustomerService<SharedCustomers, SharedIdentities>,
    pub invoices: InvoiceService<SharedInvoices, SharedCustomers>,
    pub reports: ReportEngine<SharedInvoices>,
    pub clock: Arc<dyn Clock>,
}

/// Collaborators that differ between production and tests.
pub struct Collaborators {
    pub hasher: Arc<dyn PasswordHasher>,
    pub renderer: Arc<dyn InvoiceRenderer>,
    pub mailer: Arc<dyn MailTransport>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    pub fn from_config(config: &BillingConfig) -> Result<Self, TransportError> {
        Ok(Self {
            hasher: Arc::new(Argon2PasswordHasher::new()),
            renderer: Arc::new(TextInvoiceRenderer::new()),
            mailer: config.mail_transport()?,
            clock: Arc::new(SystemClock),
        })
    }
}

pub fn build_services(config: &BillingConfig) -> Result<AppServices, TransportError> {
    Ok(build_services_with(config, Collaborators::from_config(config)?))
}

pub fn build_services_with(config: &BillingConfig, collaborators: Collaborators) -> AppServices {
    let customer_store: SharedCustomers = Arc::new(InMemoryStore::new());
    let identity_store: SharedIdentities = Arc::new(InMemoryStore::new());
    let invoice_store: SharedInvoices = Arc::new(InMemoryStore::new());

    let allocator = IdAllocator::six_digit().with_max_attempts(config.id_max_attempts);

    let customers = CustomerService::new(
        Arc::clone(&customer_store),
        identity_store,
        collaborators.hasher,
        config.default_customer_password.clone(),
    )
    .with_allocator(allocator.clone());

    let invoices = InvoiceService::new(
        Arc::clone(&invoice_store),
        customer_store,
        collaborators.renderer,
        collaborators.mailer,
    )
    .with_allocator(allocator)
    .with_clock(Arc::clone(&collaborators.clock));

    AppServices {
        customers,
        invoices,
        reports: ReportEngine::new(invoice_store),
        clock: collaborators.clock,
    }
}
