//! Billing reports: read-only projections over the invoice store.
//!
//! Reports are derived on demand from stored invoices; nothing is cached, so a
//! report always reflects the store at the time of the call. Rows are ordered by
//! invoice id.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use billing_core::{CustomerId, InvoiceId};
use billing_invoicing::Invoice;

use crate::error::{ServiceError, ServiceResult};
use crate::store::InvoiceStore;

/// Days between invoice creation and payment due date.
pub const PAYMENT_TERM_DAYS: i64 = 30;

/// Report row for every invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceReport {
    pub invoice_id: InvoiceId,
    pub invoice_date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub paid_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_amount: Decimal,
}

impl From<&Invoice> for InvoiceReport {
    fn from(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.id(),
            invoice_date: invoice.created_at(),
            total_amount: invoice.total_amount(),
            paid_amount: invoice.paid_amount(),
            outstanding_amount: invoice.outstanding_amount(),
        }
    }
}

/// Report row for an invoice that still has a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingInvoiceReport {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub invoice_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub paid_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_amount: Decimal,
}

impl OutstandingInvoiceReport {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now
    }
}

impl From<&Invoice> for OutstandingInvoiceReport {
    fn from(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.id(),
            customer_id: invoice.customer_id(),
            invoice_date: invoice.created_at(),
            due_date: due_date(invoice.created_at()),
            total_amount: invoice.total_amount(),
            paid_amount: invoice.paid_amount(),
            outstanding_amount: invoice.outstanding_amount(),
        }
    }
}

/// Aggregate view of outstanding invoices at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingSummary {
    pub count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_outstanding: Decimal,
    pub overdue_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub overdue_amount: Decimal,
}

pub fn due_date(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(PAYMENT_TERM_DAYS)
}

pub struct ReportEngine<S> {
    invoices: S,
}

impl<S: InvoiceStore> ReportEngine<S> {
    pub fn new(invoices: S) -> Self {
        Self { invoices }
    }

    /// One row per stored invoice, no filtering.
    pub fn invoice_reports(&self) -> ServiceResult<Vec<InvoiceReport>> {
        Ok(project(self.invoices.find_all()?, |_| true))
    }

    /// Rows for invoices created within `[from, to]`.
    pub fn invoice_reports_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<Vec<InvoiceReport>> {
        Ok(project(self.invoices.find_by_created_at_between(from, to)?, |_| true))
    }

    /// Invoices whose total exceeds what has been paid, with their due dates.
    pub fn outstanding_invoices(&self) -> ServiceResult<Vec<OutstandingInvoiceReport>> {
        Ok(project(self.invoices.find_all()?, Invoice::is_outstanding))
    }

    /// Totals over [`ReportEngine::outstanding_invoices`]; overdue means the due date is before `now`.
    pub fn outstanding_summary(&self, now: DateTime<Utc>) -> ServiceResult<OutstandingSummary> {
        let rows = self.outstanding_invoices()?;

        let mut summary = OutstandingSummary {
            count: rows.len(),
            total_outstanding: Decimal::ZERO,
            overdue_count: 0,
            overdue_amount: Decimal::ZERO,
        };
        for row in &rows {
            summary.total_outstanding = add_amount(summary.total_outstanding, row.outstanding_amount)?;
            if row.is_overdue(now) {
                summary.overdue_count += 1;
                summary.overdue_amount = add_amount(summary.overdue_amount, row.outstanding_amount)?;
            }
        }
        Ok(summary)
    }
}

fn add_amount(total: Decimal, amount: Decimal) -> ServiceResult<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| ServiceError::Invariant("outstanding total overflow".to_string()))
}

fn project<R>(mut invoices: Vec<Invoice>, keep: impl Fn(&Invoice) -> bool) -> Vec<R>
where
    R: for<'a> From<&'a Invoice>,
{
    invoices.sort_by_key(Invoice::id);
    invoices.iter().filter(|i| keep(i)).map(R::from).collect()
}
