use std::fmt::Write as _;

use thiserror::Error;

use billing_core::InvoiceId;
use billing_invoicing::Invoice;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("failed to render invoice {invoice_id}: {reason}")]
    Failed { invoice_id: InvoiceId, reason: String },
}

/// Rendered invoice ready to be attached to a mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub content_type: String,
    /// File extension without the leading dot (e.g. `txt`, `pdf`).
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Turns an invoice into a printable document.
pub trait InvoiceRenderer: Send + Sync {
    fn render_invoice(&self, invoice: &Invoice) -> Result<RenderedDocument, RenderError>;
}

impl<R> InvoiceRenderer for std::sync::Arc<R>
where
    R: InvoiceRenderer + ?Sized,
{
    fn render_invoice(&self, invoice: &Invoice) -> Result<RenderedDocument, RenderError> {
        (**self).render_invoice(invoice)
    }
}

/// Plain-text invoice layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextInvoiceRenderer;

impl TextInvoiceRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl InvoiceRenderer for TextInvoiceRenderer {
    fn render_invoice(&self, invoice: &Invoice) -> Result<RenderedDocument, RenderError> {
        let mut out = String::new();
        write_invoice(&mut out, invoice).map_err(|e| RenderError::Failed {
            invoice_id: invoice.id(),
            reason: e.to_string(),
        })?;

        Ok(RenderedDocument {
            content_type: "text/plain; charset=utf-8".to_string(),
            extension: "txt".to_string(),
            bytes: out.into_bytes(),
        })
    }
}

fn write_invoice(out: &mut String, invoice: &Invoice) -> std::fmt::Result {
    writeln!(out, "INVOICE #{}", invoice.id())?;
    writeln!(out, "Customer: {}", invoice.customer_id())?;
    writeln!(out, "Date: {}", invoice.created_at().format("%Y-%m-%d"))?;
    writeln!(out, "Status: {}", invoice.status())?;
    writeln!(out)?;
    writeln!(out, "{:<12} {:>8} {:>14} {:>14}", "Product", "Qty", "Unit price", "Line total")?;
    for item in invoice.items() {
        writeln!(
            out,
            "{:<12} {:>8} {:>14} {:>14}",
            item.product_id,
            item.quantity,
            item.unit_price.round_dp(2),
            item.line_total().round_dp(2)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Total:       {}", invoice.total_amount().round_dp(2))?;
    writeln!(out, "Paid:        {}", invoice.paid_amount().round_dp(2))?;
    writeln!(out, "Outstanding: {}", invoice.outstanding_amount().round_dp(2))?;
    Ok(())
}
