//! Request/response DTOs and JSON mapping helpers.
//!
//! Field names are camelCase. Request bodies also accept the spellings older
//! clients send (`mobilenumber`, `customer: {id}`, `product: {id}`, `price`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billing_core::{CustomerId, InvoiceId, ProductId};
use billing_customers::{CustomerPatch, NewCustomer, ProfilePatch, SecretString};
use billing_invoicing::{Invoice, InvoiceItem, InvoiceStatus, NewInvoice, NewInvoiceItem};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "mobilenumber")]
    pub mobile_number: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl From<CreateCustomerRequest> for NewCustomer {
    fn from(body: CreateCustomerRequest) -> Self {
        NewCustomer {
            name: body.name,
            email: body.email,
            mobile_number: body.mobile_number,
            raw_password: body.password.map(SecretString::from),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "mobilenumber")]
    pub mobile_number: Option<String>,
    /// Only honoured by the profile endpoint.
    #[serde(default, alias = "newPassword")]
    pub password: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn into_patch(self) -> CustomerPatch {
        CustomerPatch {
            name: self.name,
            email: self.email,
            mobile_number: self.mobile_number,
        }
    }

    pub fn into_profile_patch(self) -> ProfilePatch {
        ProfilePatch {
            name: self.name,
            email: self.email,
            mobile_number: self.mobile_number,
            new_password: self.password.map(SecretString::from),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdRef<T> {
    pub id: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceItemRequest {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product: Option<IdRef<ProductId>>,
    pub quantity: u32,
    #[serde(alias = "price")]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub customer: Option<IdRef<CustomerId>>,
    #[serde(default, alias = "products")]
    pub items: Vec<CreateInvoiceItemRequest>,
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
}

impl From<CreateInvoiceRequest> for NewInvoice {
    fn from(body: CreateInvoiceRequest) -> Self {
        NewInvoice {
            customer_id: body.customer_id.or(body.customer.map(|c| c.id)),
            items: body
                .items
                .into_iter()
                .map(|item| NewInvoiceItem {
                    product_id: item.product_id.or(item.product.map(|p| p.id)),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            paid_amount: body.paid_amount,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

impl StatusRequest {
    pub fn parse(&self) -> Result<InvoiceStatus, ApiError> {
        Ok(self.status.parse::<InvoiceStatus>()?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub customer_id: CustomerId,
    pub invoice_id: InvoiceId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ReportRangeQuery {
    /// `Some((from, to))` when both bounds are given, `None` when neither is.
    pub fn range(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ApiError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from <= to => Ok(Some((from, to))),
            (Some(_), Some(_)) => Err(ApiError::BadRequest("'from' must not be after 'to'".to_string())),
            (None, None) => Ok(None),
            _ => Err(ApiError::BadRequest(
                "'from' and 'to' must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub as_of: Option<DateTime<Utc>>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemResponse {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

impl From<&InvoiceItem> for InvoiceItemResponse {
    fn from(item: &InvoiceItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub items: Vec<InvoiceItemResponse>,
    pub status: InvoiceStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub paid_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub outstanding_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Invoice> for InvoiceResponse {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id(),
            customer_id: invoice.customer_id(),
            items: invoice.items().iter().map(InvoiceItemResponse::from).collect(),
            status: invoice.status(),
            total_amount: invoice.total_amount(),
            paid_amount: invoice.paid_amount(),
            outstanding_amount: invoice.outstanding_amount(),
            created_at: invoice.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub sent: bool,
}

// -------------------------
// Path helpers
// -------------------------

pub fn parse_customer_id(raw: &str) -> Result<CustomerId, ApiError> {
    Ok(raw.parse::<CustomerId>()?)
}

pub fn parse_invoice_id(raw: &str) -> Result<InvoiceId, ApiError> {
    Ok(raw.parse::<InvoiceId>()?)
}
