use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use billing_infra::Clock;
use billing_invoicing::NewInvoice;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::routes::blocking;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/reports", get(invoice_reports))
        .route("/outstanding-reports", get(outstanding_reports))
        .route("/outstanding-summary", get(outstanding_summary))
        .route("/send-email", post(send_invoice_email))
        .route("/:id", get(get_invoice).delete(delete_invoice))
        .route("/:id/payments", post(register_payment))
        .route("/:id/status", put(set_status))
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let mut invoices = services.invoices.list_all()?;
    invoices.sort_by_key(|i| i.id());
    let items = invoices.iter().map(dto::InvoiceResponse::from).collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(items)).into_response())
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateInvoiceRequest>,
) -> Result<Response, ApiError> {
    let invoice = services.invoices.create(NewInvoice::from(body))?;
    Ok((StatusCode::CREATED, Json(dto::InvoiceResponse::from(&invoice))).into_response())
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = dto::parse_invoice_id(&id)?;
    match services.invoices.get_by_id(id)? {
        Some(invoice) => Ok((StatusCode::OK, Json(dto::InvoiceResponse::from(&invoice))).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

pub async fn delete_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = dto::parse_invoice_id(&id)?;
    services.invoices.delete(id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn register_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::PaymentRequest>,
) -> Result<Response, ApiError> {
    let id = dto::parse_invoice_id(&id)?;
    let invoice = services.invoices.register_payment(id, body.amount)?;
    Ok((StatusCode::OK, Json(dto::InvoiceResponse::from(&invoice))).into_response())
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusRequest>,
) -> Result<Response, ApiError> {
    let id = dto::parse_invoice_id(&id)?;
    let status = body.parse()?;
    let invoice = services.invoices.set_status(id, status)?;
    Ok((StatusCode::OK, Json(dto::InvoiceResponse::from(&invoice))).into_response())
}

pub async fn invoice_reports(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ReportRangeQuery>,
) -> Result<Response, ApiError> {
    let rows = match query.range()? {
        Some((from, to)) => services.reports.invoice_reports_between(from, to)?,
        None => services.reports.invoice_reports()?,
    };
    Ok((StatusCode::OK, Json(rows)).into_response())
}

pub async fn outstanding_reports(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let rows = services.reports.outstanding_invoices()?;
    Ok((StatusCode::OK, Json(rows)).into_response())
}

pub async fn outstanding_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SummaryQuery>,
) -> Result<Response, ApiError> {
    let now = query.as_of.unwrap_or_else(|| services.clock.now());
    let summary = services.reports.outstanding_summary(now)?;
    Ok((StatusCode::OK, Json(summary)).into_response())
}

pub async fn send_invoice_email(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SendEmailRequest>,
) -> Result<Response, ApiError> {
    let sent = blocking(move || {
        Ok(services
            .invoices
            .send_invoice_email(body.customer_id, body.invoice_id))
    })
    .await?;
    Ok((StatusCode::OK, Json(dto::SendEmailResponse { sent })).into_response())
}
