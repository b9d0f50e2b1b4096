use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};

use billing_customers::NewCustomer;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::routes::blocking;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/profile/:id", get(get_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/:id/profile", put(update_customer_profile))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let customers = services.customers.list_all()?;
    Ok((StatusCode::OK, Json(customers)).into_response())
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateCustomerRequest>,
) -> Result<Response, ApiError> {
    let input = NewCustomer::from(body);
    let customer = blocking(move || services.customers.create(input)).await?;
    Ok((StatusCode::CREATED, Json(customer)).into_response())
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = dto::parse_customer_id(&id)?;
    let customer = services.customers.get_by_id(id)?;
    Ok((StatusCode::OK, Json(customer)).into_response())
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCustomerRequest>,
) -> Result<Response, ApiError> {
    let id = dto::parse_customer_id(&id)?;
    let customer = services.customers.update(id, body.into_patch())?;
    Ok((StatusCode::OK, Json(customer)).into_response())
}

pub async fn update_customer_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCustomerRequest>,
) -> Result<Response, ApiError> {
    let id = dto::parse_customer_id(&id)?;
    let patch = body.into_profile_patch();
    let customer = blocking(move || services.customers.update_profile(id, patch)).await?;
    Ok((StatusCode::OK, Json(customer)).into_response())
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = dto::parse_customer_id(&id)?;
    services.customers.delete(id)?;
    Ok(StatusCode::OK.into_response())
}
