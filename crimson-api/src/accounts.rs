use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crimson_core::account::{Customer, Staff};

use crate::error::AppError;
use crate::middleware::staff_auth_middleware;
use crate::state::AppState;

/// Account administration, staff-only. Registration lives in the auth
/// routes.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/customers", get(list_customers))
        .route(
            "/v1/customers/{customer_id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/v1/staff", get(list_staff))
        .route(
            "/v1/staff/{staff_id}",
            get(get_staff).put(update_staff).delete(delete_staff),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            staff_auth_middleware,
        ))
}

async fn list_customers(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, AppError> {
    Ok(Json(state.accounts.list_customers().await?))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<Customer>, AppError> {
    let customer = state
        .accounts
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("customer {} not found", customer_id)))?;
    Ok(Json(customer))
}

#[derive(Debug, serde::Deserialize)]
struct UpdateAccountRequest {
    name: String,
    email: String,
}

async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<Customer>, AppError> {
    let mut customer = state
        .accounts
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("customer {} not found", customer_id)))?;
    customer.name = req.name;
    customer.email = req.email;
    state.accounts.update_customer(&customer).await?;
    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.accounts.delete_customer(customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_staff(State(state): State<AppState>) -> Result<Json<Vec<Staff>>, AppError> {
    Ok(Json(state.accounts.list_staff().await?))
}

async fn get_staff(
    State(state): State<AppState>,
    Path(staff_id): Path<i64>,
) -> Result<Json<Staff>, AppError> {
    let staff = state
        .accounts
        .get_staff(staff_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("staff {} not found", staff_id)))?;
    Ok(Json(staff))
}

async fn update_staff(
    State(state): State<AppState>,
    Path(staff_id): Path<i64>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<Staff>, AppError> {
    let mut staff = state
        .accounts
        .get_staff(staff_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("staff {} not found", staff_id)))?;
    staff.name = req.name;
    staff.email = req.email;
    state.accounts.update_staff(&staff).await?;
    Ok(Json(staff))
}

async fn delete_staff(
    State(state): State<AppState>,
    Path(staff_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.accounts.delete_staff(staff_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
