use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;

use crimson_core::order::{OrderLineItem, Transaction};
use crimson_order::SessionContext;

use crate::error::AppError;
use crate::middleware::{customer_auth_middleware, staff_auth_middleware};
use crate::state::AppState;

/// Purchase history reads. Writes only ever happen inside the checkout
/// workflow.
pub fn routes(state: &AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/v1/transactions", get(list_transactions))
        .route("/v1/transactions/{transaction_id}", get(get_transaction))
        .route(
            "/v1/transactions/{transaction_id}/items",
            get(list_transaction_items),
        )
        .route(
            "/v1/customers/{customer_id}/transactions",
            get(list_customer_transactions),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            staff_auth_middleware,
        ));

    let customer = Router::new()
        .route("/v1/me/transactions", get(list_my_transactions))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            customer_auth_middleware,
        ));

    staff.merge(customer)
}

#[derive(Debug, Serialize)]
struct TransactionDetail {
    #[serde(flatten)]
    transaction: Transaction,
    items: Vec<OrderLineItem>,
}

async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    Ok(Json(state.orders.list_transactions().await?))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<TransactionDetail>, AppError> {
    let transaction = state
        .orders
        .get_transaction(transaction_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFoundError(format!("transaction {} not found", transaction_id))
        })?;
    let items = state.orders.list_items_by_transaction(transaction_id).await?;
    Ok(Json(TransactionDetail { transaction, items }))
}

async fn list_transaction_items(
    State(state): State<AppState>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<Vec<OrderLineItem>>, AppError> {
    Ok(Json(
        state.orders.list_items_by_transaction(transaction_id).await?,
    ))
}

async fn list_customer_transactions(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    Ok(Json(
        state.orders.list_transactions_by_customer(customer_id).await?,
    ))
}

async fn list_my_transactions(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<TransactionDetail>>, AppError> {
    let transactions = state
        .orders
        .list_transactions_by_customer(session.customer_id)
        .await?;

    let mut detailed = Vec::with_capacity(transactions.len());
    for transaction in transactions {
        let items = state
            .orders
            .list_items_by_transaction(transaction.transaction_id)
            .await?;
        detailed.push(TransactionDetail { transaction, items });
    }
    Ok(Json(detailed))
}
