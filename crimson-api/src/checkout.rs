use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crimson_order::{CartEntry, CheckoutError, CheckoutRequest, SessionContext};

use crate::error::AppError;
use crate::middleware::customer_auth_middleware;
use crate::state::AppState;

/// The cart and checkout surface, all bound to the authenticated session.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/cart", get(get_cart).delete(clear_cart))
        .route("/v1/cart/items", post(add_cart_item))
        .route("/v1/cart/items/{copy_id}", delete(remove_cart_item))
        .route("/v1/checkout", post(checkout))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            customer_auth_middleware,
        ))
}

async fn get_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<CartEntry>>, AppError> {
    Ok(Json(state.cart.list(&session).await?))
}

#[derive(Debug, Deserialize)]
struct AddItemRequest {
    copy_id: i64,
}

async fn add_cart_item(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartEntry>), AppError> {
    let entry = state.cart.add(&session, req.copy_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn remove_cart_item(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(copy_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.cart.remove(&session, copy_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_cart(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Json<serde_json::Value> {
    let released = state.cart.release_all(&session).await;
    Json(json!({ "released": released }))
}

async fn checkout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(req): Json<CheckoutRequest>,
) -> Response {
    match state.checkout.checkout(&session, req).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        // Partial success keeps its structure: the client needs to know
        // which items went through and which went back to the cart.
        Err(CheckoutError::PartialFailure {
            transaction_id,
            purchased,
            failed,
        }) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "some items could not be purchased",
                "transaction_id": transaction_id,
                "purchased": purchased,
                "failed": failed,
            })),
        )
            .into_response(),
        Err(other) => AppError::from(other).into_response(),
    }
}
