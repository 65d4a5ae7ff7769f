use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crimson_core::inventory::{BookCopy, NewCopy};
use crimson_core::CopyStatus;

use crate::error::AppError;
use crate::middleware::staff_auth_middleware;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/v1/copies", post(create_copy))
        .route("/v1/copies/{copy_id}", put(update_copy).delete(delete_copy))
        .route("/v1/copies/{copy_id}/status", put(set_copy_status))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            staff_auth_middleware,
        ));

    Router::new()
        .route("/v1/copies", get(list_copies))
        .route("/v1/copies/{copy_id}", get(get_copy))
        .route("/v1/copies/status/{status}", get(list_copies_by_status))
        .route("/v1/books/{isbn}/copies", get(list_book_copies))
        .merge(staff)
}

#[derive(Debug, Deserialize)]
struct ListCopiesQuery {
    status: Option<String>,
}

async fn list_copies(
    State(state): State<AppState>,
    Query(query): Query<ListCopiesQuery>,
) -> Result<Json<Vec<BookCopy>>, AppError> {
    let copies = match query.status.as_deref() {
        Some(raw) => {
            let status: CopyStatus = raw
                .parse()
                .map_err(|e: String| AppError::ValidationError(e))?;
            state.inventory.list_copies_by_status(status).await?
        }
        None => state.inventory.list_copies().await?,
    };
    Ok(Json(copies))
}

async fn list_copies_by_status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<BookCopy>>, AppError> {
    let status: CopyStatus = raw
        .parse()
        .map_err(|e: String| AppError::ValidationError(e))?;
    Ok(Json(state.inventory.list_copies_by_status(status).await?))
}

async fn get_copy(
    State(state): State<AppState>,
    Path(copy_id): Path<i64>,
) -> Result<Json<BookCopy>, AppError> {
    let copy = state
        .inventory
        .get_copy(copy_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("copy {} not found", copy_id)))?;
    Ok(Json(copy))
}

async fn list_book_copies(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<Vec<BookCopy>>, AppError> {
    Ok(Json(state.inventory.list_copies_by_isbn(&isbn).await?))
}

async fn create_copy(
    State(state): State<AppState>,
    Json(copy): Json<NewCopy>,
) -> Result<(StatusCode, Json<BookCopy>), AppError> {
    if copy.price_cents < 0 {
        return Err(AppError::ValidationError(
            "price_cents must not be negative".to_string(),
        ));
    }
    let created = state.inventory.create_copy(&copy).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Edits descriptive fields only. Status changes go through the dedicated
/// status route so they stay compare-and-set.
async fn update_copy(
    State(state): State<AppState>,
    Path(copy_id): Path<i64>,
    Json(mut copy): Json<BookCopy>,
) -> Result<Json<BookCopy>, AppError> {
    copy.copy_id = copy_id;
    state.inventory.update_copy(&copy).await?;
    let fresh = state
        .inventory
        .get_copy(copy_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("copy {} not found", copy_id)))?;
    Ok(Json(fresh))
}

async fn delete_copy(
    State(state): State<AppState>,
    Path(copy_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.inventory.delete_copy(copy_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SetStatusRequest {
    /// The status the caller believes the copy is in. A stale value means
    /// the update conflicts instead of clobbering someone else's change.
    expected: String,
    status: String,
}

async fn set_copy_status(
    State(state): State<AppState>,
    Path(copy_id): Path<i64>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<BookCopy>, AppError> {
    let expected: CopyStatus = req
        .expected
        .parse()
        .map_err(|e: String| AppError::ValidationError(e))?;
    let status: CopyStatus = req
        .status
        .parse()
        .map_err(|e: String| AppError::ValidationError(e))?;

    state
        .inventory
        .set_copy_status(copy_id, expected, status)
        .await?;

    let fresh = state
        .inventory
        .get_copy(copy_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("copy {} not found", copy_id)))?;
    Ok(Json(fresh))
}
