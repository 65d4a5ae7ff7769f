use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use crimson_core::catalog::{Book, NewAuthor};

use crate::error::AppError;
use crate::middleware::staff_auth_middleware;
use crate::state::AppState;

/// Browsing is anonymous; writes are staff-only.
pub fn routes(state: &AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/v1/books", post(create_book))
        .route("/v1/books/{isbn}", axum::routing::put(update_book).delete(delete_book))
        .route("/v1/authors", post(create_author))
        .route(
            "/v1/authors/{author_id}",
            axum::routing::put(update_author).delete(delete_author),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            staff_auth_middleware,
        ));

    Router::new()
        .route("/v1/books", get(list_books))
        .route("/v1/books/{isbn}", get(get_book))
        .route("/v1/books/{isbn}/authors", get(list_book_authors))
        .route("/v1/authors", get(list_authors))
        .merge(staff)
}

async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.catalog.list_books().await?))
}

async fn get_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<Book>, AppError> {
    let book = state
        .catalog
        .get_book(&isbn)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("book {} not found", isbn)))?;
    Ok(Json(book))
}

async fn create_book(
    State(state): State<AppState>,
    Json(book): Json<Book>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    if book.isbn.trim().is_empty() {
        return Err(AppError::ValidationError("isbn is required".to_string()));
    }
    state.catalog.create_book(&book).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    Json(mut book): Json<Book>,
) -> Result<Json<Book>, AppError> {
    book.isbn = isbn;
    state.catalog.update_book(&book).await?;
    Ok(Json(book))
}

async fn delete_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_book(&isbn).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_authors(
    State(state): State<AppState>,
) -> Result<Json<Vec<crimson_core::catalog::Author>>, AppError> {
    Ok(Json(state.catalog.list_authors().await?))
}

async fn list_book_authors(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<Vec<crimson_core::catalog::Author>>, AppError> {
    Ok(Json(state.catalog.list_authors_by_isbn(&isbn).await?))
}

async fn create_author(
    State(state): State<AppState>,
    Json(author): Json<NewAuthor>,
) -> Result<(StatusCode, Json<crimson_core::catalog::Author>), AppError> {
    let created = state.catalog.create_author(&author).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_author(
    State(state): State<AppState>,
    Path(author_id): Path<i64>,
    Json(mut author): Json<crimson_core::catalog::Author>,
) -> Result<Json<crimson_core::catalog::Author>, AppError> {
    author.author_id = author_id;
    state.catalog.update_author(&author).await?;
    Ok(Json(author))
}

async fn delete_author(
    State(state): State<AppState>,
    Path(author_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_author(author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
