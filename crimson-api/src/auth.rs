use axum::{extract::State, routing::post, Extension, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crimson_core::account::NewAccount;
use crimson_order::SessionContext;

use crate::error::AppError;
use crate::middleware::auth::{ROLE_CUSTOMER, ROLE_STAFF};
use crate::middleware::{customer_auth_middleware, Claims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/v1/auth/logout", post(logout))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            customer_auth_middleware,
        ));

    Router::new()
        .route("/v1/auth/customers/register", post(register_customer))
        .route("/v1/auth/customers/login", post(login_customer))
        .route("/v1/auth/staff/register", post(register_staff))
        .route("/v1/auth/staff/login", post(login_staff))
        .merge(protected)
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))
}

fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Mints a token with a fresh session id. Reservations are keyed to the
/// session id, so every login starts with an empty cart.
fn issue_token(state: &AppState, sub: String, email: String, role: &str) -> Result<String, AppError> {
    let claims = Claims {
        sub,
        email,
        role: role.to_owned(),
        sid: Uuid::new_v4().to_string(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::ValidationError(
            "name and email are required".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(AppError::ValidationError(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

async fn register_customer(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_registration(&req)?;

    let account = NewAccount {
        name: req.name.clone(),
        password_hash: hash_password(&req.password)?,
        email: req.email.clone(),
    };
    let customer = state.accounts.create_customer(&account).await?;
    tracing::info!(customer_id = customer.customer_id, "customer registered");

    let token = issue_token(
        &state,
        customer.customer_id.to_string(),
        customer.email,
        ROLE_CUSTOMER,
    )?;
    Ok(Json(AuthResponse { token }))
}

async fn login_customer(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let customer = state
        .accounts
        .get_customer_by_email(&req.email)
        .await?
        .filter(|c| verify_password(&c.password_hash, &req.password))
        .ok_or_else(|| AppError::AuthenticationError("invalid email or password".to_string()))?;

    let token = issue_token(
        &state,
        customer.customer_id.to_string(),
        customer.email,
        ROLE_CUSTOMER,
    )?;
    Ok(Json(AuthResponse { token }))
}

async fn register_staff(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_registration(&req)?;

    let account = NewAccount {
        name: req.name.clone(),
        password_hash: hash_password(&req.password)?,
        email: req.email.clone(),
    };
    let staff = state.accounts.create_staff(&account).await?;
    tracing::info!(staff_id = staff.staff_id, "staff registered");

    let token = issue_token(&state, staff.staff_id.to_string(), staff.email, ROLE_STAFF)?;
    Ok(Json(AuthResponse { token }))
}

async fn login_staff(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let staff = state
        .accounts
        .get_staff_by_email(&req.email)
        .await?
        .filter(|s| verify_password(&s.password_hash, &req.password))
        .ok_or_else(|| AppError::AuthenticationError("invalid email or password".to_string()))?;

    let token = issue_token(&state, staff.staff_id.to_string(), staff.email, ROLE_STAFF)?;
    Ok(Json(AuthResponse { token }))
}

/// Logout is also the cart teardown: everything this session still holds
/// goes back on the shelf.
async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Json<serde_json::Value> {
    let released = state.cart.release_all(&session).await;
    Json(json!({ "released": released }))
}
