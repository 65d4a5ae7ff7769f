use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crimson_order::SessionContext;

pub const ROLE_CUSTOMER: &str = "CUSTOMER";
pub const ROLE_STAFF: &str = "STAFF";

/// JWT claims for both identity spaces. `sid` is the cart session id:
/// reservations in the inventory are owned by it, so a fresh login means a
/// fresh, empty cart.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub sid: String,
    pub exp: usize,
}

fn decode_claims(state: &AppState, req: &Request) -> Result<Claims, StatusCode> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(token_data.claims)
}

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = decode_claims(&state, &req)?;

    if claims.role != ROLE_CUSTOMER {
        return Err(StatusCode::FORBIDDEN);
    }

    let customer_id: i64 = claims.sub.parse().map_err(|_| StatusCode::UNAUTHORIZED)?;
    let session = SessionContext {
        customer_id,
        session_id: claims.sid.clone(),
    };

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = decode_claims(&state, &req)?;

    if claims.role != ROLE_STAFF {
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
