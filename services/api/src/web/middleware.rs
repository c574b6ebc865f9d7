//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::web::state::AppState;
use crate::web::{failure, ApiFailure};

/// Middleware that validates the bearer token and extracts the caller identity.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// If missing or invalid, returns 401 Unauthorized. This single guard fronts
/// every protected route; no handler re-implements the check.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    // 1. Extract the Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "No token provided."))?;

    // 2. Extract the token segment after the scheme
    let token = bearer_token(auth_header)
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "No token provided."))?;

    // 3. Verify signature and expiry
    let user = state
        .tokens
        .verify(token)
        .map_err(|_| failure(StatusCode::UNAUTHORIZED, "Invalid token."))?;

    // 4. Insert the identity into request extensions
    req.extensions_mut().insert(user);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}

/// The token is the second whitespace-separated segment of the header value.
fn bearer_token(header: &str) -> Option<&str> {
    header.split_whitespace().nth(1)
}
