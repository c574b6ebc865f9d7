//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout, and session echo.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;
use crate::web::token::AuthUser;
use crate::web::{failure, ApiFailure, Message};
use jobdigest_core::ports::PortError;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// The user object returned by auth endpoints. Never carries a password field.
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Serialize, ToSchema)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: UserResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Missing username or password", body = Message),
        (status = 409, description = "Username already taken", body = Message),
        (status = 500, description = "Internal server error", body = Message)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    // 1. Validate presence of both fields
    if req.username.is_empty() || req.password.is_empty() {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "Username and password are required.",
        ));
    }

    // 2. Reject duplicate usernames up front
    let existing = state
        .db
        .get_user_by_username(&req.username)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {:?}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to register user.",
            )
        })?;
    if existing.is_some() {
        return Err(failure(StatusCode::CONFLICT, "Username already taken."));
    }

    // 3. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to register user.",
            )
        })?
        .to_string();

    // 4. Create user in database. The unique constraint still backstops a
    // concurrent signup that slipped past the lookup above.
    let user = state
        .db
        .create_user(&req.username, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(message) => failure(StatusCode::CONFLICT, message),
            other => {
                error!("Failed to create user: {:?}", other);
                failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to register user.",
                )
            }
        })?;

    let response = SignupResponse {
        message: "User registered successfully!".to_string(),
        user: UserResponse {
            id: user.id,
            username: user.username,
        },
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = Message),
        (status = 401, description = "Invalid credentials", body = Message),
        (status = 500, description = "Internal server error", body = Message)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    // 1. Validate presence of both fields
    if req.username.is_empty() || req.password.is_empty() {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "Username and password are required.",
        ));
    }

    // 2. Get user by username. An unknown name and a wrong password produce
    // the same response.
    let credentials = state
        .db
        .get_user_by_username(&req.username)
        .await
        .map_err(|e| {
            error!("Failed to get user: {:?}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to login.")
        })?
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Invalid credentials."))?;

    // 3. Verify password
    let parsed_hash = PasswordHash::new(&credentials.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to login.")
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid {
        return Err(failure(StatusCode::UNAUTHORIZED, "Invalid credentials."));
    }

    // 4. Issue a signed bearer token
    let token = state
        .tokens
        .issue(credentials.id, &credentials.username)
        .map_err(|e| {
            error!("Failed to issue token: {:?}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to login.")
        })?;

    let response = LoginResponse {
        message: "Login successful!".to_string(),
        token,
        user: UserResponse {
            id: credentials.id,
            username: credentials.username,
        },
    };
    Ok((StatusCode::OK, Json(response)))
}

/// POST /auth/logout - Stateless logout
///
/// Bearer tokens are not stored server-side; the client simply discards its
/// copy. The endpoint exists so the client flow has something to call.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logout successful", body = Message))
)]
pub async fn logout_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(Message {
            message: "Logged out.".to_string(),
        }),
    )
}

/// GET /auth/session - Echo the identity embedded in the verified token
#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Current session user", body = SessionResponse),
        (status = 401, description = "Missing or invalid token", body = Message)
    ),
    security(("bearer_token" = []))
)]
pub async fn session_handler(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(SessionResponse {
            user: UserResponse {
                id: user.id,
                username: user.username,
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_is_never_the_plaintext_and_verifies() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"hunter2", &salt)
            .unwrap()
            .to_string();

        assert_ne!(hash, "hunter2");
        assert!(!hash.contains("hunter2"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"hunter2", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong", &parsed)
            .is_err());
    }

    #[test]
    fn user_response_has_no_password_field() {
        let json = serde_json::to_value(UserResponse {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
        })
        .unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["id", "username"]);
    }
}
