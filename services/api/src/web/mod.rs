pub mod auth;
pub mod generations;
pub mod middleware;
pub mod state;
pub mod token;
pub mod upload;

pub use middleware::require_auth;

use axum::http::StatusCode;
use axum::Json;
use jobdigest_core::ports::PortError;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// Shared Failure Shape
//=========================================================================================

/// Every failure response carries a human-readable JSON `message` body.
#[derive(Debug, Serialize, ToSchema)]
pub struct Message {
    pub message: String,
}

/// The error half of every handler's `Result`.
pub type ApiFailure = (StatusCode, Json<Message>);

pub fn failure(status: StatusCode, message: impl Into<String>) -> ApiFailure {
    (
        status,
        Json(Message {
            message: message.into(),
        }),
    )
}

/// Collaborator failures caught at the handler boundary become a 500 carrying
/// the collaborator's own message.
pub fn port_failure(err: PortError) -> ApiFailure {
    let message = match err {
        PortError::NotFound(m) | PortError::Conflict(m) | PortError::Unexpected(m) => m,
    };
    failure(StatusCode::INTERNAL_SERVER_ERROR, message)
}

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::session_handler,
        generations::list_generations_handler,
        generations::create_generation_handler,
        generations::dashboard_stats_handler,
        upload::upload_handler,
    ),
    components(schemas(
        Message,
        auth::SignupRequest,
        auth::LoginRequest,
        auth::UserResponse,
        auth::SignupResponse,
        auth::LoginResponse,
        auth::SessionResponse,
        generations::GenerationResponse,
        generations::GenerationsListResponse,
        generations::CreateGenerationRequest,
        generations::CreateGenerationResponse,
        generations::DashboardStatsResponse,
        upload::UploadResponse,
    )),
    tags(
        (name = "JobDigest API", description = "API endpoints for document-to-artifact generation.")
    )
)]
pub struct ApiDoc;
