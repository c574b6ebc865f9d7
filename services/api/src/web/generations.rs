//! services/api/src/web/generations.rs
//!
//! Record listing, direct record creation, and dashboard statistics.
//!
//! Ownership is derived from the verified token: the `userId` the client
//! supplies is kept for interface compatibility but must match the token's
//! subject, closing the confused-deputy gap a trusted client id would open.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;
use crate::web::token::AuthUser;
use crate::web::{failure, ApiFailure, Message};
use jobdigest_core::domain::{Generation, GenerationType, NewGeneration};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize)]
pub struct OwnerQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
}

/// The wire shape of a persisted generation record.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_content: String,
    pub generated_content: String,
    pub file_name: String,
    pub generation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_given_name: Option<String>,
    pub upload_date: DateTime<Utc>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_file_url: Option<String>,
}

impl From<Generation> for GenerationResponse {
    fn from(g: Generation) -> Self {
        Self {
            id: g.id,
            user_id: g.user_id,
            original_content: g.original_content,
            generated_content: g.generated_content,
            file_name: g.file_name,
            generation_type: g.generation_type.as_str().to_string(),
            user_given_name: g.user_given_name,
            upload_date: g.upload_date,
            status: g.status.as_str().to_string(),
            original_file_url: g.original_file_url,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GenerationsListResponse {
    pub generations: Vec<GenerationResponse>,
}

#[derive(Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateGenerationRequest {
    pub user_id: Option<Uuid>,
    pub original_content: Option<String>,
    pub generated_content: Option<String>,
    pub file_name: Option<String>,
    pub generation_type: Option<String>,
    pub user_given_name: Option<String>,
    pub original_file_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateGenerationResponse {
    pub message: String,
    pub generation: GenerationResponse,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardStatsResponse {
    pub total: i64,
    pub completed: i64,
    pub processing: i64,
    #[serde(rename = "thisMonth")]
    pub this_month: i64,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /generations-list - List the caller's generations, newest first
#[utoipa::path(
    get,
    path = "/generations-list",
    params(("userId" = Uuid, Query, description = "Owner id; must match the token subject.")),
    responses(
        (status = 200, description = "The caller's generations", body = GenerationsListResponse),
        (status = 401, description = "Missing userId or invalid token", body = Message),
        (status = 403, description = "userId does not match the token subject", body = Message)
    ),
    security(("bearer_token" = []))
)]
pub async fn list_generations_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, ApiFailure> {
    let owner = require_owner(&user, query.user_id)?;

    let generations = state
        .db
        .list_generations_by_user(owner)
        .await
        .map_err(|e| {
            error!("Failed to fetch generations: {:?}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch generations.",
            )
        })?;

    let response = GenerationsListResponse {
        generations: generations.into_iter().map(Into::into).collect(),
    };
    Ok((StatusCode::OK, Json(response)))
}

/// POST /generations-list - Create a record directly, bypassing ingestion
#[utoipa::path(
    post,
    path = "/generations-list",
    request_body = CreateGenerationRequest,
    responses(
        (status = 201, description = "Generation created", body = CreateGenerationResponse),
        (status = 400, description = "Missing or invalid fields", body = Message),
        (status = 403, description = "userId does not match the token subject", body = Message),
        (status = 500, description = "Persistence failure", body = Message)
    ),
    security(("bearer_token" = []))
)]
pub async fn create_generation_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateGenerationRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let (Some(user_id), Some(original_content), Some(generated_content), Some(file_name), Some(generation_type)) = (
        req.user_id,
        non_empty(req.original_content),
        non_empty(req.generated_content),
        non_empty(req.file_name),
        non_empty(req.generation_type),
    ) else {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "Missing required generation fields.",
        ));
    };

    let generation_type = GenerationType::parse(&generation_type).ok_or_else(|| {
        failure(StatusCode::BAD_REQUEST, "Invalid generation type selected.")
    })?;

    let owner = require_owner(&user, Some(user_id))?;

    let generation = state
        .db
        .create_generation(NewGeneration {
            user_id: owner,
            original_content,
            generated_content,
            file_name,
            generation_type,
            user_given_name: req.user_given_name,
            original_file_url: req.original_file_url,
        })
        .await
        .map_err(|e| {
            error!("Failed to create generation: {:?}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create generation.",
            )
        })?;

    let response = CreateGenerationResponse {
        message: "Generation created successfully!".to_string(),
        generation: generation.into(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /dashboard-stats - Per-user record counters
#[utoipa::path(
    get,
    path = "/dashboard-stats",
    params(("userId" = Uuid, Query, description = "Owner id; must match the token subject.")),
    responses(
        (status = 200, description = "Counters for the caller", body = DashboardStatsResponse),
        (status = 401, description = "Missing userId or invalid token", body = Message),
        (status = 403, description = "userId does not match the token subject", body = Message)
    ),
    security(("bearer_token" = []))
)]
pub async fn dashboard_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, ApiFailure> {
    let owner = require_owner(&user, query.user_id)?;

    let month_start = current_month_start(Utc::now()).ok_or_else(|| {
        failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch dashboard stats.",
        )
    })?;

    let stats = state
        .db
        .dashboard_stats(owner, month_start)
        .await
        .map_err(|e| {
            error!("Failed to fetch dashboard stats: {:?}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch dashboard stats.",
            )
        })?;

    let response = DashboardStatsResponse {
        total: stats.total,
        completed: stats.completed,
        processing: stats.processing,
        this_month: stats.this_month,
    };
    Ok((StatusCode::OK, Json(response)))
}

//=========================================================================================
// Helpers
//=========================================================================================

/// A missing id is 401 (the original contract); a mismatched one is 403.
fn require_owner(user: &AuthUser, claimed: Option<Uuid>) -> Result<Uuid, ApiFailure> {
    let claimed = claimed.ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Unauthorized"))?;
    if claimed != user.id {
        return Err(failure(StatusCode::FORBIDDEN, "Forbidden."));
    }
    Ok(claimed)
}

/// First instant of the current calendar month in UTC.
fn current_month_start(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
