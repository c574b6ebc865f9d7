//! services/api/src/web/upload.rs
//!
//! The ingestion handler: one submitted item is authenticated, extracted,
//! sent to the generator, and persisted, all within the request. Every step
//! is a potential exit point; nothing is persisted until every upstream step
//! has succeeded, and nothing is retried.

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapters::blob::unique_blob_name;
use crate::extract::{extract_file_text, ExtractError};
use crate::web::state::AppState;
use crate::web::token::AuthUser;
use crate::web::{failure, port_failure, ApiFailure, Message};
use jobdigest_core::domain::{GenerationType, NewGeneration};

const MAX_FILE_SIZE_MB: usize = 10;
pub const MAX_FILE_SIZE_BYTES: usize = MAX_FILE_SIZE_MB * 1024 * 1024;

//=========================================================================================
// Form and Response Types
//=========================================================================================

/// A decoded multipart file part.
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The fields of one ingestion submission, decoded from multipart form data.
#[derive(Default)]
pub struct IngestForm {
    pub generation_type: Option<String>,
    pub input_type: Option<String>,
    pub content: Option<String>,
    pub user_id: Option<String>,
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub generated_content: String,
    pub message: String,
    pub id: Uuid,
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /upload - Ingest one submission (file, literal text, or URL)
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content_type = "multipart/form-data",
        description = "file or {inputType, content}, plus generationType and userId."),
    responses(
        (status = 200, description = "Content generated and saved", body = UploadResponse),
        (status = 400, description = "Validation failure", body = Message),
        (status = 403, description = "userId does not match the token subject", body = Message),
        (status = 413, description = "File exceeds the size ceiling", body = Message),
        (status = 500, description = "Extraction, generation, storage, or persistence failure", body = Message)
    ),
    security(("bearer_token" = []))
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiFailure> {
    let mut form = IngestForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or("unnamed_file").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    failure(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to read file bytes: {}", e),
                    )
                })?;
                form.file = Some(UploadedFile {
                    name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("generationType") => form.generation_type = Some(field_text(field).await?),
            Some("inputType") => form.input_type = Some(field_text(field).await?),
            Some("content") => form.content = Some(field_text(field).await?),
            Some("userId") => form.user_id = Some(field_text(field).await?),
            _ => {}
        }
    }

    let response = run_ingestion(&state, &user, form).await?;
    Ok((StatusCode::OK, Json(response)))
}

async fn field_text(field: Field<'_>) -> Result<String, ApiFailure> {
    field.text().await.map_err(|e| {
        failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read multipart data: {}", e),
        )
    })
}

//=========================================================================================
// The Ingestion Pipeline
//=========================================================================================

/// Runs the ingestion steps for one decoded submission. Split from the axum
/// handler so the pipeline can be exercised without a live HTTP stack.
pub async fn run_ingestion(
    state: &AppState,
    user: &AuthUser,
    form: IngestForm,
) -> Result<UploadResponse, ApiFailure> {
    // 1. Normalize the caller-supplied alias, then validate membership in the
    // closed generation-type set.
    let kind = form
        .generation_type
        .as_deref()
        .and_then(GenerationType::from_alias)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Invalid generation type selected."))?;

    // 2. Ownership comes from the verified token. A client-supplied userId is
    // accepted for interface compatibility but must agree with it.
    if let Some(claimed) = form.user_id.as_deref().filter(|s| !s.is_empty()) {
        let claimed = Uuid::parse_str(claimed)
            .map_err(|_| failure(StatusCode::FORBIDDEN, "Forbidden."))?;
        if claimed != user.id {
            return Err(failure(StatusCode::FORBIDDEN, "Forbidden."));
        }
    }

    // 3. Resolve the input modality.
    let (file_content, file_name, original_file_url) =
        match (form.input_type.as_deref(), form.file, form.content) {
            (Some("file"), Some(file), _) => ingest_file(state, file).await?,
            (Some("text"), _, Some(content)) if !content.is_empty() => {
                (content, "Submitted Text".to_string(), None)
            }
            (Some("url"), _, Some(content)) if !content.is_empty() => {
                (content, "Submitted URL".to_string(), None)
            }
            _ => {
                return Err(failure(
                    StatusCode::BAD_REQUEST,
                    "No file, text, or URL provided.",
                ))
            }
        };

    // 4. The extractor may legally return whitespace; reject it here.
    if file_content.trim().is_empty() {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "No text content could be extracted from the file.",
        ));
    }

    // 5. Generate the artifact.
    let generated_content = state
        .generator
        .generate(&file_content, kind)
        .await
        .map_err(|e| {
            error!("Generation failed: {:?}", e);
            port_failure(e)
        })?;

    // 6. Persist the completed record.
    let record = state
        .db
        .create_generation(NewGeneration {
            user_id: user.id,
            original_content: file_content,
            generated_content: generated_content.clone(),
            file_name,
            generation_type: kind,
            user_given_name: None,
            original_file_url,
        })
        .await
        .map_err(|e| {
            error!("Failed to persist generation: {:?}", e);
            port_failure(e)
        })?;

    Ok(UploadResponse {
        generated_content,
        message: "Content generated and saved successfully!".to_string(),
        id: record.id,
    })
}

/// The file branch: storage configuration is checked before size and type
/// validation, so an unconfigured store aborts before any work is wasted.
/// The raw bytes are uploaded only after extraction succeeds.
async fn ingest_file(
    state: &AppState,
    file: UploadedFile,
) -> Result<(String, String, Option<String>), ApiFailure> {
    let storage = state.storage.as_ref().ok_or_else(|| {
        failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error: Blob storage not available.",
        )
    })?;

    if file.bytes.len() > MAX_FILE_SIZE_BYTES {
        return Err(failure(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("File size exceeds the limit of {}MB.", MAX_FILE_SIZE_MB),
        ));
    }

    // Extraction is CPU-bound (PDF parsing, a tesseract subprocess wait), so
    // it runs on the blocking pool rather than a runtime worker.
    let (extracted, file) = tokio::task::spawn_blocking(move || {
        let extracted = extract_file_text(&file.bytes, &file.content_type, &file.name);
        (extracted, file)
    })
    .await
    .map_err(|e| {
        error!("Extraction task failed: {:?}", e);
        failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to process the uploaded file.",
        )
    })?;
    let text = extracted.map_err(|e| match &e {
        ExtractError::UnsupportedMediaType(_) => failure(StatusCode::BAD_REQUEST, e.to_string()),
        _ => failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    })?;

    let blob_name = unique_blob_name(&file.name);
    let url = storage.store(&blob_name, &file.bytes).await.map_err(|e| {
        error!("Blob upload failed: {:?}", e);
        port_failure(e)
    })?;

    Ok((text, file.name, Some(url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use jobdigest_core::domain::{
        DashboardStats, Generation, GenerationStatus, NewGeneration, User, UserCredentials,
    };
    use jobdigest_core::ports::{
        ContentGenerationService, DatabaseService, FileStorageService, PortError, PortResult,
    };
    use std::sync::Mutex;
    use tracing::Level;

    struct MockDb {
        generations: Mutex<Vec<Generation>>,
    }

    impl MockDb {
        fn new() -> Self {
            Self {
                generations: Mutex::new(Vec::new()),
            }
        }

        fn stored(&self) -> Vec<Generation> {
            self.generations.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DatabaseService for MockDb {
        async fn create_user(&self, _username: &str, _password_hash: &str) -> PortResult<User> {
            Err(PortError::Unexpected("not used in these tests".to_string()))
        }

        async fn get_user_by_username(
            &self,
            _username: &str,
        ) -> PortResult<Option<UserCredentials>> {
            Ok(None)
        }

        async fn create_generation(&self, new_generation: NewGeneration) -> PortResult<Generation> {
            let generation = Generation {
                id: Uuid::new_v4(),
                user_id: new_generation.user_id,
                original_content: new_generation.original_content,
                generated_content: new_generation.generated_content,
                file_name: new_generation.file_name,
                generation_type: new_generation.generation_type,
                user_given_name: new_generation.user_given_name,
                upload_date: Utc::now(),
                status: GenerationStatus::Completed,
                original_file_url: new_generation.original_file_url,
            };
            self.generations.lock().unwrap().push(generation.clone());
            Ok(generation)
        }

        async fn list_generations_by_user(&self, user_id: Uuid) -> PortResult<Vec<Generation>> {
            Ok(self
                .stored()
                .into_iter()
                .filter(|g| g.user_id == user_id)
                .collect())
        }

        async fn dashboard_stats(
            &self,
            user_id: Uuid,
            month_start: DateTime<Utc>,
        ) -> PortResult<DashboardStats> {
            let records = self.list_generations_by_user(user_id).await?;
            Ok(DashboardStats {
                total: records.len() as i64,
                completed: records
                    .iter()
                    .filter(|g| g.status == GenerationStatus::Completed)
                    .count() as i64,
                processing: records
                    .iter()
                    .filter(|g| g.status == GenerationStatus::Processing)
                    .count() as i64,
                this_month: records
                    .iter()
                    .filter(|g| g.upload_date >= month_start)
                    .count() as i64,
            })
        }
    }

    struct MockGenerator;

    #[async_trait]
    impl ContentGenerationService for MockGenerator {
        async fn generate(&self, _text: &str, kind: GenerationType) -> PortResult<String> {
            Ok(format!("GENERATED:{}", kind.as_str()))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ContentGenerationService for FailingGenerator {
        async fn generate(&self, _text: &str, _kind: GenerationType) -> PortResult<String> {
            Err(PortError::Unexpected(
                "Failed to generate content with AI.".to_string(),
            ))
        }
    }

    struct MockStorage;

    #[async_trait]
    impl FileStorageService for MockStorage {
        async fn store(&self, file_name: &str, _bytes: &[u8]) -> PortResult<String> {
            Ok(format!("https://blob.example/{}", file_name))
        }
    }

    fn test_config() -> crate::config::Config {
        crate::config::Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            database_url: "postgres://unused".to_string(),
            log_level: Level::INFO,
            jwt_secret: "test_secret".to_string(),
            gemini_api_key: None,
            blob_read_write_token: None,
            blob_store_url: "https://blob.example".to_string(),
            generation_model: "test-model".to_string(),
            generation_api_base: "http://unused".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
        }
    }

    fn test_state(
        with_storage: bool,
        generator: Arc<dyn ContentGenerationService>,
    ) -> (AppState, Arc<MockDb>) {
        let db = Arc::new(MockDb::new());
        let state = AppState {
            db: db.clone(),
            config: Arc::new(test_config()),
            generator,
            storage: if with_storage {
                Some(Arc::new(MockStorage))
            } else {
                None
            },
            tokens: Arc::new(crate::web::token::TokenManager::new("test_secret")),
        };
        (state, db)
    }

    fn caller() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
        }
    }

    fn text_form(generation_type: &str, content: &str) -> IngestForm {
        IngestForm {
            generation_type: Some(generation_type.to_string()),
            input_type: Some("text".to_string()),
            content: Some(content.to_string()),
            user_id: None,
            file: None,
        }
    }

    #[tokio::test]
    async fn text_submission_creates_a_completed_record() {
        let (state, db) = test_state(false, Arc::new(MockGenerator));
        let user = caller();

        let response = run_ingestion(
            &state,
            &user,
            text_form("summary", "Acme Corp seeks a backend engineer..."),
        )
        .await
        .unwrap();

        assert!(!response.generated_content.is_empty());
        assert_eq!(response.message, "Content generated and saved successfully!");

        let stored = db.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, response.id);
        assert_eq!(stored[0].user_id, user.id);
        assert_eq!(stored[0].file_name, "Submitted Text");
        assert_eq!(stored[0].original_content, "Acme Corp seeks a backend engineer...");
        assert_eq!(stored[0].status, GenerationStatus::Completed);
        assert!(stored[0].original_file_url.is_none());
    }

    #[tokio::test]
    async fn url_submission_gets_the_synthetic_url_filename() {
        let (state, db) = test_state(false, Arc::new(MockGenerator));
        run_ingestion(&state, &caller(), {
            let mut form = text_form("summary", "https://example.com/posting");
            form.input_type = Some("url".to_string());
            form
        })
        .await
        .unwrap();
        assert_eq!(db.stored()[0].file_name, "Submitted URL");
    }

    #[tokio::test]
    async fn identical_submissions_create_distinct_records() {
        let (state, db) = test_state(false, Arc::new(MockGenerator));
        let user = caller();

        let first = run_ingestion(&state, &user, text_form("summary", "same text"))
            .await
            .unwrap();
        let second = run_ingestion(&state, &user, text_form("summary", "same text"))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(db.stored().len(), 2);
    }

    #[tokio::test]
    async fn aliases_are_normalized_before_generation() {
        let (state, db) = test_state(false, Arc::new(MockGenerator));
        let response = run_ingestion(&state, &caller(), text_form("job_summary", "text"))
            .await
            .unwrap();
        assert_eq!(response.generated_content, "GENERATED:summary");
        assert_eq!(db.stored()[0].generation_type, GenerationType::Summary);
    }

    #[tokio::test]
    async fn unknown_generation_type_is_rejected_without_a_record() {
        let (state, db) = test_state(false, Arc::new(MockGenerator));
        let err = run_ingestion(&state, &caller(), text_form("cover_letter", "text"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1 .0.message, "Invalid generation type selected.");
        assert!(db.stored().is_empty());
    }

    #[tokio::test]
    async fn missing_payload_is_rejected() {
        let (state, _) = test_state(true, Arc::new(MockGenerator));
        for form in [
            IngestForm {
                generation_type: Some("summary".to_string()),
                input_type: Some("file".to_string()),
                ..Default::default()
            },
            IngestForm {
                generation_type: Some("summary".to_string()),
                input_type: Some("text".to_string()),
                ..Default::default()
            },
            IngestForm {
                generation_type: Some("summary".to_string()),
                input_type: Some("carrier_pigeon".to_string()),
                content: Some("text".to_string()),
                ..Default::default()
            },
        ] {
            let err = run_ingestion(&state, &caller(), form).await.unwrap_err();
            assert_eq!(err.0, StatusCode::BAD_REQUEST);
            assert_eq!(err.1 .0.message, "No file, text, or URL provided.");
        }
    }

    #[tokio::test]
    async fn whitespace_only_content_is_rejected() {
        let (state, db) = test_state(false, Arc::new(MockGenerator));
        let err = run_ingestion(&state, &caller(), text_form("summary", "   "))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.1 .0.message,
            "No text content could be extracted from the file."
        );
        assert!(db.stored().is_empty());
    }

    #[tokio::test]
    async fn mismatched_user_id_is_forbidden() {
        let (state, db) = test_state(false, Arc::new(MockGenerator));
        let mut form = text_form("summary", "text");
        form.user_id = Some(Uuid::new_v4().to_string());
        let err = run_ingestion(&state, &caller(), form).await.unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
        assert!(db.stored().is_empty());
    }

    #[tokio::test]
    async fn matching_user_id_is_accepted() {
        let (state, _) = test_state(false, Arc::new(MockGenerator));
        let user = caller();
        let mut form = text_form("summary", "text");
        form.user_id = Some(user.id.to_string());
        assert!(run_ingestion(&state, &user, form).await.is_ok());
    }

    fn file_form(name: &str, content_type: &str, bytes: Vec<u8>) -> IngestForm {
        IngestForm {
            generation_type: Some("summary".to_string()),
            input_type: Some("file".to_string()),
            content: None,
            user_id: None,
            file: Some(UploadedFile {
                name: name.to_string(),
                content_type: content_type.to_string(),
                bytes,
            }),
        }
    }

    #[tokio::test]
    async fn plain_text_file_round_trips_and_stores_a_url() {
        let (state, db) = test_state(true, Arc::new(MockGenerator));
        let body = "Acme Corp seeks a backend engineer with Rust experience.";

        run_ingestion(
            &state,
            &caller(),
            file_form("notes.txt", "text/plain", body.as_bytes().to_vec()),
        )
        .await
        .unwrap();

        let stored = db.stored();
        assert_eq!(stored[0].original_content, body);
        assert_eq!(stored[0].file_name, "notes.txt");
        let url = stored[0].original_file_url.as_deref().unwrap();
        assert!(url.starts_with("https://blob.example/notes_"));
        assert!(url.ends_with(".txt"));
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_extraction() {
        let (state, db) = test_state(true, Arc::new(MockGenerator));
        let bytes = vec![b'a'; MAX_FILE_SIZE_BYTES + 1];
        let err = run_ingestion(&state, &caller(), file_form("big.txt", "text/plain", bytes))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.1 .0.message, "File size exceeds the limit of 10MB.");
        assert!(db.stored().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_storage_fails_file_ingestion() {
        let (state, db) = test_state(false, Arc::new(MockGenerator));
        let err = run_ingestion(
            &state,
            &caller(),
            file_form("notes.txt", "text/plain", b"hello".to_vec()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.1 .0.message,
            "Server configuration error: Blob storage not available."
        );
        assert!(db.stored().is_empty());
    }

    #[tokio::test]
    async fn storage_configuration_is_checked_before_the_size_ceiling() {
        let (state, _) = test_state(false, Arc::new(MockGenerator));
        let bytes = vec![b'a'; MAX_FILE_SIZE_BYTES + 1];
        let err = run_ingestion(&state, &caller(), file_form("big.txt", "text/plain", bytes))
            .await
            .unwrap_err();
        // Config failure wins over the 413 that would otherwise apply.
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unsupported_file_type_names_the_offender() {
        let (state, db) = test_state(true, Arc::new(MockGenerator));
        let err = run_ingestion(
            &state,
            &caller(),
            file_form("tool.exe", "application/octet-stream", b"MZ\x00".to_vec()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.1 .0.message,
            "Unsupported file type: application/octet-stream"
        );
        assert!(db.stored().is_empty());
    }

    #[tokio::test]
    async fn dashboard_stats_start_at_zero_and_count_this_month() {
        let (state, db) = test_state(false, Arc::new(MockGenerator));
        let user = caller();
        let month_start = Utc::now() - chrono::Duration::hours(1);

        let stats = db.dashboard_stats(user.id, month_start).await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.processing, 0);
        assert_eq!(stats.this_month, 0);

        run_ingestion(&state, &user, text_form("summary", "first posting"))
            .await
            .unwrap();
        run_ingestion(&state, &user, text_form("key_points", "second posting"))
            .await
            .unwrap();

        let stats = db.dashboard_stats(user.id, month_start).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.processing, 0);
        assert_eq!(stats.this_month, 2);

        // Records created before the boundary are excluded from the
        // this-month count but not the total.
        let next_month = Utc::now() + chrono::Duration::hours(1);
        let stats = db.dashboard_stats(user.id, next_month).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.this_month, 0);

        // Another user's records never leak into the caller's counters.
        let stranger = caller();
        let stats = db.dashboard_stats(stranger.id, month_start).await.unwrap();
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn generator_failure_persists_nothing() {
        let (state, db) = test_state(false, Arc::new(FailingGenerator));
        let err = run_ingestion(&state, &caller(), text_form("summary", "text"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.1 .0.message, "Failed to generate content with AI.");
        assert!(db.stored().is_empty());
    }
}
