//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{blob::HttpBlobAdapter, db::DbAdapter, generator::OpenAiGenerationAdapter},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, session_handler, signup_handler},
        generations::{
            create_generation_handler, dashboard_stats_handler, list_generations_handler,
        },
        middleware::require_auth,
        state::AppState,
        token::TokenManager,
        upload::upload_handler,
        ApiDoc,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use jobdigest_core::ports::FileStorageService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// The 10MB per-file ceiling is enforced inside the upload handler so it can
// answer with its own 413 body; the transport limit above it only has to be
// generous enough to let the multipart framing through.
const BODY_LIMIT_BYTES: usize = 25 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    // A missing generation key soft-fails: the adapter answers every request
    // with a placeholder and the pipeline still persists records.
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; generation will return a placeholder.");
    }
    let generator = Arc::new(OpenAiGenerationAdapter::new(
        config.gemini_api_key.as_deref(),
        &config.generation_api_base,
        config.generation_model.clone(),
    ));

    // A missing blob token hard-fails file ingestion, so storage stays absent
    // rather than being stubbed.
    let storage: Option<Arc<dyn FileStorageService>> = match &config.blob_read_write_token {
        Some(token) => Some(Arc::new(HttpBlobAdapter::new(
            config.blob_store_url.clone(),
            token.clone(),
        ))),
        None => {
            warn!("BLOB_READ_WRITE_TOKEN is not set; file uploads will be rejected.");
            None
        }
    };

    let tokens = Arc::new(TokenManager::new(&config.jwt_secret));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        config: config.clone(),
        generator,
        storage,
        tokens,
    });

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/session", get(session_handler))
        .route(
            "/generations-list",
            get(list_generations_handler).post(create_generation_handler),
        )
        .route("/dashboard-stats", get(dashboard_stats_handler))
        .route("/upload", post(upload_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
