//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::token::TokenManager;
use jobdigest_core::ports::{ContentGenerationService, DatabaseService, FileStorageService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// `storage` is `None` when no blob-store token is configured; the file
/// ingestion path hard-fails in that case, while `generator` always exists
/// and soft-fails internally when its credential is absent.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub generator: Arc<dyn ContentGenerationService>,
    pub storage: Option<Arc<dyn FileStorageService>>,
    pub tokens: Arc<TokenManager>,
}
