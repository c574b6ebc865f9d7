//! crates/jobdigest_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    DashboardStats, Generation, GenerationType, NewGeneration, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<Option<UserCredentials>>;

    // --- Generation Records ---
    async fn create_generation(&self, new_generation: NewGeneration) -> PortResult<Generation>;

    /// Lists a user's generations, newest first.
    async fn list_generations_by_user(&self, user_id: Uuid) -> PortResult<Vec<Generation>>;

    /// Counts a user's records overall, by status, and since `month_start`.
    async fn dashboard_stats(
        &self,
        user_id: Uuid,
        month_start: DateTime<Utc>,
    ) -> PortResult<DashboardStats>;
}

#[async_trait]
pub trait ContentGenerationService: Send + Sync {
    /// Produces generated text for the given extracted text and artifact kind.
    async fn generate(&self, text: &str, kind: GenerationType) -> PortResult<String>;
}

#[async_trait]
pub trait FileStorageService: Send + Sync {
    /// Stores raw file bytes under `file_name` and returns the public URL.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> PortResult<String>;
}
