//! crates/jobdigest_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The closed set of artifact kinds the generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationType {
    Summary,
    KeyPoints,
    Flashcards,
}

impl GenerationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationType::Summary => "summary",
            GenerationType::KeyPoints => "key_points",
            GenerationType::Flashcards => "flashcards",
        }
    }

    /// Parses one of the canonical type names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "summary" => Some(GenerationType::Summary),
            "key_points" => Some(GenerationType::KeyPoints),
            "flashcards" => Some(GenerationType::Flashcards),
            _ => None,
        }
    }

    /// Normalizes a client-facing alias to its canonical type, then validates
    /// membership in the closed set. Unmapped strings fall through to `parse`
    /// so callers may also submit canonical names directly.
    pub fn from_alias(s: &str) -> Option<Self> {
        let canonical = match s {
            "job_summary" => "summary",
            "key_requirements" => "key_points",
            "structured_data" => "flashcards",
            other => other,
        };
        Self::parse(canonical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    Completed,
    Processing,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Completed => "completed",
            GenerationStatus::Processing => "processing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(GenerationStatus::Completed),
            "processing" => Some(GenerationStatus::Processing),
            _ => None,
        }
    }
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// A persisted record pairing extracted source text with model-produced
/// output for one user submission. Write-once, single-owner.
#[derive(Debug, Clone)]
pub struct Generation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_content: String,
    pub generated_content: String,
    pub file_name: String,
    pub generation_type: GenerationType,
    pub user_given_name: Option<String>,
    pub upload_date: DateTime<Utc>,
    pub status: GenerationStatus,
    /// Present iff the input was a file upload that completed remote storage.
    pub original_file_url: Option<String>,
}

/// The fields a caller supplies when creating a `Generation`. The identifier,
/// timestamp, and default status are filled in by the record store.
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub user_id: Uuid,
    pub original_content: String,
    pub generated_content: String,
    pub file_name: String,
    pub generation_type: GenerationType,
    pub user_given_name: Option<String>,
    pub original_file_url: Option<String>,
}

/// Per-user counters for the dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardStats {
    pub total: i64,
    pub completed: i64,
    pub processing: i64,
    pub this_month: i64,
}
