//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobdigest_core::domain::{
    DashboardStats, Generation, GenerationStatus, GenerationType, NewGeneration, User,
    UserCredentials,
};
use jobdigest_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Postgres error code for a unique-constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    username: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct GenerationRecord {
    id: Uuid,
    user_id: Uuid,
    original_content: String,
    generated_content: String,
    file_name: String,
    generation_type: String,
    user_given_name: Option<String>,
    upload_date: DateTime<Utc>,
    status: String,
    original_file_url: Option<String>,
}
impl GenerationRecord {
    fn to_domain(self) -> PortResult<Generation> {
        let generation_type = GenerationType::parse(&self.generation_type).ok_or_else(|| {
            PortError::Unexpected(format!(
                "Stored generation {} has unknown type '{}'",
                self.id, self.generation_type
            ))
        })?;
        let status = GenerationStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!(
                "Stored generation {} has unknown status '{}'",
                self.id, self.status
            ))
        })?;
        Ok(Generation {
            id: self.id,
            user_id: self.user_id,
            original_content: self.original_content,
            generated_content: self.generated_content,
            file_name: self.file_name,
            generation_type,
            user_given_name: self.user_given_name,
            upload_date: self.upload_date,
            status,
            original_file_url: self.original_file_url,
        })
    }
}

#[derive(FromRow)]
struct StatsRecord {
    total: i64,
    completed: i64,
    processing: i64,
    this_month: i64,
}
impl StatsRecord {
    fn to_domain(self) -> DashboardStats {
        DashboardStats {
            total: self.total,
            completed: self.completed,
            processing: self.processing,
            this_month: self.this_month,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                PortError::Conflict("Username already taken.".to_string())
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn create_generation(&self, new_generation: NewGeneration) -> PortResult<Generation> {
        let record = sqlx::query_as::<_, GenerationRecord>(
            "INSERT INTO generations \
             (id, user_id, original_content, generated_content, file_name, generation_type, \
              user_given_name, upload_date, status, original_file_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed', $9) \
             RETURNING id, user_id, original_content, generated_content, file_name, \
                       generation_type, user_given_name, upload_date, status, original_file_url",
        )
        .bind(Uuid::new_v4())
        .bind(new_generation.user_id)
        .bind(&new_generation.original_content)
        .bind(&new_generation.generated_content)
        .bind(&new_generation.file_name)
        .bind(new_generation.generation_type.as_str())
        .bind(&new_generation.user_given_name)
        .bind(Utc::now())
        .bind(&new_generation.original_file_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn list_generations_by_user(&self, user_id: Uuid) -> PortResult<Vec<Generation>> {
        let records = sqlx::query_as::<_, GenerationRecord>(
            "SELECT id, user_id, original_content, generated_content, file_name, \
                    generation_type, user_given_name, upload_date, status, original_file_url \
             FROM generations WHERE user_id = $1 ORDER BY upload_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn dashboard_stats(
        &self,
        user_id: Uuid,
        month_start: DateTime<Utc>,
    ) -> PortResult<DashboardStats> {
        let record = sqlx::query_as::<_, StatsRecord>(
            "SELECT count(*) AS total, \
                    count(*) FILTER (WHERE status = 'completed') AS completed, \
                    count(*) FILTER (WHERE status = 'processing') AS processing, \
                    count(*) FILTER (WHERE upload_date >= $2) AS this_month \
             FROM generations WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(month_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(generation_type: &str, status: &str) -> GenerationRecord {
        GenerationRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            original_content: "text".to_string(),
            generated_content: "generated".to_string(),
            file_name: "Submitted Text".to_string(),
            generation_type: generation_type.to_string(),
            user_given_name: None,
            upload_date: Utc::now(),
            status: status.to_string(),
            original_file_url: None,
        }
    }

    #[test]
    fn generation_record_maps_to_domain_enums() {
        let generation = record("key_points", "processing").to_domain().unwrap();
        assert_eq!(generation.generation_type, GenerationType::KeyPoints);
        assert_eq!(generation.status, GenerationStatus::Processing);
    }

    #[test]
    fn unknown_stored_type_is_an_error() {
        assert!(record("novel", "completed").to_domain().is_err());
    }

    #[test]
    fn unknown_stored_status_is_an_error() {
        assert!(record("summary", "queued").to_domain().is_err());
    }
}
