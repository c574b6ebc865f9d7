//! services/api/src/adapters/blob.rs
//!
//! This module contains the blob-storage adapter, which implements the
//! `FileStorageService` port by PUT-ing raw bytes to a Vercel-Blob-style
//! HTTP store and returning the resulting public URL.

use async_trait::async_trait;
use jobdigest_core::ports::{FileStorageService, PortError, PortResult};
use serde::Deserialize;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A storage adapter backed by an HTTP blob store.
#[derive(Clone)]
pub struct HttpBlobAdapter {
    http: reqwest::Client,
    store_url: String,
    token: String,
}

impl HttpBlobAdapter {
    /// Creates a new `HttpBlobAdapter`.
    pub fn new(store_url: String, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            store_url,
            token,
        }
    }
}

/// The body the blob store returns on a successful PUT.
#[derive(Deserialize)]
struct PutBlobResponse {
    url: String,
}

#[async_trait]
impl FileStorageService for HttpBlobAdapter {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> PortResult<String> {
        let url = format!("{}/{}", self.store_url.trim_end_matches('/'), file_name);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header("x-content-type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Blob upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "Blob store returned status {}",
                response.status()
            )));
        }

        let parsed: PutBlobResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Invalid blob store response: {}", e)))?;
        Ok(parsed.url)
    }
}

//=========================================================================================
// Blob Naming
//=========================================================================================

/// Derives a collision-free blob name from the original filename: a random
/// unique segment is inserted before the extension, which is preserved.
pub fn unique_blob_name(original_name: &str) -> String {
    let unique_id = Uuid::new_v4();
    match original_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => {
            format!("{}_{}.{}", stem, unique_id, extension)
        }
        _ => format!("{}_{}", original_name, unique_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_name_preserves_stem_and_extension() {
        let name = unique_blob_name("resume.pdf");
        assert!(name.starts_with("resume_"));
        assert!(name.ends_with(".pdf"));
        assert!(name.len() > "resume.pdf".len());
    }

    #[test]
    fn blob_name_without_extension_still_gets_a_unique_segment() {
        let name = unique_blob_name("README");
        assert!(name.starts_with("README_"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn consecutive_names_differ() {
        assert_ne!(unique_blob_name("a.txt"), unique_blob_name("a.txt"));
    }
}
