//! Object storage for team logos and token metadata.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage is not configured")]
    NotConfigured,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload rejected with {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads (or overwrites) `path` in `bucket`.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Supabase Storage over its REST API, authenticated with the service key.
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .http
            .post(format!("{}/storage/v1/object/{bucket}/{path}", self.base_url))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", "true")
            .header("cache-control", "max-age=3600")
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected { status: status.as_u16(), body });
        }
        tracing::debug!(bucket, path, "object uploaded");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}

/// Storage used when no Supabase project is configured. Every upload fails,
/// so callers fall back to their placeholders.
pub struct DisabledStorage;

#[async_trait]
impl ObjectStorage for DisabledStorage {
    async fn upload(&self, _: &str, _: &str, _: Vec<u8>, _: &str) -> Result<(), StorageError> {
        Err(StorageError::NotConfigured)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("/{bucket}/{path}")
    }
}

/// In-process storage, for tests and local runs.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.get(&format!("{bucket}/{path}")).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<_> = objects.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.insert(format!("{bucket}/{path}"), (bytes, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supabase_public_urls_point_at_the_public_bucket() {
        let storage = SupabaseStorage::new("https://abc.supabase.co/", "key");
        assert_eq!(
            storage.public_url("team-assets", "team-logos/1.png"),
            "https://abc.supabase.co/storage/v1/object/public/team-assets/team-logos/1.png"
        );
    }

    #[tokio::test]
    async fn memory_storage_overwrites() {
        let storage = MemoryStorage::new();
        storage.upload("b", "p", vec![1], "image/png").await.unwrap();
        storage.upload("b", "p", vec![2], "image/webp").await.unwrap();
        assert_eq!(storage.get("b", "p"), Some((vec![2], "image/webp".to_string())));
    }

    #[tokio::test]
    async fn disabled_storage_refuses_uploads() {
        let err = DisabledStorage.upload("b", "p", vec![], "text/plain").await.unwrap_err();
        assert!(matches!(err, StorageError::NotConfigured));
    }
}
