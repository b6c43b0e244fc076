// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Storage client (REST API).
//!
//! Objects are addressed by their full path, percent-encoded into a single
//! URL segment. Requests are authorized with the signed-in user's ID token
//! so that storage security rules apply.

use super::{BackendError, BlobStore, IdentityCredential};
use async_trait::async_trait;
use serde::Deserialize;

pub(crate) const STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0/b";

/// Firebase Storage client for a single bucket.
#[derive(Clone)]
pub struct FirebaseStorageClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl FirebaseStorageClient {
    pub fn new(bucket: String) -> Self {
        Self::with_base_url(bucket, STORAGE_BASE_URL.to_string())
    }

    /// Point the client at another endpoint (e.g. the Storage emulator).
    pub fn with_base_url(bucket: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            bucket,
        }
    }

    fn objects_url(&self) -> String {
        format!("{}/{}/o", self.base_url, self.bucket)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.objects_url(), urlencoding::encode(path))
    }

    /// Check response status and return error if not successful.
    async fn check_response(
        &self,
        response: reqwest::Response,
        path: &str,
    ) -> Result<reqwest::Response, BackendError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 404 {
            return Err(BackendError::NotFound(path.to_string()));
        }

        tracing::warn!(path, status = %status, "Storage request failed");
        Err(BackendError::Blob(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait]
impl BlobStore for FirebaseStorageClient {
    async fn upload(
        &self,
        credential: &IdentityCredential,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let size = bytes.len();
        let response = self
            .http
            .post(self.objects_url())
            .query(&[("uploadType", "media"), ("name", path)])
            .header(reqwest::header::AUTHORIZATION, firebase_auth(credential))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| BackendError::Blob(format!("Upload request failed: {}", e)))?;

        self.check_response(response, path).await?;
        tracing::info!(path, size, "Object uploaded");
        Ok(())
    }

    async fn download_url(
        &self,
        credential: &IdentityCredential,
        path: &str,
    ) -> Result<String, BackendError> {
        let response = self
            .http
            .get(self.object_url(path))
            .header(reqwest::header::AUTHORIZATION, firebase_auth(credential))
            .send()
            .await
            .map_err(|e| BackendError::Blob(format!("Metadata request failed: {}", e)))?;

        let metadata: ObjectMetadata = self
            .check_response(response, path)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Blob(format!("Failed to parse metadata: {}", e)))?;

        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BackendError::Blob(format!("No download token for {}", path)))?;

        Ok(format!(
            "{}?alt=media&token={}",
            self.object_url(path),
            token
        ))
    }

    async fn delete(
        &self,
        credential: &IdentityCredential,
        path: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .delete(self.object_url(path))
            .header(reqwest::header::AUTHORIZATION, firebase_auth(credential))
            .send()
            .await
            .map_err(|e| BackendError::Blob(format!("Delete request failed: {}", e)))?;

        self.check_response(response, path).await?;
        tracing::info!(path, "Object deleted");
        Ok(())
    }
}

fn firebase_auth(credential: &IdentityCredential) -> String {
    format!("Firebase {}", credential.expose())
}

/// Subset of the object metadata resource we use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    #[serde(default)]
    download_tokens: Option<String>,
}
