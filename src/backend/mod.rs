// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ports to the managed backend.
//!
//! All persistence, authentication and file storage is delegated to:
//! - an identity service (accounts, credentials, display name, photo URL)
//! - a document store (profile documents)
//! - a blob store (profile photos)
//!
//! Production implementations talk to Firebase/Firestore; [`memory`] holds
//! in-process implementations for local development and tests.

pub mod firebase_auth;
pub mod firebase_storage;
pub mod memory;

pub use firebase_auth::FirebaseAuthClient;
pub use firebase_storage::FirebaseStorageClient;

use crate::models::{DogsDocument, UserDocument, UserPatch};
use async_trait::async_trait;
use std::fmt;

/// Opaque credential issued by the identity service at sign-in.
///
/// Authorizes further identity and blob calls on behalf of the user.
/// Never serialized and redacted from debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityCredential(String);

impl IdentityCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IdentityCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentityCredential(<redacted>)")
    }
}

/// A signed-in identity-service account.
#[derive(Debug, Clone)]
pub struct IdentityUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub credential: IdentityCredential,
}

/// Fields of the identity profile that can be changed.
#[derive(Debug, Clone, Default)]
pub struct IdentityProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl IdentityProfileUpdate {
    pub fn display_name(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            photo_url: None,
        }
    }

    pub fn photo_url(url: impl Into<String>) -> Self {
        Self {
            display_name: None,
            photo_url: Some(url.into()),
        }
    }
}

/// Errors reported by backend ports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Identity-service failure, keyed by its error code (e.g. `auth/weak-password`).
    #[error("Identity service error: {code}")]
    Identity { code: String },

    #[error("Document store error: {0}")]
    Document(String),

    #[error("Blob store error: {0}")]
    Blob(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl BackendError {
    pub fn identity(code: impl Into<String>) -> Self {
        Self::Identity { code: code.into() }
    }
}

/// Identity service (account creation, credential verification, profile).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str)
        -> Result<IdentityUser, BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, BackendError>;

    async fn sign_out(&self, user: &IdentityUser) -> Result<(), BackendError>;

    /// Apply an identity profile update and return the refreshed account.
    async fn update_profile(
        &self,
        user: &IdentityUser,
        update: IdentityProfileUpdate,
    ) -> Result<IdentityUser, BackendError>;
}

/// Schema-less per-record store for profile documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, BackendError>;

    /// Create or replace a user document.
    async fn set_user(&self, uid: &str, user: &UserDocument) -> Result<(), BackendError>;

    /// Update only the fields present in `patch`. Fails if the document is missing.
    async fn patch_user(&self, uid: &str, patch: &UserPatch) -> Result<(), BackendError>;

    async fn get_dogs(&self, uid: &str) -> Result<Option<DogsDocument>, BackendError>;

    async fn set_dogs(&self, uid: &str, dogs: &DogsDocument) -> Result<(), BackendError>;
}

/// Binary object storage for profile photos.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        credential: &IdentityCredential,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError>;

    /// Public download URL for an uploaded object.
    async fn download_url(
        &self,
        credential: &IdentityCredential,
        path: &str,
    ) -> Result<String, BackendError>;

    async fn delete(&self, credential: &IdentityCredential, path: &str)
        -> Result<(), BackendError>;
}
