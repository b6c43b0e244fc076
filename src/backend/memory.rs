// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process backend implementations.
//!
//! Used for local development (`BACKEND=memory`) and tests. Error codes
//! mirror the ones the hosted identity service reports.

use super::{
    BackendError, BlobStore, DocumentStore, IdentityCredential, IdentityProfileUpdate,
    IdentityProvider, IdentityUser,
};
use crate::models::{DogsDocument, UserDocument, UserPatch};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimum password length accepted by the identity service.
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password: String,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl Account {
    fn to_identity(&self, credential: IdentityCredential) -> IdentityUser {
        IdentityUser {
            uid: self.uid.clone(),
            email: Some(self.email.clone()),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
            credential,
        }
    }
}

/// In-memory identity service.
#[derive(Default)]
pub struct MemoryIdentity {
    /// Accounts keyed by normalized email
    accounts: DashMap<String, Account>,
    /// uid -> normalized email
    emails_by_uid: DashMap<String, String>,
    next_id: AtomicU64,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_credential(&self, uid: &str) -> IdentityCredential {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        IdentityCredential::new(format!("memory-token-{}-{}", uid, n))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, BackendError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(BackendError::identity("auth/invalid-email"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BackendError::identity("auth/weak-password"));
        }

        let uid = format!("mem{:08}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let account = Account {
            uid: uid.clone(),
            email: email.clone(),
            password: password.to_string(),
            display_name: None,
            photo_url: None,
        };

        match self.accounts.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(BackendError::identity("auth/email-already-in-use"))
            }
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
            }
        }
        self.emails_by_uid.insert(uid.clone(), email);

        tracing::debug!(uid = %uid, "Memory identity account created");
        Ok(account.to_identity(self.issue_credential(&uid)))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, BackendError> {
        let email = normalize_email(email);
        let account = self
            .accounts
            .get(&email)
            .filter(|a| a.password == password)
            .map(|a| a.value().clone())
            .ok_or_else(|| BackendError::identity("auth/invalid-credential"))?;

        Ok(account.to_identity(self.issue_credential(&account.uid)))
    }

    async fn sign_out(&self, user: &IdentityUser) -> Result<(), BackendError> {
        tracing::debug!(uid = %user.uid, "Memory identity sign-out");
        Ok(())
    }

    async fn update_profile(
        &self,
        user: &IdentityUser,
        update: IdentityProfileUpdate,
    ) -> Result<IdentityUser, BackendError> {
        let email = self
            .emails_by_uid
            .get(&user.uid)
            .map(|e| e.value().clone())
            .ok_or_else(|| BackendError::identity("auth/user-not-found"))?;

        let mut account = self
            .accounts
            .get_mut(&email)
            .ok_or_else(|| BackendError::identity("auth/user-not-found"))?;

        if let Some(name) = update.display_name {
            account.display_name = Some(name);
        }
        if let Some(url) = update.photo_url {
            account.photo_url = Some(url);
        }

        Ok(account.to_identity(user.credential.clone()))
    }
}

/// In-memory document store.
#[derive(Default)]
pub struct MemoryDocumentStore {
    users: DashMap<String, UserDocument>,
    dogs: DashMap<String, DogsDocument>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, BackendError> {
        Ok(self.users.get(uid).map(|u| u.value().clone()))
    }

    async fn set_user(&self, uid: &str, user: &UserDocument) -> Result<(), BackendError> {
        self.users.insert(uid.to_string(), user.clone());
        Ok(())
    }

    async fn patch_user(&self, uid: &str, patch: &UserPatch) -> Result<(), BackendError> {
        let mut doc = self
            .users
            .get_mut(uid)
            .ok_or_else(|| BackendError::NotFound(format!("users/{}", uid)))?;
        patch.apply_to(&mut doc);
        Ok(())
    }

    async fn get_dogs(&self, uid: &str) -> Result<Option<DogsDocument>, BackendError> {
        Ok(self.dogs.get(uid).map(|d| d.value().clone()))
    }

    async fn set_dogs(&self, uid: &str, dogs: &DogsDocument) -> Result<(), BackendError> {
        self.dogs.insert(uid.to_string(), dogs.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
    token: u64,
}

/// In-memory blob store producing Firebase-style download URLs.
pub struct MemoryBlobStore {
    bucket: String,
    blobs: DashMap<String, StoredBlob>,
    next_token: AtomicU64,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory-bucket")
    }
}

impl MemoryBlobStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            blobs: DashMap::new(),
            next_token: AtomicU64::new(1),
        }
    }

    fn url_for(&self, path: &str, token: u64) -> String {
        format!(
            "{}/{}/o/{}?alt=media&token={}",
            super::firebase_storage::STORAGE_BASE_URL,
            self.bucket,
            urlencoding::encode(path),
            token
        )
    }

    /// Bytes stored at `path`, if any.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.get(path).map(|b| b.bytes.clone())
    }

    /// Content type recorded for `path`.
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.blobs.get(path).map(|b| b.content_type.clone())
    }

    /// Resolve a previously issued download URL to the bytes it serves.
    ///
    /// Returns `None` once the object is deleted or replaced.
    pub fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        self.blobs
            .iter()
            .find(|entry| self.url_for(entry.key(), entry.value().token) == url)
            .map(|entry| entry.value().bytes.clone())
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        _credential: &IdentityCredential,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.blobs.insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
                token,
            },
        );
        Ok(())
    }

    async fn download_url(
        &self,
        _credential: &IdentityCredential,
        path: &str,
    ) -> Result<String, BackendError> {
        self.blobs
            .get(path)
            .map(|b| self.url_for(path, b.token))
            .ok_or_else(|| BackendError::NotFound(path.to_string()))
    }

    async fn delete(
        &self,
        _credential: &IdentityCredential,
        path: &str,
    ) -> Result<(), BackendError> {
        self.blobs
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_is_rejected_case_insensitively() {
        let identity = MemoryIdentity::new();
        identity
            .create_account("Walker@Example.com", "secret123")
            .await
            .unwrap();

        let err = identity
            .create_account("walker@example.com", "another123")
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::identity("auth/email-already-in-use"));
    }

    #[tokio::test]
    async fn test_weak_password_and_bad_email() {
        let identity = MemoryIdentity::new();
        assert_eq!(
            identity.create_account("a@b.pl", "123").await.unwrap_err(),
            BackendError::identity("auth/weak-password")
        );
        assert_eq!(
            identity
                .create_account("not-an-email", "secret123")
                .await
                .unwrap_err(),
            BackendError::identity("auth/invalid-email")
        );
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credential() {
        let identity = MemoryIdentity::new();
        identity.create_account("a@b.pl", "secret123").await.unwrap();
        assert_eq!(
            identity.sign_in("a@b.pl", "wrong").await.unwrap_err(),
            BackendError::identity("auth/invalid-credential")
        );
        assert!(identity.sign_in("a@b.pl", "secret123").await.is_ok());
    }

    #[tokio::test]
    async fn test_patch_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let patch = UserPatch {
            age: Some(3),
            ..Default::default()
        };
        assert!(matches!(
            store.patch_user("ghost", &patch).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_replaced_blob_invalidates_old_url() {
        let blobs = MemoryBlobStore::default();
        let cred = IdentityCredential::new("t");
        blobs
            .upload(&cred, "users/u/p.jpeg", vec![1], "image/jpeg")
            .await
            .unwrap();
        let first = blobs.download_url(&cred, "users/u/p.jpeg").await.unwrap();
        assert_eq!(blobs.fetch(&first), Some(vec![1]));

        blobs
            .upload(&cred, "users/u/p.jpeg", vec![2], "image/jpeg")
            .await
            .unwrap();
        let second = blobs.download_url(&cred, "users/u/p.jpeg").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(blobs.fetch(&first), None);
        assert_eq!(blobs.fetch(&second), Some(vec![2]));
    }
}
