// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use dogowalker::backend::memory::{MemoryBlobStore, MemoryDocumentStore, MemoryIdentity};
use dogowalker::backend::{
    BackendError, BlobStore, IdentityCredential, IdentityProfileUpdate, IdentityProvider,
    IdentityUser,
};
use dogowalker::config::Config;
use dogowalker::db::FirestoreDb;
use dogowalker::models::{AccountType, CurrentUser};
use dogowalker::routes::create_router;
use dogowalker::services::{PhotoSettings, Registration, SessionService};
use dogowalker::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Blob store wrapper that can be told to fail uploads.
#[allow(dead_code)]
pub struct FlakyBlobStore {
    pub inner: Arc<MemoryBlobStore>,
    fail_uploads: AtomicBool,
}

#[allow(dead_code)]
impl FlakyBlobStore {
    pub fn new(inner: Arc<MemoryBlobStore>) -> Self {
        Self {
            inner,
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn upload(
        &self,
        credential: &IdentityCredential,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(BackendError::Blob("network unreachable".to_string()));
        }
        self.inner.upload(credential, path, bytes, content_type).await
    }

    async fn download_url(
        &self,
        credential: &IdentityCredential,
        path: &str,
    ) -> Result<String, BackendError> {
        self.inner.download_url(credential, path).await
    }

    async fn delete(&self, credential: &IdentityCredential, path: &str) -> Result<(), BackendError> {
        self.inner.delete(credential, path).await
    }
}

/// Identity wrapper that can be told to fail profile updates.
#[allow(dead_code)]
pub struct FlakyIdentity {
    pub inner: MemoryIdentity,
    fail_display_name: AtomicBool,
    fail_photo_url: AtomicBool,
}

#[allow(dead_code)]
impl FlakyIdentity {
    pub fn new(inner: MemoryIdentity) -> Self {
        Self {
            inner,
            fail_display_name: AtomicBool::new(false),
            fail_photo_url: AtomicBool::new(false),
        }
    }

    pub fn fail_display_name(&self, fail: bool) {
        self.fail_display_name.store(fail, Ordering::SeqCst);
    }

    pub fn fail_photo_url(&self, fail: bool) {
        self.fail_photo_url.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for FlakyIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, BackendError> {
        self.inner.create_account(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, BackendError> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_out(&self, user: &IdentityUser) -> Result<(), BackendError> {
        self.inner.sign_out(user).await
    }

    async fn update_profile(
        &self,
        user: &IdentityUser,
        update: IdentityProfileUpdate,
    ) -> Result<IdentityUser, BackendError> {
        if update.display_name.is_some() && self.fail_display_name.load(Ordering::SeqCst) {
            return Err(BackendError::identity("auth/network-request-failed"));
        }
        if update.photo_url.is_some() && self.fail_photo_url.load(Ordering::SeqCst) {
            return Err(BackendError::identity("auth/network-request-failed"));
        }
        self.inner.update_profile(user, update).await
    }
}

/// Session service over in-memory stores, with handles kept for inspection.
#[allow(dead_code)]
pub struct TestBackend {
    pub sessions: SessionService,
    pub documents: Arc<MemoryDocumentStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub flaky: Arc<FlakyBlobStore>,
    pub identity: Arc<FlakyIdentity>,
}

#[allow(dead_code)]
pub fn test_backend() -> TestBackend {
    let documents = Arc::new(MemoryDocumentStore::new());
    let blobs = Arc::new(MemoryBlobStore::default());
    let flaky = Arc::new(FlakyBlobStore::new(blobs.clone()));
    let identity = Arc::new(FlakyIdentity::new(MemoryIdentity::new()));

    let sessions = SessionService::new(
        identity.clone(),
        documents.clone(),
        flaky.clone(),
        PhotoSettings::default(),
    );

    TestBackend {
        sessions,
        documents,
        blobs,
        flaky,
        identity,
    }
}

/// A valid personal-account registration.
#[allow(dead_code)]
pub fn registration(email: &str) -> Registration {
    Registration {
        email: email.to_string(),
        password: "walkies123".to_string(),
        name: "Anna".to_string(),
        last_name: "Nowak".to_string(),
        phone: "600100200".to_string(),
        account_type: AccountType::Personal,
        nickname: Some("Rex's human".to_string()),
    }
}

/// Register and sign in a fresh user.
#[allow(dead_code)]
pub async fn signed_in_user(sessions: &SessionService, email: &str) -> CurrentUser {
    sessions
        .register(registration(email))
        .await
        .expect("registration should succeed")
}

/// Encode a small solid-color PNG.
#[allow(dead_code)]
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([200, 150, 100]),
    ));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("PNG encode");
    out.into_inner()
}

/// Create a test app with in-memory backends.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_frontend_url("http://localhost:5173")
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();

    let state = Arc::new(AppState::in_memory(config));
    (create_router(state.clone()), state)
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    dogowalker::middleware::auth::create_jwt(uid, signing_key).expect("Failed to create JWT")
}
