// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the document store for:
//! - Users (profile documents)
//! - Dogs (companion documents for personal accounts)

use crate::backend::{BackendError, DocumentStore};
use crate::db::collections;
use crate::models::{DogsDocument, UserDocument, UserPatch};
use async_trait::async_trait;
use firestore::FirestoreWritePrecondition;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, BackendError> {
        // The emulator accepts any token; skip credential discovery entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            BackendError::Document(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, BackendError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            BackendError::Document(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, BackendError> {
        self.client.as_ref().ok_or_else(|| {
            BackendError::Document("Database not connected (offline mode)".to_string())
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, BackendError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| BackendError::Document(e.to_string()))
    }

    async fn set_user(&self, uid: &str, user: &UserDocument) -> Result<(), BackendError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(user)
            .execute()
            .await
            .map_err(|e| BackendError::Document(e.to_string()))?;
        Ok(())
    }

    /// Field-masked update: only the fields present in the patch are written.
    async fn patch_user(&self, uid: &str, patch: &UserPatch) -> Result<(), BackendError> {
        let fields = patch.field_paths();
        if fields.is_empty() {
            return Ok(());
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields.iter().copied())
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(uid)
            .object(patch)
            .execute()
            .await
            .map_err(|e| BackendError::Document(e.to_string()))?;

        tracing::debug!(uid, ?fields, "User document patched");
        Ok(())
    }

    // ─── Dogs Operations ─────────────────────────────────────────

    async fn get_dogs(&self, uid: &str) -> Result<Option<DogsDocument>, BackendError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DOGS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| BackendError::Document(e.to_string()))
    }

    async fn set_dogs(&self, uid: &str, dogs: &DogsDocument) -> Result<(), BackendError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DOGS)
            .document_id(uid)
            .object(dogs)
            .execute()
            .await
            .map_err(|e| BackendError::Document(e.to_string()))?;
        Ok(())
    }
}
