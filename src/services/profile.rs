// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Partial profile updates.
//!
//! Display name goes to the identity service, everything else is a
//! field-masked patch of the profile document. After the writes, the
//! document is re-read and the cached bio, age and position are replaced
//! with the stored values, whether or not the writes succeeded.

use crate::backend::{IdentityProfileUpdate, IdentityUser};
use crate::error::AppError;
use crate::models::{CurrentUser, Position, UserPatch};
use crate::services::session::SessionService;
use serde::Deserialize;
use validator::Validate;

/// A sparse set of profile changes. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(max = 100))]
    pub new_display_name: Option<String>,
    /// An empty bio is a valid value and clears the field.
    #[validate(length(max = 1000))]
    pub new_bio: Option<String>,
    #[validate(range(max = 150))]
    pub new_age: Option<u32>,
    #[validate(nested)]
    pub last_position: Option<Position>,
}

impl ProfileUpdate {
    pub fn position(position: Position) -> Self {
        Self {
            last_position: Some(position),
            ..Default::default()
        }
    }

    /// Display name to write, if one was given and is non-blank.
    fn display_name(&self) -> Option<&str> {
        self.new_display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Document-store portion of this update.
    pub fn document_patch(&self) -> UserPatch {
        UserPatch {
            bio: self.new_bio.clone(),
            age: self.new_age,
            last_position: self.last_position,
        }
    }
}

impl SessionService {
    /// Apply a partial profile update for a signed-in user.
    ///
    /// Returns the refreshed cached record. Any failed write aborts the
    /// remaining writes and is reported as [`AppError::ProfileUpdate`].
    pub async fn update_profile(
        &self,
        uid: &str,
        update: ProfileUpdate,
    ) -> Result<CurrentUser, AppError> {
        let session = self.session(uid)?;

        let result = self.write_profile(uid, &session.identity, &update).await;

        // Resync runs on both paths
        self.resync_document_fields(uid).await;

        result?;
        self.current_user(uid).ok_or(AppError::NoCurrentUser)
    }

    async fn write_profile(
        &self,
        uid: &str,
        identity: &IdentityUser,
        update: &ProfileUpdate,
    ) -> Result<(), AppError> {
        if let Some(name) = update.display_name() {
            let refreshed = self
                .identity()
                .update_profile(identity, IdentityProfileUpdate::display_name(name))
                .await
                .map_err(|e| AppError::ProfileUpdate(e.to_string()))?;
            self.update_cached(uid, |entry| {
                entry.user.apply_identity(&refreshed);
                entry.identity = refreshed.clone();
            });
        }

        let patch = update.document_patch();
        if !patch.is_empty() {
            self.documents()
                .patch_user(uid, &patch)
                .await
                .map_err(|e| AppError::ProfileUpdate(e.to_string()))?;
            self.update_cached(uid, |entry| entry.user.apply_patch(&patch));
        }

        tracing::info!(uid, fields = ?patch.field_paths(), "User profile updated");
        Ok(())
    }

    async fn resync_document_fields(&self, uid: &str) {
        match self.documents().get_user(uid).await {
            Ok(Some(doc)) => {
                self.update_cached(uid, |entry| entry.user.resync_from(&doc));
            }
            Ok(None) => {
                tracing::warn!(uid, "Profile document missing during resync");
            }
            Err(e) => {
                tracing::warn!(uid, error = %e, "Failed to resync profile document");
            }
        }
    }
}
