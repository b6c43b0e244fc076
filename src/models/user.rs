// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use crate::backend::IdentityUser;
use crate::models::dog::{DogRef, FriendRef};
use crate::models::position::Position;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of account chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AccountType {
    Personal,
    Business,
}

/// Profile document stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    /// Identity-service uid (also used as document ID)
    pub uid: String,
    pub email: Option<String>,
    pub name: String,
    pub last_name: String,
    pub phone: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub last_position: Option<Position>,
    #[serde(default)]
    pub dogs: Vec<DogRef>,
    #[serde(default)]
    pub friends: Vec<FriendRef>,
    /// Account status ("active" on creation)
    pub status: String,
    /// Numeric id (creation time in milliseconds)
    pub internal_id: i64,
    /// When the account was registered (RFC3339)
    pub created_at: String,
}

impl UserDocument {
    /// `"{name} {last_name}"`, used when no nickname was chosen.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }
}

/// Sparse update of document-store profile fields.
///
/// Only present fields are serialized, and [`UserPatch::field_paths`] names
/// exactly those fields so that the write does not touch anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_position: Option<Position>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.bio.is_none() && self.age.is_none() && self.last_position.is_none()
    }

    /// Document field paths touched by this patch.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.bio.is_some() {
            paths.push("bio");
        }
        if self.age.is_some() {
            paths.push("age");
        }
        if self.last_position.is_some() {
            paths.push("lastPosition");
        }
        paths
    }

    /// Apply this patch to a stored document.
    pub fn apply_to(&self, doc: &mut UserDocument) {
        if let Some(bio) = &self.bio {
            doc.bio = Some(bio.clone());
        }
        if let Some(age) = self.age {
            doc.age = Some(age);
        }
        if let Some(position) = self.last_position {
            doc.last_position = Some(position);
        }
    }
}

/// The signed-in user: identity fields merged with the profile document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurrentUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub internal_id: i64,
    pub account_type: AccountType,
    pub nickname: String,
    pub bio: Option<String>,
    pub age: Option<u32>,
    pub last_position: Option<Position>,
    pub dogs: Vec<DogRef>,
    pub friends: Vec<FriendRef>,
}

impl CurrentUser {
    /// Merge identity-service fields with the stored profile document.
    pub fn merge(identity: &IdentityUser, doc: &UserDocument) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone().or_else(|| doc.email.clone()),
            display_name: identity.display_name.clone(),
            photo_url: identity.photo_url.clone(),
            internal_id: doc.internal_id,
            account_type: doc.account_type,
            nickname: doc
                .nickname
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| doc.full_name()),
            bio: doc.bio.clone(),
            age: doc.age,
            last_position: doc.last_position,
            dogs: doc.dogs.clone(),
            friends: doc.friends.clone(),
        }
    }

    /// Refresh identity-owned fields after an identity-service write.
    pub fn apply_identity(&mut self, identity: &IdentityUser) {
        if identity.email.is_some() {
            self.email = identity.email.clone();
        }
        self.display_name = identity.display_name.clone();
        self.photo_url = identity.photo_url.clone();
    }

    /// Optimistically apply a document patch that the store accepted.
    pub fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(bio) = &patch.bio {
            self.bio = Some(bio.clone());
        }
        if let Some(age) = patch.age {
            self.age = Some(age);
        }
        if let Some(position) = patch.last_position {
            self.last_position = Some(position);
        }
    }

    /// Overwrite document-owned editable fields with server values.
    pub fn resync_from(&mut self, doc: &UserDocument) {
        self.bio = doc.bio.clone();
        self.age = doc.age;
        self.last_position = doc.last_position;
    }
}
