// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Dog and friend references stored alongside user profiles.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A dog owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DogRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    /// Size class (small, medium, large as 1..=3)
    #[serde(default)]
    pub size: Option<u8>,
}

/// A friend reference as shown on a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FriendRef {
    pub uid: String,
    pub nick: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Companion `dogs` document seeded for personal accounts.
///
/// Keyed by the owner's uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogsDocument {
    pub owner_uid: String,
    #[serde(default)]
    pub dogs: Vec<DogRef>,
    pub created_at: String,
}

impl DogsDocument {
    /// An empty dogs document for a freshly registered owner.
    pub fn empty(owner_uid: &str, created_at: &str) -> Self {
        Self {
            owner_uid: owner_uid.to_string(),
            dogs: Vec::new(),
            created_at: created_at.to_string(),
        }
    }
}
