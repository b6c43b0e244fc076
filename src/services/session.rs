// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session holder: sign-in, registration, sign-out and session restoration.
//!
//! Every signed-in user has one cached [`CurrentUser`] record, the merge of
//! the identity account and the profile document. The cache is a
//! convenience mirror of the backend, never the source of truth.

use crate::backend::{
    BlobStore, DocumentStore, IdentityProfileUpdate, IdentityProvider, IdentityUser,
};
use crate::error::{AppError, AuthError};
use crate::models::{AccountType, CurrentUser, DogsDocument, UserDocument};
use crate::services::photo::PhotoSettings;
use crate::time_utils::{format_utc_rfc3339, unix_millis};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use validator::Validate;

/// Buffered auth-state events per subscriber.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Whether a user currently has a loaded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    SignedOut,
    SignedIn,
}

/// Auth-state transition broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStateChange {
    pub uid: String,
    pub state: SessionState,
}

/// Input for account registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 32))]
    pub phone: String,
    pub account_type: AccountType,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub nickname: Option<String>,
}

impl Registration {
    /// The chosen nickname, or `"{name} {last_name}"`.
    pub fn display_name(&self) -> String {
        self.nickname
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", self.name, self.last_name))
    }
}

/// Cached state for one signed-in user.
#[derive(Debug, Clone)]
pub(crate) struct SessionEntry {
    pub(crate) identity: IdentityUser,
    pub(crate) user: CurrentUser,
}

/// Session holder over the identity service, document store and blob store.
#[derive(Clone)]
pub struct SessionService {
    identity: Arc<dyn IdentityProvider>,
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    photo: PhotoSettings,
    /// Signed-in users keyed by uid.
    sessions: Arc<DashMap<String, SessionEntry>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl SessionService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        photo: PhotoSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            identity,
            documents,
            blobs,
            photo,
            sessions: Arc::new(DashMap::new()),
            events,
        }
    }

    // ─── Accessors used by the profile, photo and explore flows ──────────

    pub(crate) fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    pub(crate) fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    pub(crate) fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub(crate) fn photo_settings(&self) -> &PhotoSettings {
        &self.photo
    }

    /// Snapshot of a signed-in user's session.
    pub(crate) fn session(&self, uid: &str) -> Result<SessionEntry, AppError> {
        self.sessions
            .get(uid)
            .map(|entry| entry.value().clone())
            .ok_or(AppError::NoCurrentUser)
    }

    /// Mutate a cached session if the user is still signed in.
    ///
    /// Returns `false` when the session is gone (e.g. signed out mid-flow).
    pub(crate) fn update_cached<F>(&self, uid: &str, f: F) -> bool
    where
        F: FnOnce(&mut SessionEntry),
    {
        match self.sessions.get_mut(uid) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => {
                tracing::debug!(uid, "Session gone, dropping cached update");
                false
            }
        }
    }

    // ─── Public API ──────────────────────────────────────────────────────

    /// The cached current user record, if signed in.
    pub fn current_user(&self, uid: &str) -> Option<CurrentUser> {
        self.sessions.get(uid).map(|entry| entry.user.clone())
    }

    pub fn state(&self, uid: &str) -> SessionState {
        if self.sessions.contains_key(uid) {
            SessionState::SignedIn
        } else {
            SessionState::SignedOut
        }
    }

    /// The signed-in user's dogs document.
    ///
    /// Business accounts have none.
    pub async fn dogs(&self, uid: &str) -> Result<DogsDocument, AppError> {
        self.session(uid)?;
        self.documents
            .get_dogs(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("dogs for user {}", uid)))
    }

    /// Subscribe to auth-state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    /// Sign in with email and password, then load the profile document.
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AppError> {
        let identity = self
            .identity
            .sign_in(email, password)
            .await
            .map_err(|e| log_auth_failure("login", AuthError::from(e)))?;

        self.restore(identity).await
    }

    /// Rebuild a session for an identity that is already signed in.
    ///
    /// Fails with [`AuthError::UserDataNotFound`] when the profile document
    /// is missing.
    pub async fn restore(&self, identity: IdentityUser) -> Result<CurrentUser, AppError> {
        let doc = self
            .documents
            .get_user(&identity.uid)
            .await
            .map_err(|e| log_auth_failure("restore", AuthError::from(e)))?
            .ok_or_else(|| log_auth_failure("restore", AuthError::UserDataNotFound))?;

        let user = CurrentUser::merge(&identity, &doc);
        self.establish(identity, user.clone());
        tracing::info!(uid = %user.uid, "User logged in successfully");
        Ok(user)
    }

    /// Create an account, its profile document and (for personal accounts)
    /// an empty dogs document.
    pub async fn register(&self, registration: Registration) -> Result<CurrentUser, AppError> {
        registration
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let display_name = registration.display_name();

        let identity = self
            .identity
            .create_account(&registration.email, &registration.password)
            .await
            .map_err(|e| log_auth_failure("register", AuthError::from(e)))?;

        let identity = self
            .identity
            .update_profile(&identity, IdentityProfileUpdate::display_name(&display_name))
            .await
            .map_err(|e| log_auth_failure("register", AuthError::from(e)))?;

        let now = chrono::Utc::now();
        let created_at = format_utc_rfc3339(now);
        let doc = UserDocument {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            name: registration.name,
            last_name: registration.last_name,
            phone: registration.phone,
            account_type: registration.account_type,
            nickname: Some(display_name),
            bio: None,
            age: None,
            last_position: None,
            dogs: Vec::new(),
            friends: Vec::new(),
            status: "active".to_string(),
            internal_id: unix_millis(now),
            created_at: created_at.clone(),
        };

        self.documents
            .set_user(&identity.uid, &doc)
            .await
            .map_err(|e| log_auth_failure("register", AuthError::from(e)))?;

        if doc.account_type == AccountType::Personal {
            self.documents
                .set_dogs(&identity.uid, &DogsDocument::empty(&identity.uid, &created_at))
                .await
                .map_err(|e| log_auth_failure("register", AuthError::from(e)))?;
        }

        let user = CurrentUser::merge(&identity, &doc);
        self.establish(identity, user.clone());
        tracing::info!(uid = %user.uid, account_type = ?user.account_type, "User registered");
        Ok(user)
    }

    /// Sign out: release the identity session, then clear the local record.
    pub async fn sign_out(&self, uid: &str) -> Result<(), AppError> {
        let Some(entry) = self.sessions.get(uid).map(|e| e.value().clone()) else {
            return Ok(());
        };

        self.identity
            .sign_out(&entry.identity)
            .await
            .map_err(|e| AppError::SignOut(e.to_string()))?;

        self.clear(uid);
        tracing::info!(uid, "User signed out successfully");
        Ok(())
    }

    /// React to an auth-state change reported by the identity service.
    ///
    /// A signed-out event always drops the local session.
    pub async fn handle_auth_state_change(
        &self,
        uid: &str,
        identity: Option<IdentityUser>,
    ) -> Result<SessionState, AppError> {
        match identity {
            Some(identity) if self.sessions.contains_key(&identity.uid) => {
                let refreshed = identity.clone();
                self.update_cached(&identity.uid, move |entry| {
                    entry.user.apply_identity(&refreshed);
                    entry.identity = refreshed;
                });
                Ok(SessionState::SignedIn)
            }
            Some(identity) => {
                self.restore(identity).await?;
                Ok(SessionState::SignedIn)
            }
            None => {
                self.clear(uid);
                Ok(SessionState::SignedOut)
            }
        }
    }

    fn establish(&self, identity: IdentityUser, user: CurrentUser) {
        let uid = user.uid.clone();
        self.sessions
            .insert(uid.clone(), SessionEntry { identity, user });
        self.emit(uid, SessionState::SignedIn);
    }

    fn clear(&self, uid: &str) {
        if self.sessions.remove(uid).is_some() {
            self.emit(uid.to_string(), SessionState::SignedOut);
        }
    }

    fn emit(&self, uid: String, state: SessionState) {
        // No subscribers is fine.
        let _ = self.events.send(AuthStateChange { uid, state });
    }
}

fn log_auth_failure(operation: &'static str, err: AuthError) -> AppError {
    tracing::warn!(operation, code = err.code(), "Authentication failed");
    AppError::Auth(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(nickname: Option<&str>) -> Registration {
        Registration {
            email: "anna@example.com".to_string(),
            password: "secret123".to_string(),
            name: "Anna".to_string(),
            last_name: "Nowak".to_string(),
            phone: "600100200".to_string(),
            account_type: AccountType::Personal,
            nickname: nickname.map(str::to_string),
        }
    }

    #[test]
    fn test_display_name_prefers_nickname() {
        assert_eq!(registration(Some("Rexie")).display_name(), "Rexie");
        assert_eq!(registration(Some("  ")).display_name(), "Anna Nowak");
        assert_eq!(registration(None).display_name(), "Anna Nowak");
    }

    #[test]
    fn test_registration_requires_names() {
        let mut reg = registration(None);
        reg.name = String::new();
        assert!(reg.validate().is_err());
    }
}
