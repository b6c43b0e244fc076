// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client (Identity Toolkit REST API).
//!
//! Handles:
//! - Email/password account creation and sign-in
//! - Display name and photo URL updates
//! - Mapping REST error messages to `auth/*` error codes

use super::{BackendError, IdentityCredential, IdentityProfileUpdate, IdentityProvider, IdentityUser};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity Toolkit client authenticated with the project's web API key.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FirebaseAuthClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, IDENTITY_TOOLKIT_URL.to_string())
    }

    /// Point the client at another endpoint (e.g. the Auth emulator).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// POST a JSON body to `accounts:{method}` and parse the response.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/accounts:{}", self.base_url, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(method, error = %e, "Identity Toolkit request failed");
                BackendError::identity("auth/network-request-failed")
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body: ErrorEnvelope = response.json().await.unwrap_or_default();
            let code = identity_error_code(&body.error.message);
            tracing::warn!(method, status = %status, code = %code, "Identity Toolkit error");
            return Err(BackendError::Identity { code });
        }

        response.json().await.map_err(|e| {
            tracing::error!(method, error = %e, "Failed to parse Identity Toolkit response");
            BackendError::identity("auth/internal-error")
        })
    }

    /// Fetch the full account record (includes photo URL) for an ID token.
    async fn lookup(&self, credential: &IdentityCredential) -> Result<IdentityUser, BackendError> {
        let response: LookupResponse = self
            .call(
                "lookup",
                &serde_json::json!({ "idToken": credential.expose() }),
            )
            .await?;

        let account = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::identity("auth/user-not-found"))?;

        Ok(IdentityUser {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name,
            photo_url: account.photo_url,
            credential: credential.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, BackendError> {
        let response: TokenResponse = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        tracing::info!(uid = %response.local_id, "Identity account created");
        Ok(response.into_identity())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, BackendError> {
        let response: TokenResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        // The sign-in response omits the photo URL.
        self.lookup(&IdentityCredential::new(response.id_token)).await
    }

    async fn sign_out(&self, user: &IdentityUser) -> Result<(), BackendError> {
        // ID tokens are stateless; dropping the credential ends the session.
        tracing::debug!(uid = %user.uid, "Identity session released");
        Ok(())
    }

    async fn update_profile(
        &self,
        user: &IdentityUser,
        update: IdentityProfileUpdate,
    ) -> Result<IdentityUser, BackendError> {
        let response: UpdateResponse = self
            .call(
                "update",
                &UpdateRequest {
                    id_token: user.credential.expose(),
                    display_name: update.display_name.as_deref(),
                    photo_url: update.photo_url.as_deref(),
                    return_secure_token: false,
                },
            )
            .await?;

        Ok(IdentityUser {
            uid: response.local_id,
            email: response.email.or_else(|| user.email.clone()),
            display_name: response.display_name,
            photo_url: response.photo_url,
            credential: user.credential.clone(),
        })
    }
}

/// Map an Identity Toolkit error message to an `auth/*` code.
///
/// Messages look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be ...`.
pub fn identity_error_code(message: &str) -> String {
    let key = message
        .split(|c: char| c == ':' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .trim();

    match key {
        "EMAIL_EXISTS" => "auth/email-already-in-use".to_string(),
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
            "auth/invalid-credential".to_string()
        }
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests".to_string(),
        "WEAK_PASSWORD" => "auth/weak-password".to_string(),
        "INVALID_EMAIL" => "auth/invalid-email".to_string(),
        "USER_DISABLED" => "auth/user-disabled".to_string(),
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" => "auth/user-token-expired".to_string(),
        "" => "auth/internal-error".to_string(),
        other => format!("auth/{}", other.to_lowercase().replace('_', "-")),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl TokenResponse {
    fn into_identity(self) -> IdentityUser {
        IdentityUser {
            uid: self.local_id,
            email: self.email,
            display_name: self.display_name.filter(|n| !n.is_empty()),
            photo_url: None,
            credential: IdentityCredential::new(self.id_token),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupAccount {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_messages_map_to_codes() {
        assert_eq!(identity_error_code("EMAIL_EXISTS"), "auth/email-already-in-use");
        assert_eq!(
            identity_error_code("INVALID_LOGIN_CREDENTIALS"),
            "auth/invalid-credential"
        );
        assert_eq!(
            identity_error_code("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            "auth/too-many-requests"
        );
        assert_eq!(
            identity_error_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            "auth/weak-password"
        );
        assert_eq!(identity_error_code("INVALID_EMAIL"), "auth/invalid-email");
    }

    #[test]
    fn test_unknown_messages_keep_their_name() {
        assert_eq!(
            identity_error_code("OPERATION_NOT_ALLOWED"),
            "auth/operation-not-allowed"
        );
        assert_eq!(identity_error_code(""), "auth/internal-error");
    }

    #[test]
    fn test_update_request_omits_absent_fields() {
        let body = UpdateRequest {
            id_token: "tok",
            display_name: Some("Rex"),
            photo_url: None,
            return_secure_token: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["idToken"], "tok");
        assert_eq!(json["displayName"], "Rex");
        assert!(json.get("photoUrl").is_none());
    }
}
