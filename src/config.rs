//! Application configuration loaded from environment variables.
//!
//! Backend credentials (Firebase web API key, storage bucket, Firestore
//! project) and the session signing key are read once at startup.

use crate::services::photo::PhotoSettings;
use std::env;
use std::str::FromStr;

/// Which backend implementation to wire up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Firebase Auth + Firestore + Firebase Storage
    Firebase,
    /// In-process backend (local development)
    Memory,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(Self::Firebase),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("BACKEND")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (CORS origin, cookie attributes)
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Firebase Storage bucket for profile photos
    pub storage_bucket: String,
    /// Server port
    pub port: u16,
    /// Backend implementation
    pub backend: BackendKind,
    /// Profile photo processing limits
    pub photo: PhotoSettings,

    // --- Secrets ---
    /// Firebase web API key (Identity Toolkit)
    pub firebase_api_key: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            port: 8080,
            backend: BackendKind::Memory,
            photo: PhotoSettings::default(),
            firebase_api_key: "test_api_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend = match env::var("BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => BackendKind::Firebase,
        };

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());

        let firebase_api_key = match (backend, env::var("FIREBASE_API_KEY")) {
            (_, Ok(key)) => key.trim().to_string(),
            (BackendKind::Memory, Err(_)) => String::new(),
            (BackendKind::Firebase, Err(_)) => {
                return Err(ConfigError::Missing("FIREBASE_API_KEY"))
            }
        };

        let defaults = PhotoSettings::default();
        let photo = PhotoSettings {
            max_width: parse_or("PHOTO_MAX_WIDTH", defaults.max_width)?,
            max_height: parse_or("PHOTO_MAX_HEIGHT", defaults.max_height)?,
            jpeg_quality: parse_or("PHOTO_JPEG_QUALITY", defaults.jpeg_quality)?,
            max_upload_bytes: parse_or("PHOTO_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        };
        if photo.jpeg_quality == 0 || photo.jpeg_quality > 100 {
            return Err(ConfigError::Invalid("PHOTO_JPEG_QUALITY"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            storage_bucket: env::var("FIREBASE_STORAGE_BUCKET")
                .unwrap_or_else(|_| format!("{}.appspot.com", gcp_project_id)),
            gcp_project_id,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            backend,
            photo,
            firebase_api_key,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
