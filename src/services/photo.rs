// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile photo pipeline.
//!
//! Uploaded images are decoded, scaled down to fit a bounding box, and
//! re-encoded as JPEG before being stored under the user's photo
//! directory. Every upload is a new object.
//!
//! Replacement order is upload-new, swap the identity photo URL, then
//! delete the previous object. A failure before the swap removes the new
//! object and leaves the old photo and its URL untouched.

use crate::backend::{BackendError, IdentityCredential, IdentityProfileUpdate, IdentityUser};
use crate::error::AppError;
use crate::models::CurrentUser;
use crate::services::session::SessionService;
use crate::time_utils::unix_millis;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ColorType, DynamicImage, GenericImageView};
use regex::Regex;
use std::sync::OnceLock;

/// File name stem of stored profile photos.
pub const PROFILE_PHOTO_STEM: &str = "userProfile";

/// Extensions a previous photo URL may carry.
pub const SUPPORTED_PHOTO_FORMATS: [&str; 7] = ["jpeg", "jpg", "png", "webp", "gif", "bmp", "heic"];

static FILE_FORMAT_RE: OnceLock<Regex> = OnceLock::new();

/// Limits applied to uploaded profile photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSettings {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1..=100
    pub jpeg_quality: u8,
    /// Largest accepted upload body
    pub max_upload_bytes: usize,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            max_width: 1000,
            max_height: 1000,
            jpeg_quality: 95,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// A re-encoded JPEG ready for upload.
#[derive(Debug, Clone)]
pub struct EncodedPhoto {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Errors from the photo pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("Image is empty")]
    Empty,

    #[error("Image too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Error sending file: {0}")]
    Upload(BackendError),
}

impl PhotoError {
    /// Whether the failure was caused by the uploaded content itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Empty | Self::TooLarge { .. } | Self::Decode(_)
        )
    }
}

/// Scale `(width, height)` to fit within `(max_width, max_height)`.
///
/// Preserves aspect ratio and never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );

    let scaled_width = (f64::from(width) * scale).round().max(1.0) as u32;
    let scaled_height = (f64::from(height) * scale).round().max(1.0) as u32;
    (scaled_width.min(max_width), scaled_height.min(max_height))
}

/// Decode, downscale and re-encode an image as JPEG.
///
/// CPU-bound; call from a blocking context.
pub fn resize_to_jpeg(data: &[u8], settings: &PhotoSettings) -> Result<EncodedPhoto, PhotoError> {
    if data.is_empty() {
        return Err(PhotoError::Empty);
    }
    if data.len() > settings.max_upload_bytes {
        return Err(PhotoError::TooLarge {
            size: data.len(),
            max: settings.max_upload_bytes,
        });
    }

    let img = image::load_from_memory(data).map_err(|e| PhotoError::Decode(e.to_string()))?;
    let (width, height) = img.dimensions();
    let (target_width, target_height) =
        fit_within(width, height, settings.max_width, settings.max_height);

    let img = if (target_width, target_height) == (width, height) {
        img
    } else {
        DynamicImage::ImageRgba8(imageops::resize(
            &img,
            target_width,
            target_height,
            imageops::FilterType::Triangle,
        ))
    };

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, settings.jpeg_quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|e| PhotoError::Encode(e.to_string()))?;

    tracing::debug!(
        width,
        height,
        target_width,
        target_height,
        size = bytes.len(),
        "Profile photo re-encoded"
    );

    Ok(EncodedPhoto {
        bytes,
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// Extract the (lowercased) file extension from a photo download URL.
///
/// The URL is percent-decoded first, since storage URLs encode the object
/// path into a single segment. Returns `None` when there is no extension
/// or it is not a supported image format.
pub fn extract_file_format(photo_url: &str) -> Option<String> {
    if photo_url.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(photo_url)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| photo_url.to_string());

    let re = FILE_FORMAT_RE.get_or_init(|| {
        Regex::new(r"(?i)\.([a-z0-9]+)(?:\?|#|$)").expect("file format regex is valid")
    });

    let format = re.captures(&decoded)?.get(1)?.as_str().to_lowercase();
    SUPPORTED_PHOTO_FORMATS
        .contains(&format.as_str())
        .then_some(format)
}

/// Storage directory holding a user's profile photo.
pub fn profile_photo_dir(uid: &str) -> String {
    format!("users/{}/profilePhoto", uid)
}

/// Storage path for one uploaded version of a profile photo.
///
/// Each upload gets its own object so that writing a new photo never
/// clobbers the one the identity profile still points at.
pub fn profile_photo_path(uid: &str, version: i64) -> String {
    format!("{}/{}-{}.jpeg", profile_photo_dir(uid), PROFILE_PHOTO_STEM, version)
}

/// Storage path of a profile photo, parsed from its download URL.
///
/// Returns `None` when the URL does not point into the user's photo
/// directory or does not name a supported image format.
pub fn photo_path_from_url(uid: &str, photo_url: &str) -> Option<String> {
    extract_file_format(photo_url)?;

    let decoded = urlencoding::decode(photo_url).ok()?;
    let prefix = format!("{}/", profile_photo_dir(uid));
    let start = decoded.find(&prefix)?;
    let file_name = decoded[start + prefix.len()..]
        .split(['?', '#'])
        .next()
        .filter(|name| !name.is_empty() && !name.contains('/'))?;

    Some(format!("{}{}", prefix, file_name))
}

impl SessionService {
    /// Replace the signed-in user's profile photo.
    pub async fn update_photo(&self, uid: &str, image: Vec<u8>) -> Result<CurrentUser, AppError> {
        let session = self.session(uid)?;

        let settings = *self.photo_settings();
        let encoded = tokio::task::spawn_blocking(move || resize_to_jpeg(&image, &settings))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Photo task failed: {}", e)))??;

        let previous_path = session
            .user
            .photo_url
            .as_deref()
            .and_then(|url| photo_path_from_url(uid, url));

        let mut version = unix_millis(chrono::Utc::now());
        if previous_path.as_deref() == Some(profile_photo_path(uid, version).as_str()) {
            version += 1;
        }
        let new_path = profile_photo_path(uid, version);
        let credential = &session.identity.credential;

        // 1. Upload the new object and resolve its URL
        self.blobs()
            .upload(credential, &new_path, encoded.bytes, "image/jpeg")
            .await
            .map_err(PhotoError::Upload)?;

        // 2. Point the identity profile at it
        let identity = match self.swap_photo_url(&session.identity, &new_path).await {
            Ok(identity) => identity,
            Err(e) => {
                self.discard_photo(uid, credential, &new_path).await;
                return Err(PhotoError::Upload(e).into());
            }
        };
        self.update_cached(uid, |entry| {
            entry.user.apply_identity(&identity);
            entry.identity = identity.clone();
        });

        tracing::info!(
            uid,
            path = %new_path,
            width = encoded.width,
            height = encoded.height,
            "Profile photo updated"
        );

        // 3. Drop the previous object
        if let Some(old_path) = previous_path.filter(|old_path| *old_path != new_path) {
            self.discard_photo(uid, credential, &old_path).await;
        }

        self.current_user(uid).ok_or(AppError::NoCurrentUser)
    }

    async fn swap_photo_url(
        &self,
        identity: &IdentityUser,
        path: &str,
    ) -> Result<IdentityUser, BackendError> {
        let url = self.blobs().download_url(&identity.credential, path).await?;
        self.identity()
            .update_profile(identity, IdentityProfileUpdate::photo_url(url))
            .await
    }

    /// Best-effort delete of a photo object that is no longer referenced.
    async fn discard_photo(&self, uid: &str, credential: &IdentityCredential, path: &str) {
        if let Err(e) = self.blobs().delete(credential, path).await {
            tracing::warn!(uid, path, error = %e, "Failed to delete unreferenced photo");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 80, 40]),
        ));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_fit_within_preserves_aspect_ratio() {
        assert_eq!(fit_within(4000, 2000, 1000, 1000), (1000, 500));
        assert_eq!(fit_within(2000, 4000, 1000, 1000), (500, 1000));
        assert_eq!(fit_within(3000, 1000, 1000, 200), (600, 200));
    }

    #[test]
    fn test_fit_within_never_upscales() {
        assert_eq!(fit_within(640, 480, 1000, 1000), (640, 480));
        assert_eq!(fit_within(1000, 1000, 1000, 1000), (1000, 1000));
    }

    #[test]
    fn test_fit_within_extreme_ratio_keeps_one_pixel() {
        assert_eq!(fit_within(10000, 1, 1000, 1000), (1000, 1));
    }

    #[test]
    fn test_resize_to_jpeg_bounds_output() {
        let settings = PhotoSettings {
            max_width: 100,
            max_height: 100,
            ..Default::default()
        };
        let encoded = resize_to_jpeg(&png(400, 200), &settings).unwrap();
        assert_eq!((encoded.width, encoded.height), (100, 50));

        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!(
            image::guess_format(&encoded.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn test_resize_to_jpeg_rejects_garbage() {
        let err = resize_to_jpeg(b"definitely not an image", &PhotoSettings::default())
            .unwrap_err();
        assert!(matches!(err, PhotoError::Decode(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_resize_to_jpeg_rejects_oversized_upload() {
        let settings = PhotoSettings {
            max_upload_bytes: 16,
            ..Default::default()
        };
        let err = resize_to_jpeg(&png(8, 8), &settings).unwrap_err();
        assert!(matches!(err, PhotoError::TooLarge { .. }));
    }

    #[test]
    fn test_extract_file_format_from_storage_url() {
        let url = "https://firebasestorage.googleapis.com/v0/b/dogo.appspot.com/o/users%2Fabc%2FprofilePhoto%2FuserProfile.PNG?alt=media&token=123";
        assert_eq!(extract_file_format(url), Some("png".to_string()));
    }

    #[test]
    fn test_extract_file_format_unsupported_or_missing() {
        assert_eq!(extract_file_format("https://example.com/photo.exe"), None);
        assert_eq!(extract_file_format("https://example.com/photo"), None);
        assert_eq!(extract_file_format(""), None);
        assert_eq!(
            extract_file_format("https://example.com/a.jpg#frag"),
            Some("jpg".to_string())
        );
    }

    #[test]
    fn test_photo_path_from_url() {
        assert_eq!(
            photo_path_from_url(
                "abc",
                "https://x/o/users%2Fabc%2FprofilePhoto%2FuserProfile-1714552200000.jpeg?alt=media&token=7"
            ),
            Some("users/abc/profilePhoto/userProfile-1714552200000.jpeg".to_string())
        );
        // Photos stored before versioned names
        assert_eq!(
            photo_path_from_url("abc", "https://x/o/users%2Fabc%2FprofilePhoto%2FuserProfile.png?alt=media"),
            Some("users/abc/profilePhoto/userProfile.png".to_string())
        );
    }

    #[test]
    fn test_photo_path_from_foreign_url() {
        // Another user's directory
        assert_eq!(
            photo_path_from_url("abc", "https://x/o/users%2Fxyz%2FprofilePhoto%2FuserProfile.png"),
            None
        );
        // An avatar hosted elsewhere
        assert_eq!(
            photo_path_from_url("abc", "https://lh3.googleusercontent.com/a/photo.jpg"),
            None
        );
        assert_eq!(photo_path_from_url("abc", ""), None);
    }

    #[test]
    fn test_profile_photo_path_is_versioned() {
        assert_eq!(
            profile_photo_path("abc", 42),
            "users/abc/profilePhoto/userProfile-42.jpeg"
        );
        assert_ne!(profile_photo_path("abc", 1), profile_photo_path("abc", 2));
    }
}
