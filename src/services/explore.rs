// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Explore map: device position reports and the map view around them.

use crate::error::AppError;
use crate::models::{Position, DEFAULT_POSITION};
use crate::services::profile::ProfileUpdate;
use crate::services::session::SessionService;
use crate::time_utils::{is_older_than, unix_millis};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_ZOOM: u8 = 17;
pub const MIN_ZOOM: u8 = 5;
pub const MAX_ZOOM: u8 = 18;

pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

const MARKER_POPUP: &str = "Your location here!";

/// Options the client passes to the device geolocation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationOptions {
    pub enable_high_accuracy: bool,
    /// Milliseconds before the lookup is abandoned
    pub timeout: u64,
    /// Oldest cached fix the client may reuse, in milliseconds
    pub maximum_age: u64,
}

pub const GEOLOCATION_OPTIONS: GeolocationOptions = GeolocationOptions {
    enable_high_accuracy: true,
    timeout: 60_000,
    maximum_age: 60_000,
};

/// A device location fix.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PositionReading {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// When the fix was taken (Unix milliseconds)
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
}

impl PositionReading {
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }

    /// Whether the fix is older than the geolocation maximum age.
    fn is_stale(&self, now_ms: i64) -> bool {
        self.timestamp_ms
            .is_some_and(|ts| is_older_than(ts, now_ms, GEOLOCATION_OPTIONS.maximum_age))
    }
}

/// Outcome of a position report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionReport {
    pub position: Position,
    /// False when the movement was below the threshold and nothing was written
    pub persisted: bool,
}

/// Everything the client needs to render the explore map.
#[derive(Debug, Clone, Serialize)]
pub struct ExploreView {
    pub center: Position,
    /// True when the user has no stored position and the fallback is used
    pub is_default: bool,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_url: &'static str,
    pub attribution: &'static str,
    pub geolocation: GeolocationOptions,
    pub markers: FeatureCollection,
}

impl SessionService {
    /// Record a device position, persisting it only if it moved far enough.
    pub async fn report_position(
        &self,
        uid: &str,
        reading: PositionReading,
    ) -> Result<PositionReport, AppError> {
        reading
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if reading.is_stale(unix_millis(chrono::Utc::now())) {
            return Err(AppError::BadRequest("Position reading is too old".to_string()));
        }

        let current = self
            .current_user(uid)
            .ok_or(AppError::NoCurrentUser)?
            .last_position
            .unwrap_or(DEFAULT_POSITION);
        let position = reading.position();

        if !position.drifted_from(&current) {
            tracing::debug!(uid, "Position change below threshold, not persisted");
            return Ok(PositionReport {
                position: current,
                persisted: false,
            });
        }

        self.update_profile(uid, ProfileUpdate::position(position))
            .await?;

        Ok(PositionReport {
            position,
            persisted: true,
        })
    }

    /// Map view centered on the user's last known position.
    pub fn explore_view(&self, uid: &str) -> Result<ExploreView, AppError> {
        let user = self.current_user(uid).ok_or(AppError::NoCurrentUser)?;
        let (center, is_default) = match user.last_position {
            Some(position) => (position, false),
            None => (DEFAULT_POSITION, true),
        };

        Ok(ExploreView {
            center,
            is_default,
            zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            tile_url: TILE_URL,
            attribution: TILE_ATTRIBUTION,
            geolocation: GEOLOCATION_OPTIONS,
            markers: position_marker(center),
        })
    }
}

/// A single-point feature collection marking `position`.
fn position_marker(position: Position) -> FeatureCollection {
    let mut properties = JsonObject::new();
    properties.insert("popup".to_string(), MARKER_POPUP.into());

    let feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&position.to_point()))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    };

    FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    }
}
