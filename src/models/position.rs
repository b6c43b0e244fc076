// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geographic position model.

use geo::Point;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Movement below this many degrees (on both axes) is not persisted.
pub const POSITION_EPSILON_DEG: f64 = 0.0001;

/// Fallback map center when a user has no known position (Warsaw).
pub const DEFAULT_POSITION: Position = Position {
    latitude: 52.237049,
    longitude: 21.017532,
};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Position {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether `other` is far enough away from `self` to be worth persisting.
    ///
    /// Each axis is compared independently against [`POSITION_EPSILON_DEG`].
    pub fn drifted_from(&self, other: &Position) -> bool {
        (self.latitude - other.latitude).abs() > POSITION_EPSILON_DEG
            || (self.longitude - other.longitude).abs() > POSITION_EPSILON_DEG
    }

    /// Convert to a geo point (x = longitude, y = latitude).
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

impl From<Point<f64>> for Position {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}
