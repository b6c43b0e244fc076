// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod explore;
pub mod photo;
pub mod profile;
pub mod session;

pub use explore::{ExploreView, GeolocationOptions, PositionReading, PositionReport};
pub use photo::{PhotoError, PhotoSettings};
pub use profile::ProfileUpdate;
pub use session::{AuthStateChange, Registration, SessionService, SessionState};
