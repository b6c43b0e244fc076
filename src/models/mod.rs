// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod dog;
pub mod position;
pub mod user;

pub use dog::{DogRef, DogsDocument, FriendRef};
pub use position::{Position, DEFAULT_POSITION, POSITION_EPSILON_DEG};
pub use user::{AccountType, CurrentUser, UserDocument, UserPatch};
