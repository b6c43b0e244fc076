// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! DogoWalker: a community app for dog owners.
//!
//! This crate provides the backend API for accounts, profiles, profile
//! photos, and the explore map that tracks where each walker last was.

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use backend::memory::{MemoryBlobStore, MemoryDocumentStore, MemoryIdentity};
use config::Config;
use services::SessionService;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionService,
}

impl AppState {
    /// State backed entirely by in-process stores.
    pub fn in_memory(config: Config) -> Self {
        let sessions = SessionService::new(
            Arc::new(MemoryIdentity::new()),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryBlobStore::new(&config.storage_bucket)),
            config.photo,
        );
        Self { config, sessions }
    }
}
