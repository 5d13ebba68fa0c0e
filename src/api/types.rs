//! Shared types for the API layer.

use std::sync::Arc;

use serde::Deserialize;

use crate::core_state::CoreState;

/// Shared context for routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Caller identity, injected by `require_user`.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
}

pub const DEFAULT_SESSION_ID: &str = "default";

/// `POST /api/chat` body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub response_length: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Session id with blank values treated as the default session.
    pub fn session(&self) -> &str {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SESSION_ID)
    }
}
