//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::codec::SessionInfo;

// ============================================================================
// Refresh
// ============================================================================

/// Refresh request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair delivered on refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token_type: String,
    pub access_token: String,
    /// Access token expiry as Unix millis
    pub access_expires_at_ms: i64,
    pub refresh_token: String,
    /// Refresh token expiry as Unix millis
    pub refresh_expires_at_ms: i64,
}

impl From<SessionInfo> for SessionResponse {
    fn from(info: SessionInfo) -> Self {
        Self {
            token_type: info.token_type,
            access_token: info.access_token,
            access_expires_at_ms: info.access_expires_at.timestamp_millis(),
            refresh_token: info.refresh_token,
            refresh_expires_at_ms: info.refresh_expires_at.timestamp_millis(),
        }
    }
}

// ============================================================================
// Session Status
// ============================================================================

/// Session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub roles: Vec<String>,
    /// Access token expiry as Unix millis
    pub expires_at_ms: Option<i64>,
}

impl SessionStatusResponse {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            user_id: None,
            user_name: None,
            roles: Vec::new(),
            expires_at_ms: None,
        }
    }
}
