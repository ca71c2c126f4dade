//! Session management for authentication

use super::types::{AuthResponse, User};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Session data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    #[serde(rename = "access_token")]
    pub access_token: String,

    /// The refresh token
    #[serde(rename = "refresh_token")]
    pub refresh_token: String,

    /// The token type
    #[serde(rename = "token_type")]
    pub token_type: String,

    /// The expiry time in seconds
    #[serde(rename = "expires_in")]
    pub expires_in: i64,

    /// The expiry timestamp
    #[serde(rename = "expires_at")]
    pub expires_at: Option<i64>,

    /// The authenticated user
    pub user: User,
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs() as i64
}

impl Session {
    /// Build a session from an auth service response
    pub fn from_response(response: &AuthResponse) -> Self {
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            token_type: response.token_type.clone(),
            expires_in: response.expires_in,
            expires_at: Some(unix_now() + response.expires_in),
            user: response.user.clone(),
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => unix_now() >= expires_at,
            None => false,
        }
    }

    /// Check if the session expires within the given margin
    pub fn expires_within(&self, margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => unix_now() + margin.as_secs() as i64 >= expires_at,
            None => false,
        }
    }
}
