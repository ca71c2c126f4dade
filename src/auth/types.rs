//! Types for authentication and session management

use serde::{Deserialize, Serialize};

/// Response returned by the auth service for sign-up, sign-in and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The access token
    #[serde(rename = "access_token")]
    pub access_token: String,

    /// The refresh token
    #[serde(rename = "refresh_token")]
    pub refresh_token: String,

    /// The token type (always "bearer")
    #[serde(rename = "token_type")]
    pub token_type: String,

    /// The expiry time in seconds
    #[serde(rename = "expires_in")]
    pub expires_in: i64,

    /// The authenticated user
    pub user: User,
}

/// User data as returned by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: String,

    /// The user's email address
    pub email: Option<String>,

    /// The user's role
    pub role: Option<String>,

    /// The creation time
    #[serde(rename = "created_at")]
    pub created_at: Option<String>,

    /// The update time
    #[serde(rename = "updated_at")]
    pub updated_at: Option<String>,
}

/// Error payload returned by the auth service
#[derive(Debug, Deserialize)]
pub struct AuthApiError {
    pub error: Option<String>,
    #[serde(rename = "error_description")]
    pub error_description: Option<String>,
    pub msg: Option<String>,
    pub message: Option<String>,
}

impl AuthApiError {
    /// Best-effort human readable message out of the payload variants
    pub fn message(&self) -> String {
        self.error_description
            .as_ref()
            .or(self.msg.as_ref())
            .or(self.message.as_ref())
            .or(self.error.as_ref())
            .cloned()
            .unwrap_or_else(|| "unknown auth error".to_string())
    }
}
