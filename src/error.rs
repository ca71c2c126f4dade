//! Error handling for the tracker client

use std::fmt;
use thiserror::Error;

/// Unified error type for the tracker client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// No authenticated session, or the session could not be refreshed
    #[error("authentication required, please sign in again")]
    AuthRequired,

    /// The auth service rejected a sign-up or sign-in attempt
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The backend store rejected or failed a row operation
    #[error("Backend error: {0}")]
    Backend(String),

    /// The card catalog feed could not be fetched or parsed
    #[error("Catalog unavailable: {0}")]
    Catalog(String),

    /// A unique constraint was violated on the backend
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Another profile already holds this friend code
    #[error("friend code is already taken")]
    DuplicateFriendCode,

    /// Another profile already holds this username
    #[error("username is already taken")]
    DuplicateUsername,

    /// No profile row exists for the requested user
    #[error("profile not found")]
    ProfileNotFound,

    /// Malformed user input
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new backend error
    pub fn backend<T: fmt::Display>(msg: T) -> Self {
        Error::Backend(msg.to_string())
    }

    /// Create a new catalog error
    pub fn catalog<T: fmt::Display>(msg: T) -> Self {
        Error::Catalog(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }
}
