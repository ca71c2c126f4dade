//! Authentication against the hosted auth service

mod session;
mod types;

use reqwest::{Client, Response};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;

pub use session::*;
pub use types::*;

/// Sessions this close to expiry are refreshed before use, matching the
/// refresh window the web client used.
const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Client for the email/password auth service
#[derive(Clone)]
pub struct Auth {
    /// The base URL for the backend project
    url: String,

    /// The anonymous API key for the backend project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session, shared with every accessor cloned off this client
    session: Arc<RwLock<Option<Session>>>,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, key: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(RwLock::new(None)),
            options,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    async fn auth_response(&self, response: Response) -> Result<AuthResponse, Error> {
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<AuthApiError>(&text) {
                Ok(payload) => payload.message(),
                Err(_) => text,
            };
            return Err(Error::auth(message));
        }

        let result = response.json::<AuthResponse>().await?;
        Ok(result)
    }

    fn store_session(&self, response: &AuthResponse) {
        let mut current = self.session.write().unwrap();
        *current = Some(Session::from_response(response));
    }

    /// Sign up a new user with email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let url = self.auth_url("/signup");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        body.insert("password".to_string(), password.to_string());

        let response = Fetch::post(&self.client, &url)
            .apikey(&self.key)
            .json(&body)?
            .timeout(self.options.request_timeout)
            .send()
            .await?;

        let result = self.auth_response(response).await?;
        self.store_session(&result);

        Ok(result)
    }

    /// Sign in a user with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let url = self.auth_url("/token?grant_type=password");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        body.insert("password".to_string(), password.to_string());

        let response = Fetch::post(&self.client, &url)
            .apikey(&self.key)
            .json(&body)?
            .timeout(self.options.request_timeout)
            .send()
            .await?;

        let result = self.auth_response(response).await?;
        self.store_session(&result);

        Ok(result)
    }

    /// Sign out the current user and clear the session
    pub async fn sign_out(&self) -> Result<(), Error> {
        let token = {
            let current = self.session.read().unwrap();
            match *current {
                Some(ref session) => session.access_token.clone(),
                None => return Err(Error::AuthRequired),
            }
        };

        let url = self.auth_url("/logout");
        Fetch::post(&self.client, &url)
            .apikey(&self.key)
            .bearer_auth(&token)
            .timeout(self.options.request_timeout)
            .send()
            .await?;

        let mut current = self.session.write().unwrap();
        *current = None;

        Ok(())
    }

    /// Exchange the refresh token for a new session.
    ///
    /// One-shot: a failed refresh clears the session so the caller surfaces
    /// "please sign in again" instead of retrying forever.
    pub async fn refresh_session(&self) -> Result<Session, Error> {
        let refresh_token = {
            let current = self.session.read().unwrap();
            match *current {
                Some(ref session) => session.refresh_token.clone(),
                None => return Err(Error::AuthRequired),
            }
        };

        let url = self.auth_url("/token?grant_type=refresh_token");

        let mut body = HashMap::new();
        body.insert("refresh_token".to_string(), refresh_token);

        let sent = Fetch::post(&self.client, &url)
            .apikey(&self.key)
            .json(&body)?
            .timeout(self.options.request_timeout)
            .send()
            .await;

        let result = match sent {
            Ok(response) => self.auth_response(response).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(response) => {
                self.store_session(&response);
                Ok(Session::from_response(&response))
            }
            Err(err) => {
                log::warn!("session refresh failed, clearing session: {}", err);
                let mut current = self.session.write().unwrap();
                *current = None;
                Err(Error::AuthRequired)
            }
        }
    }

    /// Get a valid access token, refreshing the session first when it is
    /// expired or about to expire
    pub async fn access_token(&self) -> Result<String, Error> {
        let session = self.current_session().ok_or(Error::AuthRequired)?;

        if session.is_expired() || session.expires_within(REFRESH_MARGIN) {
            if self.options.auto_refresh_token {
                let refreshed = self.refresh_session().await?;
                return Ok(refreshed.access_token);
            }
            if session.is_expired() {
                return Err(Error::AuthRequired);
            }
        }

        Ok(session.access_token)
    }

    /// Access token for request plumbing: absent session is not an error here,
    /// the request goes out with the anonymous key only
    pub(crate) async fn bearer_token(&self) -> Result<Option<String>, Error> {
        if self.current_session().is_none() {
            return Ok(None);
        }
        Ok(Some(self.access_token().await?))
    }

    /// The user ID of the current session
    pub fn require_user_id(&self) -> Result<String, Error> {
        let current = self.session.read().unwrap();
        match *current {
            Some(ref session) => Ok(session.user.id.clone()),
            None => Err(Error::AuthRequired),
        }
    }

    /// Get the current session
    pub fn current_session(&self) -> Option<Session> {
        let current = self.session.read().unwrap();
        current.clone()
    }

    /// Set the session
    pub fn set_session(&self, session: Session) {
        let mut current = self.session.write().unwrap();
        *current = Some(session);
    }
}
