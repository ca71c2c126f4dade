//! Row-level access to the hosted relational backend
//!
//! A cut-down PostgREST-style builder covering what the tracker needs:
//! filtered selects, idempotent inserts, updates and deletes on the
//! `user_profiles` and `missing_cards` tables.

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::auth::Auth;
use crate::error::Error;
use crate::fetch::FetchBuilder;

/// Error payload returned by the backend's REST layer
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Query builder for a single backend table
pub struct Table {
    base_url: String,
    api_key: String,
    table: String,
    http_client: Client,
    auth: Option<Auth>,
    query_pairs: Vec<(String, String)>,
    prefer: Vec<&'static str>,
    timeout: Option<Duration>,
}

impl Table {
    /// Create a new table client
    pub fn new(base_url: &str, api_key: &str, table: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
            http_client,
            auth: None,
            query_pairs: Vec::new(),
            prefer: vec!["return=minimal"],
            timeout: None,
        }
    }

    /// Attach an auth client; its session token is sent as the bearer and a
    /// rejected token is refreshed and retried once
    pub fn with_auth(mut self, auth: &Auth) -> Self {
        self.auth = Some(auth.clone());
        self
    }

    /// Apply a per-request timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Specify the columns to select
    pub fn select(mut self, columns: &str) -> Self {
        self.query_pairs
            .push(("select".to_string(), columns.to_string()));
        self
    }

    /// Equality filter
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.query_pairs
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// Inequality filter
    pub fn neq(mut self, column: &str, value: &str) -> Self {
        self.query_pairs
            .push((column.to_string(), format!("neq.{}", value)));
        self
    }

    /// Membership filter
    pub fn in_list(mut self, column: &str, values: &[String]) -> Self {
        self.query_pairs
            .push((column.to_string(), format!("in.({})", values.join(","))));
        self
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.query_pairs
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: u32) -> Self {
        self.query_pairs
            .push(("limit".to_string(), count.to_string()));
        self
    }

    /// Ask the backend to silently drop duplicate rows on insert
    pub fn ignore_duplicates(mut self) -> Self {
        self.prefer.push("resolution=ignore-duplicates");
        self
    }

    /// Ask the backend to overwrite existing rows on key conflict (upsert)
    pub fn merge_duplicates(mut self) -> Self {
        self.prefer.push("resolution=merge-duplicates");
        self
    }

    /// Ask the backend to return the affected rows
    fn return_representation(mut self) -> Self {
        self.prefer.retain(|p| *p != "return=minimal");
        self.prefer.push("return=representation");
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    async fn error_from_response(response: Response) -> Error {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if let Ok(details) = serde_json::from_str::<ApiErrorDetails>(&text) {
            if details.code.as_deref() == Some(UNIQUE_VIOLATION) || status == StatusCode::CONFLICT {
                return Error::Conflict(details.to_string());
            }
            if status == StatusCode::UNAUTHORIZED {
                return Error::AuthRequired;
            }
            return Error::backend(format!("{} (Status: {})", details, status));
        }

        if status == StatusCode::UNAUTHORIZED {
            return Error::AuthRequired;
        }
        Error::backend(format!("Status {}: {}", status, text))
    }

    async fn request_once(
        &self,
        method: &Method,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Response, Error> {
        let mut builder = FetchBuilder::new(&self.http_client, &self.table_url(), method.clone())
            .apikey(&self.api_key)
            .header("Prefer", &self.prefer.join(","))
            .timeout(self.timeout);

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        for (key, value) in &self.query_pairs {
            builder = builder.query_pair(key, value);
        }
        if let Some(body) = body {
            builder = builder.json(body)?;
        }

        // Transport failures against the store are a backend outage to callers
        builder.send().await.map_err(|err| match err {
            Error::Http(e) => Error::backend(e),
            other => other,
        })
    }

    /// Execute the request, refreshing a rejected session token once
    async fn request(&self, method: Method, body: Option<Value>) -> Result<Response, Error> {
        let token = match &self.auth {
            Some(auth) => auth.bearer_token().await?,
            None => None,
        };

        let response = self
            .request_once(&method, body.as_ref(), token.as_deref())
            .await?;
        if response.status().is_success() {
            return Ok(response);
        }

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(auth) = &self.auth {
                if token.is_some() {
                    log::debug!("token rejected by backend, refreshing session and retrying");
                    let refreshed = auth.refresh_session().await?;
                    let retried = self
                        .request_once(&method, body.as_ref(), Some(&refreshed.access_token))
                        .await?;
                    if retried.status().is_success() {
                        return Ok(retried);
                    }
                    return Err(Self::error_from_response(retried).await);
                }
            }
        }

        Err(Self::error_from_response(response).await)
    }

    /// Fetch matching rows
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, Error> {
        let response = self.request(Method::GET, None).await?;
        let rows = response.json::<Vec<T>>().await.map_err(Error::backend)?;
        Ok(rows)
    }

    /// Insert a row
    pub async fn insert<T: Serialize>(self, row: &T) -> Result<(), Error> {
        let body = serde_json::to_value(row)?;
        self.request(Method::POST, Some(body)).await?;
        Ok(())
    }

    /// Update matching rows, returning them
    pub async fn update<T: Serialize>(self, patch: &T) -> Result<Vec<Value>, Error> {
        let body = serde_json::to_value(patch)?;
        let response = self
            .return_representation()
            .request(Method::PATCH, Some(body))
            .await?;
        let rows = response.json::<Vec<Value>>().await.map_err(Error::backend)?;
        Ok(rows)
    }

    /// Delete matching rows
    pub async fn delete(self) -> Result<(), Error> {
        self.request(Method::DELETE, None).await?;
        Ok(())
    }
}
