//! Image relay for the tracker frontend
//!
//! The card catalog's image host does not allow cross-origin embedding, so
//! the frontend loads images through this endpoint instead: the relay
//! fetches the original server-side and streams the body back with
//! long-lived caching and permissive CORS headers. No transformation is
//! applied.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// User-Agent sent on upstream fetches
pub const RELAY_USER_AGENT: &str = "Mozilla/5.0 (compatible; Pocket TCG Tracker)";

/// Content type assumed when the origin does not send one
const DEFAULT_CONTENT_TYPE: &str = "image/webp";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub http_client: reqwest::Client,
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing image URL")]
    MissingUrl,

    #[error("Internal server error")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            RelayError::MissingUrl => StatusCode::BAD_REQUEST,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

#[derive(Deserialize)]
pub struct ProxyParams {
    url: Option<String>,
}

/// Build the relay router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/image-proxy", get(image_proxy))
        .with_state(state)
}

async fn image_proxy(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Result<Response, RelayError> {
    let url = params.url.ok_or(RelayError::MissingUrl)?;

    let upstream = state
        .http_client
        .get(&url)
        .header("User-Agent", RELAY_USER_AGENT)
        .send()
        .await
        .map_err(|err| {
            warn!("upstream image fetch failed: {err}");
            err
        })?;

    if !upstream.status().is_success() {
        let status = StatusCode::from_u16(upstream.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        return Ok((status, "Failed to fetch image").into_response());
    }

    let content_type = upstream
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let body = upstream.bytes().await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
        ],
        body,
    )
        .into_response())
}
