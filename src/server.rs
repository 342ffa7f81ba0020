//! Upload viewer: a small axum app that turns an uploaded datasheet into the
//! HTML results page.
//!
//! | Route          | Purpose                                          |
//! |----------------|--------------------------------------------------|
//! | `GET /`        | upload form                                      |
//! | `POST /extract`| multipart field `file` → results page            |
//! | `GET /health`  | JSON liveness probe                              |
//!
//! Body size is capped both by axum's `DefaultBodyLimit` (multipart fields)
//! and by `RequestBodyLimitLayer` (whole request).

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extract::extract_from_bytes;
use crate::viewer::{self, escape_html, ViewerOptions};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Default request body limit: 100 MB.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 100 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    config: Arc<ExtractionConfig>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// An error rendered as an HTML page with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        let status = match &e {
            ExtractError::NotAPdf { .. } | ExtractError::CorruptPdf { .. } => StatusCode::BAD_REQUEST,
            ExtractError::PasswordRequired { .. } | ExtractError::WrongPassword { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!("Request failed: {}", self.message);
        }
        let options = ViewerOptions {
            upload_action: Some("/extract".into()),
            ..ViewerOptions::default()
        };
        let page = viewer::render_upload_page(&options).replace(
            "</main>",
            &format!(
                "<div class=\"warning\">{}</div>\n</main>",
                escape_html(&self.message).replace('\n', "<br>")
            ),
        );
        (self.status, Html(page)).into_response()
    }
}

/// Router with the default body limit.
pub fn create_router(config: ExtractionConfig) -> Router {
    create_router_with_limit(config, DEFAULT_BODY_LIMIT_BYTES)
}

/// Router with an explicit request body limit in bytes.
pub fn create_router_with_limit(config: ExtractionConfig, max_body_bytes: usize) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/extract", post(extract_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn serve(
    host: impl AsRef<str>,
    port: u16,
    config: ExtractionConfig,
    max_body_bytes: usize,
) -> Result<(), ExtractError> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| ExtractError::InvalidConfig(format!("Invalid host address: {}", e)))?;
    let addr = SocketAddr::new(ip, port);
    let app = create_router_with_limit(config, max_body_bytes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ExtractError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    info!("Datasheet viewer listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ExtractError::Internal(e.to_string()))
}

/// GET /
async fn index_handler() -> Html<String> {
    Html(viewer::render_upload_page(&ViewerOptions {
        upload_action: Some("/extract".into()),
        ..ViewerOptions::default()
    }))
}

/// POST /extract
///
/// Reads the multipart field `file`, runs the extraction with the server's
/// configuration and answers with the results page.
async fn extract_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, ApiError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError {
        status: e.status(),
        message: e.body_text(),
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(|e| ApiError {
            status: e.status(),
            message: e.body_text(),
        })?;
        upload = Some((file_name, data.to_vec()));
    }

    let Some((file_name, data)) = upload else {
        return Err(ApiError::bad_request("No file uploaded. Choose a PDF datasheet."));
    };
    if data.is_empty() {
        return Err(ApiError::bad_request("The uploaded file is empty."));
    }
    info!(
        "Received upload {:?} ({} bytes)",
        file_name.as_deref().unwrap_or("<unnamed>"),
        data.len()
    );

    let output = extract_from_bytes(&data, &state.config).await?;
    let options = ViewerOptions {
        upload_action: Some("/extract".into()),
        ..ViewerOptions::default()
    };
    Ok(Html(viewer::render_html(&output, &options)?))
}

/// GET /health
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
