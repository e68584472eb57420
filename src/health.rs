//! Health check endpoint for deployment platform monitoring.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Build timestamp, plus the short commit hash when built from git.
    pub build: String,
}

/// Health check handler, always 200 while the process is serving.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        build: build_info(),
    })
}

fn build_info() -> String {
    let timestamp = env!("BUILD_TIMESTAMP");
    match option_env!("GIT_COMMIT") {
        Some(commit) => format!("{} ({})", timestamp, commit),
        None => timestamp.to_string(),
    }
}
