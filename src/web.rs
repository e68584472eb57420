//! HTTP API router and handlers.
//!
//! Exposes the checker over `GET /api/check` and `GET /api/compliance`,
//! both taking the query in the `q` parameter.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};

use crate::checker::ComplianceChecker;
use crate::error::{ComplianceError, ErrorContext};
use crate::health::health_handler;
use crate::models::{CheckSummary, ComplianceResult};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Request logging middleware layer
#[derive(Clone)]
pub struct RequestLoggingLayer;

impl<S> Layer<S> for RequestLoggingLayer {
    type Service = RequestLoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggingService { inner }
    }
}

/// Service that logs all requests with method, path, status, and response time
#[derive(Clone)]
pub struct RequestLoggingService<S> {
    inner: S,
}

impl<S> Service<Request> for RequestLoggingService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().clone();
        // Path only; the query string carries user input.
        let path = req.uri().path().to_string();
        let start = std::time::Instant::now();

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            let duration = start.elapsed();
            let status = response.status();

            tracing::info!(
                method = %method,
                path = %path,
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                "HTTP request"
            );

            Ok(response)
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<ComplianceChecker>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Create an error response with a request ID for tracking
    pub fn with_request_id(error: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            request_id: Some(request_id.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub q: Option<String>,
}

/// Convert a [`ComplianceError`] into an API error, logging it first.
fn handle_error(error: ComplianceError, context: ErrorContext) -> ApiError {
    error.log_with_context(&context);

    let status = match &error {
        ComplianceError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        ComplianceError::Http(_) | ComplianceError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        ComplianceError::InternalState(_) | ComplianceError::Io(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse::with_request_id(
            error.user_message(),
            context.request_id,
        )),
    )
}

/// Pull a non-blank `q` out of the query string.
fn required_query(params: CheckQuery, operation: &str) -> Result<String, ApiError> {
    match params.q {
        Some(q) if !q.trim().is_empty() => Ok(q),
        _ => Err(handle_error(
            ComplianceError::InvalidQuery("missing q parameter".to_string()),
            ErrorContext::new(operation),
        )),
    }
}

async fn check_handler(
    State(state): State<AppState>,
    Query(params): Query<CheckQuery>,
) -> Result<Json<CheckSummary>, ApiError> {
    let query = required_query(params, "check")?;
    let result = state.checker.check_creator(&query).await;
    Ok(Json(result.summary()))
}

async fn compliance_handler(
    State(state): State<AppState>,
    Query(params): Query<CheckQuery>,
) -> Result<Json<ComplianceResult>, ApiError> {
    let query = required_query(params, "compliance")?;
    Ok(Json(state.checker.check_resource_compliance(&query).await))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/check", get(check_handler))
        .route("/api/compliance", get(compliance_handler))
        .route("/health", get(health_handler))
        .layer(RequestLoggingLayer)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::checker::ComplianceChecker;
    use crate::filter::{ContentFilter, TermSet};
    use crate::models::{BlacklistEntry, Category, Severity};
    use crate::source::{KeywordLists, MemorySource};
    use crate::web::{build_router, AppState, ErrorResponse};

    fn app() -> axum::Router {
        let lists = KeywordLists {
            blacklist_entries: vec![BlacklistEntry::new("leakzone", "lz")
                .with_reason("Reselling leaked scripts")
                .with_category(Category::Tebex)
                .with_severity(Severity::High)
                .with_flagged_by("mod-team")],
            ip_violation_keywords: vec!["nike".to_string()],
            ..Default::default()
        };
        let checker = ComplianceChecker::new(
            Arc::new(MemorySource::new(lists)),
            ContentFilter::new(TermSet::default_terms().expect("defaults")),
        );
        build_router(AppState {
            checker: Arc::new(checker),
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[test]
    fn error_response_with_request_id() {
        let err = ErrorResponse::with_request_id("test error", "req-123");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("test error"));
        assert!(json.contains("req-123"));
    }

    #[tokio::test]
    async fn check_returns_camel_case_summary() {
        let (status, body) = get_json("/api/check?q=leakzone").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isBlacklisted"], true);
        assert_eq!(body["matchType"], "exact");
        assert_eq!(body["matchedCreator"], "leakzone");
        assert_eq!(body["category"], "tebex");
        assert_eq!(body["severity"], "high");
        assert_eq!(body["possibleFalsePositive"], false);
    }

    #[tokio::test]
    async fn check_reports_ip_violation() {
        let (status, body) = get_json("/api/check?q=nike%20shoes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matchType"], "ip_violation");
        assert_eq!(body["matchedKeywords"][0], "nike");
    }

    #[tokio::test]
    async fn compliance_clean_query() {
        let (status, body) = get_json("/api/compliance?q=totally-unique-resource-xyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isCompliant"], true);
        assert_eq!(body["issues"].as_array().map(Vec::len), Some(0));
        assert_eq!(body["severity"], "low");
        assert!(body.get("matchedCreator").is_none());
    }

    #[tokio::test]
    async fn compliance_blocked_query() {
        let (status, body) = get_json("/api/compliance?q=gay%20resource%20pack").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isCompliant"], false);
        assert_eq!(body["matchedCreator"], "Content Filter");
    }

    #[tokio::test]
    async fn missing_or_blank_query_is_bad_request() {
        for uri in ["/api/check", "/api/check?q=", "/api/compliance?q=%20%20"] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "Please provide a search query");
            assert!(body["request_id"].is_string());
        }
    }

    #[tokio::test]
    async fn health_is_routed() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
