use crate::error::ServiceError;
use crate::orchestrator::ReadmeGenerator;
use crate::visitors::VisitorLedger;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

/// Header carrying the client address behind a proxy
pub const CLIENT_HEADER: &str = "x-forwarded-for";

const MISSING_URL_MESSAGE: &str = "GitHub URL is required";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    generator: ReadmeGenerator,
    ledger: Arc<VisitorLedger>,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates state around a generator and the single ledger instance
    pub fn new(generator: ReadmeGenerator, ledger: Arc<VisitorLedger>) -> Self {
        Self {
            generator,
            ledger,
            started_at: Utc::now(),
        }
    }
}

/// Request payload for README generation
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Repository URL or `owner/name`
    pub url: Option<String>,
}

/// Successful generation response
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated document
    pub readme: String,
}

/// Visitor count response
#[derive(Debug, Serialize, Deserialize)]
pub struct VisitorCount {
    /// Number of unique visitors
    pub count: usize,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current status
    pub status: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
    /// Service uptime in seconds
    pub uptime: u64,
}

/// A [`ServiceError`] rendered as `{error}` with its HTTP status
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (status, Json(ErrorBody { error: self.0.public_message() })).into_response()
    }
}

/// Builds the router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/generate", post(generate_readme))
        .route("/api/generate", post(generate_readme))
        .route("/visitors", get(get_visitors).post(record_visitor))
        .route("/api/visitors", get(get_visitors).post(record_visitor))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds().max(0) as u64;
    Json(HealthResponse {
        service: "readmeservice".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime,
    })
}

/// Generate a README for the submitted repository
async fn generate_readme(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let url = match payload {
        Ok(Json(GenerateRequest { url: Some(url) })) if !url.trim().is_empty() => url,
        _ => return Err(ServiceError::InvalidInput(MISSING_URL_MESSAGE.to_string()).into()),
    };

    info!("README requested for {}", url);
    let readme = state.generator.generate(&url).await?;
    Ok(Json(GenerateResponse { readme }))
}

/// Current unique visitor count
async fn get_visitors(State(state): State<AppState>) -> Result<Json<VisitorCount>, ApiError> {
    let count = state.ledger.peek().await?;
    Ok(Json(VisitorCount { count }))
}

/// Record the calling client and return the unique visitor count
async fn record_visitor(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VisitorCount>, ApiError> {
    let identifier = headers
        .get(CLIENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown");

    let count = state.ledger.record(identifier).await?;
    Ok(Json(VisitorCount { count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::{RecordingCompletion, StaticHost};
    use crate::prompts::PromptTemplate;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        completion: Arc<RecordingCompletion>,
        _dir: TempDir,
    }

    fn harness(host: StaticHost) -> Harness {
        let dir = TempDir::new().unwrap();
        let completion = Arc::new(RecordingCompletion { reply: "# Generated".into(), ..Default::default() });
        let generator = ReadmeGenerator::new(
            Arc::new(host),
            completion.clone(),
            PromptTemplate::default(),
            200,
            Duration::from_secs(5),
        );
        let ledger = Arc::new(VisitorLedger::new(dir.path().join("visitors.json")));
        Harness {
            app: create_app(AppState::new(generator, ledger)),
            completion,
            _dir: dir,
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_success() {
        let harness = harness(StaticHost::new(&["Cargo.toml", "src/main.rs"]));
        let (status, body) =
            send(&harness.app, post_json("/generate", r#"{"url": "https://github.com/foo/bar"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["readme"], "# Generated");
    }

    #[tokio::test]
    async fn test_generate_missing_url() {
        let harness = harness(StaticHost::new(&[]));
        for body in ["{}", r#"{"url": "  "}"#, "not json"] {
            let (status, json) = send(&harness.app, post_json("/generate", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], MISSING_URL_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_generate_invalid_url() {
        let harness = harness(StaticHost::new(&[]));
        let (status, json) =
            send(&harness.app, post_json("/api/generate", r#"{"url": "https://example.com/x"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], crate::error::INVALID_REFERENCE_MESSAGE);
        assert_eq!(harness.completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_not_found_skips_completion() {
        let mut host = StaticHost::new(&[]);
        host.missing = true;
        let harness = harness(host);

        let (status, json) =
            send(&harness.app, post_json("/generate", r#"{"url": "github.com/octocat/secret"}"#)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], crate::error::NOT_FOUND_MESSAGE);
        assert_eq!(harness.completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_is_opaque() {
        let dir = TempDir::new().unwrap();
        let completion = Arc::new(RecordingCompletion { fail: true, ..Default::default() });
        let generator = ReadmeGenerator::new(
            Arc::new(StaticHost::new(&["go.mod"])),
            completion,
            PromptTemplate::default(),
            200,
            Duration::from_secs(5),
        );
        let app = create_app(AppState::new(generator, Arc::new(VisitorLedger::new(dir.path().join("v.json")))));

        let (status, json) = send(&app, post_json("/generate", r#"{"url": "foo/bar"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_visitors_record_and_peek() {
        let harness = harness(StaticHost::new(&[]));
        let post = |ip: &str| {
            Request::post("/visitors")
                .header(CLIENT_HEADER, ip)
                .body(Body::empty())
                .unwrap()
        };

        let (_, body) = send(&harness.app, Request::get("/visitors").body(Body::empty()).unwrap()).await;
        assert_eq!(body["count"], 0);

        let (status, body) = send(&harness.app, post("1.2.3.4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let (_, body) = send(&harness.app, post("1.2.3.4")).await;
        assert_eq!(body["count"], 1);

        let (_, body) = send(&harness.app, post("5.6.7.8")).await;
        assert_eq!(body["count"], 2);

        let (_, body) = send(&harness.app, Request::get("/api/visitors").body(Body::empty()).unwrap()).await;
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn test_visitor_without_header_counts_as_unknown() {
        let harness = harness(StaticHost::new(&[]));
        let request = || Request::post("/visitors").body(Body::empty()).unwrap();

        let (_, first) = send(&harness.app, request()).await;
        let (_, second) = send(&harness.app, request()).await;

        assert_eq!(first["count"], 1);
        assert_eq!(second["count"], 1);
    }

    #[tokio::test]
    async fn test_health() {
        let harness = harness(StaticHost::new(&[]));
        let (status, body) = send(&harness.app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
