use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use eyre::{Result, WrapErr, bail};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::error::Error;
use crate::summary::truncate_words;
use crate::transcript::TranscriptService;

/// Mount point of the plugin-discovery directory
pub const WELL_KNOWN_ROUTE: &str = "/.well-known";
pub const PLUGIN_MANIFEST: &str = "ai-plugin.json";

const ERROR_PREFIX: &str = "Ошибка при получении транскрипта";

const TERMS: &str = "Плагин YouTube Summary предоставляется «как есть». \
Транскрипты загружаются с YouTube и принадлежат их авторам; сервис не хранит ни ссылки, ни тексты.";

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub youtube_url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: TranscriptService,
    pub languages: Arc<Vec<String>>,
    pub summary_words: usize,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(service: TranscriptService, config: &Config) -> Self {
        Self {
            service,
            languages: Arc::new(config.languages.clone()),
            summary_words: config.summary_words,
            static_dir: Arc::new(config.static_dir.clone()),
        }
    }

    /// Transcript for `url`, cut down to the configured word count
    pub async fn summarize(&self, url: &str) -> Result<String, Error> {
        let full_text = self.service.get_transcript(url, &self.languages).await?;
        Ok(truncate_words(&full_text, self.summary_words))
    }
}

/// Fail unless the plugin-manifest directory and its manifest exist
pub fn check_plugin_manifest(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("plugin manifest directory {} does not exist", dir.display());
    }
    let manifest = dir.join(PLUGIN_MANIFEST);
    if !manifest.is_file() {
        bail!("plugin manifest {} not found", manifest.display());
    }
    info!("Serving plugin manifest from {}", manifest.display());
    Ok(())
}

/// Build the application router. Run [`check_plugin_manifest`] first.
pub fn router(state: AppState, well_known_dir: &Path) -> Router {
    Router::new()
        .route("/summary", post(summary_handler))
        .route("/logo.png", get(logo_handler))
        .route("/terms", get(terms_handler))
        .route("/openapi.json", get(openapi_handler))
        .nest_service(WELL_KNOWN_ROUTE, ServeDir::new(well_known_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Bind to the configured address and serve until Ctrl+C
pub async fn serve(config: &Config, service: TranscriptService) -> Result<()> {
    check_plugin_manifest(&config.well_known_dir)?;

    let app = router(AppState::new(service, config), &config.well_known_dir);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("binding to {addr}"))?;
    info!("API server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("running API server")?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {e}");
    }
}

/// Failures are reported as 200 with the error text in `summary`
async fn summary_handler(State(state): State<AppState>, Json(request): Json<SummaryRequest>) -> Json<SummaryResponse> {
    let summary = match state.summarize(&request.youtube_url).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Summary for {} failed: {e}", request.youtube_url);
            format!("{ERROR_PREFIX}: {e}")
        }
    };
    Json(SummaryResponse { summary })
}

async fn logo_handler(State(state): State<AppState>) -> Response {
    let path = state.static_dir.join("logo.png");
    match tokio::fs::read(&path).await {
        Ok(content) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], content).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, "text/plain")], "Logo not found").into_response(),
    }
}

async fn terms_handler() -> &'static str {
    TERMS
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_document())
}

fn openapi_document() -> serde_json::Value {
    serde_json::json!({
        "openapi": "3.0.2",
        "info": {
            "title": "YouTube Summary Plugin",
            "description": "Плагин для получения краткого содержания YouTube-видео",
            "version": "0.0.1"
        },
        "paths": {
            "/summary": {
                "post": {
                    "summary": "Get Summary",
                    "description": "Возвращает краткое содержание ролика по ссылке на YouTube.",
                    "operationId": "get_summary_summary_post",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/SummaryRequest" }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "Successful Response",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/SummaryResponse" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "SummaryRequest": {
                    "title": "SummaryRequest",
                    "type": "object",
                    "required": ["youtube_url"],
                    "properties": {
                        "youtube_url": { "title": "Youtube Url", "type": "string" }
                    }
                },
                "SummaryResponse": {
                    "title": "SummaryResponse",
                    "type": "object",
                    "required": ["summary"],
                    "properties": {
                        "summary": { "title": "Summary", "type": "string" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::transcript::tests::{NotFoundProvider, StubProvider};
    use crate::transcript::TranscriptProvider;

    struct Fixture {
        _dir: TempDir,
        app: Router,
    }

    fn fixture(provider: Arc<dyn TranscriptProvider>, with_logo: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let well_known = dir.path().join(".well-known");
        let static_dir = dir.path().join("static");
        std::fs::create_dir_all(&well_known).unwrap();
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(well_known.join(PLUGIN_MANIFEST), r#"{"schema_version":"v1"}"#).unwrap();
        if with_logo {
            std::fs::write(static_dir.join("logo.png"), b"\x89PNG").unwrap();
        }

        let config = Config {
            static_dir,
            well_known_dir: well_known.clone(),
            ..Config::default()
        };
        check_plugin_manifest(&config.well_known_dir).unwrap();
        let app = router(AppState::new(TranscriptService::new(provider), &config), &well_known);
        Fixture { _dir: dir, app }
    }

    async fn post_summary(app: Router, url: &str) -> (StatusCode, SummaryResponse) {
        let body = serde_json::json!({ "youtube_url": url }).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/summary")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_path(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_summary_success() {
        let f = fixture(Arc::new(StubProvider::new(&["a", "b", "c"])), false);
        let (status, body) = post_summary(f.app, "https://www.youtube.com/watch?v=cv1F_c66utw").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.summary, "a b c");
    }

    #[tokio::test]
    async fn test_summary_malformed_url() {
        let f = fixture(Arc::new(StubProvider::new(&["a"])), false);
        let (status, body) = post_summary(f.app, "https://example.com/nope").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body.summary,
            "Ошибка при получении транскрипта: Не удалось найти ID в ссылке: https://example.com/nope"
        );
    }

    #[tokio::test]
    async fn test_summary_provider_failure() {
        let f = fixture(Arc::new(NotFoundProvider), false);
        let (status, body) = post_summary(f.app, "https://youtu.be/cv1F_c66utw").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.summary.starts_with("Ошибка при получении транскрипта: "));
        assert!(body.summary.contains("Video unavailable"));
    }

    #[tokio::test]
    async fn test_summary_truncated() {
        let words: Vec<&'static str> = std::iter::repeat("word").take(120).collect();
        let f = fixture(Arc::new(StubProvider::new(&words)), false);
        let (_, body) = post_summary(f.app, "https://youtu.be/cv1F_c66utw").await;
        assert!(body.summary.ends_with("word..."));
        assert_eq!(body.summary.trim_end_matches("...").split(' ').count(), 100);
    }

    #[tokio::test]
    async fn test_logo_present() {
        let f = fixture(Arc::new(NotFoundProvider), true);
        let (status, content_type, body) = get_path(f.app, "/logo.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/png"));
        assert_eq!(body, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_logo_missing() {
        let f = fixture(Arc::new(NotFoundProvider), false);
        let (status, content_type, body) = get_path(f.app, "/logo.png").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type.as_deref(), Some("text/plain"));
        assert_eq!(body, b"Logo not found");
    }

    #[tokio::test]
    async fn test_terms() {
        let f = fixture(Arc::new(NotFoundProvider), false);
        let (status, content_type, body) = get_path(f.app, "/terms").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/plain"));
        assert_eq!(String::from_utf8(body).unwrap(), TERMS);
    }

    #[tokio::test]
    async fn test_plugin_manifest_served() {
        let f = fixture(Arc::new(NotFoundProvider), false);
        let (status, _, body) = get_path(f.app, "/.well-known/ai-plugin.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"schema_version":"v1"}"#);
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let f = fixture(Arc::new(NotFoundProvider), false);
        let (status, _, body) = get_path(f.app, "/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["info"]["title"], "YouTube Summary Plugin");
        assert!(doc["paths"]["/summary"]["post"].is_object());
    }

    #[test]
    fn test_check_plugin_manifest_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_plugin_manifest(&dir.path().join(".well-known")).is_err());
    }

    #[test]
    fn test_check_plugin_manifest_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_plugin_manifest(dir.path()).is_err());
    }
}
