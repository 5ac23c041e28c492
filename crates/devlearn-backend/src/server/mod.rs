//! HTTP server for the document backend

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Document HTTP Server
pub struct DocServer {
    config: AppConfig,
    state: AppState,
}

impl DocServer {
    /// Create a new server, opening the database and upload directory
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Create from prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the server and run until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting document server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Router over the given state
pub fn build_router(state: AppState) -> Router {
    let config = state.config().server.clone();

    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes::api_routes(config.max_upload_size))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        // The web frontend is served from another origin
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::ingestion::pdf::fixtures::pdf_with_pages;
    use crate::ingestion::pptx::fixtures::{pptx_with_slides, text_shape};
    use crate::service::DocumentService;
    use crate::storage::{SqliteDocumentRepository, UploadStore};

    const BOUNDARY: &str = "devlearn-test-boundary";

    fn test_app(dir: &std::path::Path) -> Router {
        test_app_with(dir, AppConfig::default())
    }

    fn test_app_with(dir: &std::path::Path, config: AppConfig) -> Router {
        let service = DocumentService::new(
            UploadStore::new(dir.join("uploads")),
            Arc::new(SqliteDocumentRepository::in_memory().unwrap()),
        );
        DocServer::with_state(AppState::from_parts(config, service)).router()
    }

    fn upload_request(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/documents/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(get_request("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let data = pdf_with_pages(&["Memory safety without GC"]);

        let (status, body) = send(&app, upload_request("file", "Lecture.PDF", &data)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "File uploaded successfully");
        assert_eq!(body["filename"], "Lecture.PDF");
        assert_eq!(body["fileType"], "PDF");
        assert_eq!(body["fileSize"], data.len() as u64);
        assert!(body["documentId"].as_i64().unwrap() > 0);
        assert!(body["textPreview"].as_str().unwrap().contains("Memory"));
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let (status, body) = send(&app, upload_request("file", "empty.pdf", b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "File is empty");

        let (status, body) = send(&app, upload_request("file", "notes.txt", b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Only PDF and PPTX files are supported");

        let (status, body) = send(&app, upload_request("file", "README", b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Only PDF and PPTX files are supported");

        let (status, body) = send(&app, upload_request("document", "a.pdf", b"%PDF")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, upload_request("file", "broken.pdf", b"%PDF-garbage")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("broken.pdf"));

        let (_, list) = send(&app, get_request("/api/documents")).await;
        assert_eq!(list.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_text_preview_is_truncated_to_200_chars() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let long_line = "ß".repeat(300);
        let data = pptx_with_slides(&[text_shape(&[&long_line])]);

        let (status, body) = send(&app, upload_request("file", "long.pptx", &data)).await;
        assert_eq!(status, StatusCode::OK);
        let preview = body["textPreview"].as_str().unwrap();
        assert_eq!(preview.chars().count(), 200);
        assert_eq!(preview, "ß".repeat(200));

        let id = body["documentId"].as_i64().unwrap();
        let (_, doc) = send(&app, get_request(&format!("/api/documents/{}", id))).await;
        assert_eq!(doc["extractedText"].as_str().unwrap().chars().count(), 301);
    }

    #[tokio::test]
    async fn test_round_trip_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let data = pptx_with_slides(&[text_shape(&["Cargo", "Crates"]), text_shape(&["Modules"])]);

        let (_, upload) = send(&app, upload_request("file", "week1.pptx", &data)).await;
        let id = upload["documentId"].as_i64().unwrap();

        let (status, doc) = send(&app, get_request(&format!("/api/documents/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["id"], id);
        assert_eq!(doc["originalFilename"], "week1.pptx");
        assert_eq!(doc["fileType"], "PPTX");
        assert_eq!(doc["fileSize"], data.len() as u64);
        assert_eq!(doc["extractedText"], "Cargo\nCrates\nModules\n");
        assert_eq!(doc["processingStatus"], "PENDING");
        assert!(doc["storedFilename"].as_str().unwrap().ends_with(".pptx"));
    }

    #[tokio::test]
    async fn test_missing_document_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let (status, body) = send(&app, get_request("/api/documents/12345")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Document not found with id: 12345");
    }

    #[tokio::test]
    async fn test_concurrent_uploads_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let data = pptx_with_slides(&[text_shape(&["Twin"])]);

        let (first, second) = tokio::join!(
            send(&app, upload_request("file", "twin.pptx", &data)),
            send(&app, upload_request("file", "twin.pptx", &data)),
        );
        assert_eq!(first.0, StatusCode::OK);
        assert_eq!(second.0, StatusCode::OK);
        assert_ne!(first.1["documentId"], second.1["documentId"]);

        let (_, list) = send(&app, get_request("/api/documents")).await;
        let docs = list.as_array().unwrap();
        assert_eq!(docs.len(), 2);
        assert_ne!(docs[0]["storedFilename"], docs[1]["storedFilename"]);
    }

    #[tokio::test]
    async fn test_status_update_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let (_, deck) = send(
            &app,
            upload_request("file", "deck.pptx", &pptx_with_slides(&[text_shape(&["a"])])),
        )
        .await;
        send(&app, upload_request("file", "paper.pdf", &pdf_with_pages(&["b"]))).await;
        let id = deck["documentId"].as_i64().unwrap();

        let patch = Request::builder()
            .method(Method::PATCH)
            .uri(format!("/api/documents/{}/status", id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"completed"}"#))
            .unwrap();
        let (status, doc) = send(&app, patch).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["processingStatus"], "COMPLETED");

        let (_, completed) = send(&app, get_request("/api/documents?status=COMPLETED")).await;
        assert_eq!(completed.as_array().unwrap().len(), 1);
        assert_eq!(completed[0]["id"], id);

        let (_, pdfs) = send(&app, get_request("/api/documents?fileType=pdf")).await;
        assert_eq!(pdfs.as_array().unwrap().len(), 1);
        assert_eq!(pdfs[0]["originalFilename"], "paper.pdf");

        let (status, _) = send(&app, get_request("/api/documents?status=ARCHIVED")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let bad = Request::builder()
            .method(Method::PATCH)
            .uri(format!("/api/documents/{}/status", id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"DONE"}"#))
            .unwrap();
        let (status, body) = send(&app, bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown processing status: DONE");

        let missing = Request::builder()
            .method(Method::PATCH)
            .uri("/api/documents/999/status")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"status":"FAILED"}"#))
            .unwrap();
        let (status, _) = send(&app, missing).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.server.max_upload_size = 1024;
        let app = test_app_with(dir.path(), config);

        let (status, body) = send(&app, upload_request("file", "big.pdf", &vec![b'x'; 8 * 1024])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("upload size limit"));

        let (_, list) = send(&app, get_request("/api/documents")).await;
        assert_eq!(list.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_malformed_requests_get_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let (status, body) = send(&app, get_request("/api/documents/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());

        let broken_json = Request::builder()
            .method(Method::PATCH)
            .uri("/api/documents/1/status")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"status\":"))
            .unwrap();
        let (status, body) = send(&app, broken_json).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, get_request("/api/info")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
