use axum::{body::Body, http::Request, response::Response, Router};
use tempfile::TempDir;

use web_toolkit::{handlers::build_router, AppConfig, AppState, JsonResponse, ToolsConfig};

pub const BOUNDARY: &str = "integration-boundary";

/// Router plus the scratch directories it serves from; the directories are
/// removed when this is dropped.
pub struct TestApp {
    pub router: Router,
    pub upload_dir: TempDir,
    pub static_dir: TempDir,
}

/// Setup a test application with temporary storage
pub fn setup_test_app(tools: ToolsConfig) -> TestApp {
    let upload_dir = TempDir::new().unwrap();
    let static_dir = TempDir::new().unwrap();

    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        upload_dir: upload_dir.path().to_str().unwrap().to_string(),
        static_dir: static_dir.path().to_str().unwrap().to_string(),
        request_timeout_seconds: 30,
        tools,
    };

    TestApp {
        router: build_router(AppState::new(config)),
        upload_dir,
        static_dir,
    }
}

/// Create a test PNG image (1x1 pixel)
pub fn create_test_image() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, // IHDR chunk length
        0x49, 0x48, 0x44, 0x52, // IHDR
        0x00, 0x00, 0x00, 0x01, // Width: 1
        0x00, 0x00, 0x00, 0x01, // Height: 1
        0x08, 0x02, 0x00, 0x00, 0x00, // Bit depth, color type, etc.
        0x90, 0x77, 0x53, 0xDE, // CRC
        0x00, 0x00, 0x00, 0x0C, // IDAT chunk length
        0x49, 0x44, 0x41, 0x54, // IDAT
        0x08, 0xD7, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, // Compressed data
        0x03, 0x01, 0x01, 0x00,
        0x18, 0xDD, 0x8D, 0xB4, // CRC
        0x00, 0x00, 0x00, 0x00, // IEND chunk length
        0x49, 0x45, 0x4E, 0x44, // IEND
        0xAE, 0x42, 0x60, 0x82, // CRC
    ]
}

/// Create a multipart form body with one "file" part per (filename, content)
pub fn create_multipart_body(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();

    for (filename, content) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    body
}

pub fn upload_request(uri: &str, files: &[(&str, Vec<u8>)]) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(create_multipart_body(files)))
        .unwrap()
}

pub fn json_request(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

/// Decode the standard envelope from a response body
pub async fn read_envelope(response: Response) -> JsonResponse {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
