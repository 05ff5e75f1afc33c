use std::path::Path;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Serves `dir/file` as an attachment that browsers save as `display_name`.
///
/// Length, type and range handling come from [`ServeFile`]; a missing file
/// yields the usual `404 Not Found`.
pub async fn download_static_file(
    request: Request,
    dir: impl AsRef<Path>,
    file: &str,
    display_name: &str,
) -> Response {
    let path = dir.as_ref().join(file);

    let disposition =
        match HeaderValue::from_str(&format!("attachment; filename=\"{}\"", display_name)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Invalid download name {:?}: {}", display_name, e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    if response.status().is_success() {
        tracing::debug!("Serving {} as {:?}", path.display(), display_name);
    } else {
        tracing::debug!("Could not serve {}: {}", path.display(), response.status());
    }

    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);

    response
}
