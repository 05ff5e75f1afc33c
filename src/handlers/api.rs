use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::path::Component;
use serde_json::json;

use crate::handlers::download::download_static_file;
use crate::handlers::json::{error_json, write_json};
use crate::models::errors::ToolkitError;
use crate::models::response::JsonResponse;
use crate::services::{push_client::push_json_to_remote, random::random_string, slug};
use crate::AppState;

/// Longest string the random endpoint hands out
pub const MAX_RANDOM_LENGTH: usize = 4096;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    #[serde(default = "default_rename")]
    pub rename: bool,
}

fn default_rename() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SlugRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SlugResponse {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct RandomParams {
    #[serde(default = "default_random_length")]
    pub length: usize,
}

fn default_random_length() -> usize {
    32
}

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub uri: String,
    pub payload: serde_json::Value,
}

fn respond<T: Serialize>(status: StatusCode, payload: &T) -> Response {
    write_json(status, payload, None).unwrap_or_else(IntoResponse::into_response)
}

/// Store the uploaded files in the configured upload directory
pub async fn upload(
    State(app_state): State<AppState>,
    Query(params): Query<UploadParams>,
    request: Request,
) -> Response {
    match app_state
        .toolkit
        .upload_files(request, &app_state.config.upload_dir, params.rename)
        .await
    {
        Ok(files) => {
            let message = format!("{} file(s) uploaded", files.len());
            respond(StatusCode::OK, &JsonResponse::success(message, files))
        }
        Err(failure) => failure.into_response(),
    }
}

/// Send a file from the static directory as an attachment
pub async fn download(
    State(app_state): State<AppState>,
    Path(file): Path<String>,
    request: Request,
) -> Response {
    if !is_plain_file_name(&file) {
        tracing::warn!("Refusing download outside the static directory: {:?}", file);
        return StatusCode::NOT_FOUND.into_response();
    }

    download_static_file(request, &app_state.config.static_dir, &file, &file).await
}

/// True when `name` is a single normal path component
fn is_plain_file_name(name: &str) -> bool {
    let mut components = std::path::Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

pub async fn slugify(
    State(app_state): State<AppState>,
    request: Request,
) -> Result<Response, ToolkitError> {
    let input: SlugRequest = app_state.toolkit.read_json(request).await?;
    let slug = slug::slugify(&input.text)?;

    Ok(respond(
        StatusCode::OK,
        &JsonResponse::success("slug created", SlugResponse { slug }),
    ))
}

pub async fn random(Query(params): Query<RandomParams>) -> Response {
    if params.length > MAX_RANDOM_LENGTH {
        let message = format!("length must not exceed {}", MAX_RANDOM_LENGTH);
        return error_json(&message).unwrap_or_else(IntoResponse::into_response);
    }

    respond(
        StatusCode::OK,
        &JsonResponse::success("random string generated", json!({ "value": random_string(params.length) })),
    )
}

/// Forward a JSON payload to another service and report its status.
///
/// Demo only: the target URI comes straight from the request body, so this
/// route must not be exposed where it could reach internal networks.
pub async fn push(
    State(app_state): State<AppState>,
    request: Request,
) -> Result<Response, ToolkitError> {
    let input: PushRequest = app_state.toolkit.read_json(request).await?;
    let (_response, status) = push_json_to_remote(&input.uri, &input.payload).await?;

    Ok(respond(
        StatusCode::OK,
        &JsonResponse::success(
            format!("remote answered {}", status),
            json!({ "status": status.as_u16() }),
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_plain_file_name() {
        assert!(is_plain_file_name("pic.png"));
        assert!(!is_plain_file_name("../secret.txt"));
        assert!(!is_plain_file_name("nested/pic.png"));
        assert!(!is_plain_file_name("/etc/passwd"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }
}
