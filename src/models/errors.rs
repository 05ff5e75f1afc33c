use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::response::{JsonResponse, UploadedFile};

/// Broad classes of failure the toolkit reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    ResourceLimit,
    PolicyRejection,
    Transport,
}

#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("empty string not permitted")]
    EmptyInput,

    #[error("after removing unsafe characters, slug is zero length")]
    EmptySlug,

    #[error("the uploaded file is too big (limit is {limit} bytes)")]
    PayloadTooLarge { limit: u64 },

    #[error("the uploaded file type is not permitted: {detected}")]
    DisallowedFileType { detected: String },

    #[error("the uploaded file {filename:?} is empty")]
    EmptyFile { filename: String },

    #[error("no file was found in the upload")]
    NoFileUploaded,

    #[error("invalid multipart request: {message}")]
    InvalidMultipart { message: String },

    #[error(transparent)]
    Json(#[from] JsonError),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Reasons a JSON request body was rejected, each rendered as a message
/// suitable for sending back to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonError {
    #[error("body contains badly-formed JSON (at character {offset})")]
    Syntax { offset: usize },

    #[error("body contains badly-formed JSON")]
    Truncated,

    #[error("body contains incorrect JSON type for field {field:?}")]
    WrongType { field: String },

    #[error("body contains incorrect JSON type (at character {offset})")]
    WrongTypeAt { offset: usize },

    #[error("body must not be empty")]
    Empty,

    #[error("body contains unknown key {field:?}")]
    UnknownField { field: String },

    #[error("body must not be larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("body must contain only one JSON value")]
    MultipleValues,

    #[error("error unmarshaling JSON: {message}")]
    Invalid { message: String },

    #[error("failed to read request body: {message}")]
    Body { message: String },
}

impl JsonError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JsonError::TooLarge { .. } => ErrorKind::ResourceLimit,
            JsonError::UnknownField { .. } | JsonError::MultipleValues => {
                ErrorKind::PolicyRejection
            }
            JsonError::Body { .. } => ErrorKind::Transport,
            _ => ErrorKind::InputValidation,
        }
    }
}

impl ToolkitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolkitError::EmptyInput
            | ToolkitError::EmptySlug
            | ToolkitError::EmptyFile { .. }
            | ToolkitError::NoFileUploaded
            | ToolkitError::InvalidMultipart { .. } => ErrorKind::InputValidation,
            ToolkitError::PayloadTooLarge { .. } => ErrorKind::ResourceLimit,
            ToolkitError::DisallowedFileType { .. } => ErrorKind::PolicyRejection,
            ToolkitError::Json(e) => e.kind(),
            ToolkitError::Serialization(_) | ToolkitError::Io(_) | ToolkitError::Http(_) => {
                ErrorKind::Transport
            }
        }
    }

    /// HTTP status used when the error is rendered as a response
    pub fn status_code(&self) -> StatusCode {
        match self {
            ToolkitError::PayloadTooLarge { .. }
            | ToolkitError::Json(JsonError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ToolkitError::DisallowedFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ToolkitError::Http(_) => StatusCode::BAD_GATEWAY,
            ToolkitError::Serialization(_) | ToolkitError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ToolkitError::Json(JsonError::Body { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn payload_too_large(limit: u64) -> Self {
        ToolkitError::PayloadTooLarge { limit }
    }

    pub fn disallowed_file_type(detected: impl Into<String>) -> Self {
        ToolkitError::DisallowedFileType {
            detected: detected.into(),
        }
    }

    pub fn empty_file(filename: impl Into<String>) -> Self {
        ToolkitError::EmptyFile {
            filename: filename.into(),
        }
    }

    pub fn invalid_multipart(message: impl Into<String>) -> Self {
        ToolkitError::InvalidMultipart {
            message: message.into(),
        }
    }
}

impl IntoResponse for ToolkitError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let envelope: JsonResponse = JsonResponse::failure(self.to_string());
        crate::handlers::json::write_json(status, &envelope, None)
            .unwrap_or_else(|_| status.into_response())
    }
}

/// Error of a multi-file upload: the files stored before the failure are
/// kept on disk and handed back alongside the cause.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct UploadFailure {
    pub uploaded: Vec<UploadedFile>,
    #[source]
    pub error: ToolkitError,
}

impl UploadFailure {
    pub fn new(uploaded: Vec<UploadedFile>, error: impl Into<ToolkitError>) -> Self {
        Self {
            uploaded,
            error: error.into(),
        }
    }
}

impl IntoResponse for UploadFailure {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let envelope = JsonResponse {
            error: true,
            message: self.error.to_string(),
            data: (!self.uploaded.is_empty()).then_some(self.uploaded),
        };
        crate::handlers::json::write_json(status, &envelope, None)
            .unwrap_or_else(|_| status.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ToolkitError::EmptyInput.kind(), ErrorKind::InputValidation);
        assert_eq!(
            ToolkitError::payload_too_large(10).kind(),
            ErrorKind::ResourceLimit
        );
        assert_eq!(
            ToolkitError::disallowed_file_type("image/png").kind(),
            ErrorKind::PolicyRejection
        );
        assert_eq!(
            ToolkitError::from(JsonError::MultipleValues).kind(),
            ErrorKind::PolicyRejection
        );
        assert_eq!(
            ToolkitError::from(JsonError::TooLarge { limit: 5 }).kind(),
            ErrorKind::ResourceLimit
        );
        assert_eq!(
            ToolkitError::from(std::io::Error::other("disk gone")).kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ToolkitError::EmptySlug.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ToolkitError::payload_too_large(1).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ToolkitError::from(JsonError::TooLarge { limit: 1 }).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ToolkitError::disallowed_file_type("text/plain").status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn test_json_error_messages() {
        assert_eq!(
            JsonError::Syntax { offset: 8 }.to_string(),
            "body contains badly-formed JSON (at character 8)"
        );
        assert_eq!(
            JsonError::WrongType {
                field: "foo".to_string()
            }
            .to_string(),
            "body contains incorrect JSON type for field \"foo\""
        );
        assert_eq!(
            JsonError::UnknownField {
                field: "alpha".to_string()
            }
            .to_string(),
            "body contains unknown key \"alpha\""
        );
        assert_eq!(
            JsonError::TooLarge { limit: 5 }.to_string(),
            "body must not be larger than 5 bytes"
        );
    }

    #[test]
    fn test_upload_failure_displays_cause() {
        let failure = UploadFailure::new(Vec::new(), ToolkitError::NoFileUploaded);
        assert_eq!(failure.to_string(), "no file was found in the upload");
    }
}
