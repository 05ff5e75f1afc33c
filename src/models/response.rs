use serde::{Deserialize, Serialize};

/// Envelope used for every JSON response: `{"error", "message", "data"?}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonResponse<T = serde_json::Value> {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            error: false,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            data: None,
        }
    }
}

/// A file stored by the upload handler
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name of the file on disk, random unless renaming was turned off
    pub new_file_name: String,
    pub original_file_name: String,
    pub file_size: u64,
}
