// Library exports for the toolkit helpers and the demo server

pub mod handlers;
pub mod models;
pub mod services;
pub mod toolkit;
pub mod utils;

use std::sync::Arc;

pub use handlers::download::download_static_file;
pub use handlers::json::{error_json, error_json_with_status, write_json};
pub use models::errors::{ErrorKind, JsonError, ToolkitError, UploadFailure};
pub use models::response::{JsonResponse, UploadedFile};
pub use services::file_storage::create_dir_if_not_exist;
pub use services::push_client::{push_json_to_remote, push_json_to_remote_with_client};
pub use services::random::random_string;
pub use services::slug::slugify;
pub use toolkit::Toolkit;
pub use utils::config::{AppConfig, ToolsConfig, ToolsConfigBuilder};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub toolkit: Arc<Toolkit>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let toolkit = Toolkit::new(config.tools.clone());
        Self {
            config: Arc::new(config),
            toolkit: Arc::new(toolkit),
        }
    }
}
