use std::env;

/// Default upload limit: 1 GiB
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 1024 * 1024 * 1024;

/// Default JSON body limit: 1 MiB
pub const DEFAULT_MAX_JSON_SIZE: usize = 1024 * 1024;

/// Settings shared by the toolkit helpers. Always fully resolved; build one
/// through [`ToolsConfig::builder`] or take the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsConfig {
    pub max_upload_size: u64,
    /// Sniffed MIME types accepted by the upload handler. Empty allows everything.
    pub allowed_file_types: Vec<String>,
    pub max_json_size: usize,
    pub allow_unknown_fields: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        ToolsConfigBuilder::default().build()
    }
}

impl ToolsConfig {
    pub fn builder() -> ToolsConfigBuilder {
        ToolsConfigBuilder::default()
    }

    /// Case-insensitive allow-list check against a sniffed content type
    pub fn is_type_allowed(&self, content_type: &str) -> bool {
        self.allowed_file_types.is_empty()
            || self
                .allowed_file_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolsConfigBuilder {
    max_upload_size: Option<u64>,
    allowed_file_types: Vec<String>,
    max_json_size: Option<usize>,
    allow_unknown_fields: bool,
}

impl ToolsConfigBuilder {
    /// Zero resolves to [`DEFAULT_MAX_UPLOAD_SIZE`]
    pub fn max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = Some(bytes);
        self
    }

    pub fn allowed_file_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_file_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Zero resolves to [`DEFAULT_MAX_JSON_SIZE`]
    pub fn max_json_size(mut self, bytes: usize) -> Self {
        self.max_json_size = Some(bytes);
        self
    }

    pub fn allow_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = allow;
        self
    }

    pub fn build(self) -> ToolsConfig {
        ToolsConfig {
            max_upload_size: self
                .max_upload_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
            allowed_file_types: self.allowed_file_types,
            max_json_size: self
                .max_json_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_MAX_JSON_SIZE),
            allow_unknown_fields: self.allow_unknown_fields,
        }
    }
}

/// Settings for the demo server binary
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub static_dir: String,
    pub request_timeout_seconds: u64,
    pub tools: ToolsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            upload_dir: "./uploads".to_string(),
            static_dir: "./static".to_string(),
            request_timeout_seconds: 30,
            tools: ToolsConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                config.port = port_num;
            }
        }

        if let Ok(upload_dir) = env::var("UPLOAD_DIR") {
            config.upload_dir = upload_dir;
        }

        if let Ok(static_dir) = env::var("STATIC_DIR") {
            config.static_dir = static_dir;
        }

        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECONDS") {
            if let Ok(timeout_num) = timeout.parse::<u64>() {
                config.request_timeout_seconds = timeout_num;
            }
        }

        let mut tools = ToolsConfig::builder();

        if let Ok(max_size) = env::var("MAX_UPLOAD_SIZE") {
            if let Ok(size) = max_size.parse::<u64>() {
                tools = tools.max_upload_size(size);
            }
        }

        if let Ok(types) = env::var("ALLOWED_FILE_TYPES") {
            tools = tools.allowed_file_types(parse_mime_list(&types));
        }

        if let Ok(max_size) = env::var("MAX_JSON_SIZE") {
            if let Ok(size) = max_size.parse::<usize>() {
                tools = tools.max_json_size(size);
            }
        }

        if let Ok(allow) = env::var("ALLOW_UNKNOWN_FIELDS") {
            tools = tools.allow_unknown_fields(parse_flag(&allow));
        }

        config.tools = tools.build();
        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Splits a comma separated list, keeping only entries that parse as MIME types
fn parse_mime_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<mime::Mime>() {
            Ok(parsed) => Some(parsed.to_string()),
            Err(e) => {
                tracing::warn!("Ignoring invalid allowed file type {:?}: {}", entry, e);
                None
            }
        })
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
