use crate::utils::config::ToolsConfig;

/// Entry point for the configuration dependent helpers: multipart uploads
/// and JSON request decoding. The configuration is resolved when the
/// toolkit is built and never changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct Toolkit {
    config: ToolsConfig,
}

impl Toolkit {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolsConfig {
        &self.config
    }
}

impl From<ToolsConfig> for Toolkit {
    fn from(config: ToolsConfig) -> Self {
        Self::new(config)
    }
}
