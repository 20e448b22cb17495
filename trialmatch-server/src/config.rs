//! Server configuration

use std::path::PathBuf;

use trialmatch_core::DEFAULT_TRIAL_FILES;

pub const DEFAULT_PORT: u16 = 8420;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Directory the trial files are resolved against
    pub data_dir: PathBuf,
    /// Trial files loaded at startup, relative to `data_dir`
    pub trial_files: Vec<String>,
}

impl ServerConfig {
    /// Create a new configuration builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfigBuilder::default().build()
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    port: Option<u16>,
    cors_enabled: Option<bool>,
    data_dir: Option<PathBuf>,
    trial_files: Option<Vec<String>>,
}

impl ServerConfigBuilder {
    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors_enabled = Some(enabled);
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn trial_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trial_files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            port: self.port.unwrap_or(DEFAULT_PORT),
            cors_enabled: self.cors_enabled.unwrap_or(true),
            data_dir: self.data_dir.unwrap_or_else(|| PathBuf::from("data")),
            trial_files: self
                .trial_files
                .unwrap_or_else(|| DEFAULT_TRIAL_FILES.iter().map(|f| f.to_string()).collect()),
        }
    }
}
