use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Connection settings for the personal library server plus the location of
/// the local progress cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the library server, e.g. "https://media.example.org".
    pub server_url: String,

    /// API token sent with every request. Without one the server answers 401
    /// and the core reports the login entry point instead of data.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Where the sqlite progress cache lives. Defaults to the platform data
    /// directory when absent.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

impl Config {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_token: None,
            cache_path: None,
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }
}

pub fn default_cache_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mozi")
        .join("progress.db")
}
