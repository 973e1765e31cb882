//! Transport configuration.
//!
//! A `TransportConfig` is built once by the caller and never mutated by the
//! transports. It can be written by hand or loaded from TOML:
//!
//! ```toml
//! ca_path = "/etc/ssl/certs"
//! force_http3 = true
//! timeout = "30s"
//! max_body_size = 10485760
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Directory of trusted CA certificates for the HTTP/3 backend.
    pub ca_path: Option<PathBuf>,
    /// Route every request through the HTTP/3 backend.
    pub force_http3: bool,
    /// Whole-transfer deadline handed to whichever backend runs the request.
    #[serde(with = "humantime_serde::option")]
    pub timeout: Option<Duration>,
    /// Largest response body either backend will buffer.
    pub max_body_size: Option<u64>,
}

impl TransportConfig {
    pub fn http3() -> Self {
        Self {
            force_http3: true,
            ..Self::default()
        }
    }

    pub fn with_ca_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_body_size(mut self, bytes: u64) -> Self {
        self.max_body_size = Some(bytes);
        self
    }

    /// The CA path, or `None` when unset or empty.
    pub fn trust_store(&self) -> Option<&Path> {
        self.ca_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
