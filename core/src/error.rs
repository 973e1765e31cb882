//! Error types for the transports.
//!
//! # Design
//! No failure is recovered locally. Every variant of `TransportError` maps to
//! one step of a round-trip, so callers can tell a broken engine setup from a
//! network failure without parsing messages. A response is never returned
//! alongside an error.

use std::fmt;

use thiserror::Error;

/// Diagnostic reported by the native transfer engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Identifies a transfer option in `TransportError::OptionError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    CaPath,
    VerifyPeer,
    HttpVersion,
    Url,
    HttpGet,
    Post,
    Upload,
    NoBody,
    CustomRequest,
    HttpHeaders,
    Timeout,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::CaPath => "CAPATH",
            OptionKind::VerifyPeer => "SSL_VERIFYPEER",
            OptionKind::HttpVersion => "HTTP_VERSION",
            OptionKind::Url => "URL",
            OptionKind::HttpGet => "HTTPGET",
            OptionKind::Post => "POST",
            OptionKind::Upload => "UPLOAD",
            OptionKind::NoBody => "NOBODY",
            OptionKind::CustomRequest => "CUSTOMREQUEST",
            OptionKind::HttpHeaders => "HTTPHEADER",
            OptionKind::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by `RoundTrip` implementations.
#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum TransportError {
    /// One-time global setup of the native engine failed.
    #[error("transfer engine initialization failed: {0}")]
    InitializationError(EngineError),

    /// The engine could not allocate a per-call transfer handle.
    #[error("could not create transfer handle: {0}")]
    HandleCreationError(EngineError),

    /// A configuration step rejected its value.
    #[error("failed to set option {option}: {source}")]
    OptionError {
        option: OptionKind,
        source: EngineError,
    },

    /// The received body could not be buffered.
    #[error("failed to buffer response body: {0}")]
    BodyWriteError(String),

    /// The network operation itself failed.
    #[error("transfer failed: {0}")]
    TransferError(EngineError),

    /// The conventional transport failed.
    #[error("conventional transport failed: {0}")]
    ConventionalError(#[from] ureq::Error),
}

/// Errors raised while loading a `TransportConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
