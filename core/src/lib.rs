//! HTTP transport that routes requests over HTTP/3 through a native engine.
//!
//! # Overview
//! `Transport` implements `RoundTrip` and sends each request either through
//! the HTTP/3 adapter, which drives a native transfer engine such as libcurl,
//! or through a conventional HTTP transport built on ureq. The choice is made
//! once, from `TransportConfig::force_http3`.
//!
//! # Design
//! - The native engine sits behind the `TransferEngine` / `TransferHandle`
//!   traits, so the adapter's option sequencing, header handling and response
//!   assembly are tested against a fake engine.
//! - One engine handle per request, released on drop. No pooling.
//! - Everything is blocking: a round-trip occupies the calling thread until
//!   the backend finishes or fails.
//! - The libcurl engine is behind the `libcurl` feature.

pub mod adapter;
pub mod config;
pub mod conventional;
#[cfg(feature = "libcurl")]
pub mod curl;
pub mod engine;
pub mod error;
pub mod http;
pub mod transport;

pub use adapter::{Http3Adapter, HTTP3_PROTOCOL};
pub use config::TransportConfig;
pub use conventional::UreqTransport;
#[cfg(feature = "libcurl")]
pub use crate::curl::CurlEngine;
pub use engine::{InitGuard, TransferEngine, TransferHandle, TransferIo, TransferOption};
pub use error::{ConfigError, EngineError, OptionKind, TransportError};
pub use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Backend, Http3Transport, RoundTrip, Transport};
