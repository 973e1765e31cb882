//! Protocol-selecting transport.
//!
//! # Design
//! `Transport` picks exactly one backend per request from static
//! configuration: the HTTP/3 adapter when `force_http3` is set, the
//! conventional transport otherwise. The request is handed over untouched and
//! the chosen backend's error is returned as is.
//!
//! Selection never looks at the request. A per-request override would hook in
//! at `Transport::select`.

use crate::adapter::Http3Adapter;
use crate::config::TransportConfig;
use crate::engine::TransferEngine;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one request and returns its response.
///
/// Implementations block the calling thread until the exchange completes.
pub trait RoundTrip: Send + Sync {
    fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: RoundTrip + ?Sized> RoundTrip for Box<T> {
    fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).round_trip(request)
    }
}

impl<T: RoundTrip + ?Sized> RoundTrip for std::sync::Arc<T> {
    fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).round_trip(request)
    }
}

/// The HTTP/3 adapter bound to a configuration, usable on its own.
#[derive(Debug, Clone)]
pub struct Http3Transport<E> {
    adapter: Http3Adapter<E>,
    config: TransportConfig,
}

impl<E: TransferEngine> Http3Transport<E> {
    pub fn new(engine: E, config: TransportConfig) -> Self {
        Self {
            adapter: Http3Adapter::new(engine),
            config,
        }
    }

    pub fn adapter(&self) -> &Http3Adapter<E> {
        &self.adapter
    }
}

impl<E: TransferEngine> RoundTrip for Http3Transport<E> {
    fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.adapter.execute(request, &self.config)
    }
}

/// Which backend a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Http3,
    Conventional,
}

/// Routes each request to the HTTP/3 adapter or a conventional transport.
#[derive(Debug)]
pub struct Transport<E, C> {
    http3: Http3Transport<E>,
    conventional: C,
}

impl<E: TransferEngine, C: RoundTrip> Transport<E, C> {
    pub fn new(config: TransportConfig, engine: E, conventional: C) -> Self {
        Self {
            http3: Http3Transport::new(engine, config),
            conventional,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.http3.config
    }

    pub fn engine(&self) -> &E {
        self.http3.adapter.engine()
    }

    pub fn conventional(&self) -> &C {
        &self.conventional
    }

    pub fn select(&self, _request: &HttpRequest) -> Backend {
        if self.http3.config.force_http3 {
            Backend::Http3
        } else {
            Backend::Conventional
        }
    }
}

impl<E: TransferEngine, C: RoundTrip> RoundTrip for Transport<E, C> {
    fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let backend = self.select(&request);
        tracing::debug!(?backend, method = %request.method, url = %request.url, "routing request");
        match backend {
            Backend::Http3 => self.http3.round_trip(request),
            Backend::Conventional => self.conventional.round_trip(request),
        }
    }
}

#[cfg(feature = "libcurl")]
impl Transport<crate::curl::CurlEngine, crate::conventional::UreqTransport> {
    /// libcurl for HTTP/3, ureq for everything else.
    pub fn with_libcurl(config: TransportConfig) -> Self {
        let conventional = crate::conventional::UreqTransport::new(&config);
        Self::new(config, crate::curl::CurlEngine, conventional)
    }
}
