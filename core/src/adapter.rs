//! Backend transport adapter for the native HTTP/3 engine.
//!
//! # Design
//! `Http3Adapter::execute` runs exactly one request on a fresh engine handle:
//! initialize the engine once per process, create a handle, apply the option
//! sequence from `transfer_options`, perform with a `ResponseCollector` as the
//! callback target, then read the status code and assemble the response from
//! what the collector captured. The handle is dropped on every return path.
//!
//! Nothing is pooled or cached between calls. Every request pays the full
//! handle setup and teardown.

use std::io::{self, Read};

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::TransportConfig;
use crate::engine::{TransferEngine, TransferHandle, TransferIo, TransferOption};
use crate::error::TransportError;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};

/// Protocol label of every response produced by the adapter.
pub const HTTP3_PROTOCOL: &str = "HTTP/3";

/// Executes requests through a native engine forced to HTTP/3.
#[derive(Debug, Clone)]
pub struct Http3Adapter<E> {
    engine: E,
}

impl<E: TransferEngine> Http3Adapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn execute(
        &self,
        request: HttpRequest,
        config: &TransportConfig,
    ) -> Result<HttpResponse, TransportError> {
        self.engine
            .initialize()
            .map_err(TransportError::InitializationError)?;

        let mut handle = self
            .engine
            .create_handle()
            .map_err(TransportError::HandleCreationError)?;

        for option in transfer_options(&request, config) {
            handle
                .set_option(&option)
                .map_err(|source| TransportError::OptionError {
                    option: option.kind(),
                    source,
                })?;
        }

        let collector = ResponseCollector::new(request.body, config.max_body_size);
        run_transfer(&mut handle, collector, &request.url)
    }
}

/// Perform a configured transfer and assemble the response.
pub fn run_transfer<H: TransferHandle>(
    handle: &mut H,
    mut collector: ResponseCollector,
    url: &str,
) -> Result<HttpResponse, TransportError> {
    let outcome = handle.perform(&mut collector);

    // A failed body sink makes the engine abort with its own write error.
    if let Some(err) = collector.write_error.take() {
        return Err(TransportError::BodyWriteError(err));
    }
    if let Err(err) = outcome {
        tracing::debug!(url, error = %err, "http/3 transfer failed");
        return Err(TransportError::TransferError(err));
    }

    let status = handle
        .response_code()
        .map_err(TransportError::TransferError)?;
    Ok(collector.into_response(status))
}

/// The ordered option sequence for one request.
///
/// Trust store (only when set), peer verification, HTTP/3, URL, the method
/// flag, the header list, and finally the timeout when one is configured.
pub fn transfer_options(request: &HttpRequest, config: &TransportConfig) -> Vec<TransferOption> {
    let mut options = Vec::with_capacity(8);

    if let Some(path) = config.trust_store() {
        options.push(TransferOption::CaPath(path.to_path_buf()));
    }
    options.push(TransferOption::VerifyPeer(true));
    options.push(TransferOption::ForceHttp3);
    options.push(TransferOption::Url(request.url.clone()));

    match &request.method {
        HttpMethod::Get => options.push(TransferOption::HttpGet),
        HttpMethod::Post => options.push(TransferOption::Post),
        HttpMethod::Put => options.push(TransferOption::Upload),
        HttpMethod::Head => options.push(TransferOption::NoBody),
        HttpMethod::Delete | HttpMethod::Other(_) => {
            if request.body.is_some() {
                options.push(TransferOption::Post);
            }
            options.push(TransferOption::CustomRequest(
                request.method.as_str().to_string(),
            ));
        }
    }

    options.push(TransferOption::HttpHeaders(serialize_headers(
        &request.headers,
    )));

    if let Some(timeout) = config.timeout {
        options.push(TransferOption::Timeout(timeout));
    }
    options
}

/// One `name:value` entry per header value, in map order.
pub fn serialize_headers(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}:{}",
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes())
            )
        })
        .collect()
}

/// Split a raw header line on its first colon.
///
/// Lines without a colon, such as the status line or the blank line ending
/// the block, yield `None`. All whitespace is removed from the value,
/// including whitespace inside it. Names or values that `HeaderMap` cannot
/// hold (a space inside the name, control bytes in the value) also yield
/// `None`.
pub fn parse_header_line(line: &[u8]) -> Option<(HeaderName, HeaderValue)> {
    let colon = line.iter().position(|&b| b == b':')?;
    let (name, rest) = line.split_at(colon);
    let name = HeaderName::from_bytes(name.trim_ascii()).ok()?;
    let value: Vec<u8> = rest[1..]
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let value = HeaderValue::from_bytes(&value).ok()?;
    Some((name, value))
}

/// Callback target for one transfer.
///
/// Owns the response header map, the body buffer and the request body
/// exclusively; it is created per call and consumed into the response.
#[derive(Debug)]
pub struct ResponseCollector {
    headers: HeaderMap,
    body: Vec<u8>,
    limit: Option<u64>,
    source: Option<Body>,
    write_error: Option<String>,
    read_errors: usize,
}

impl ResponseCollector {
    pub fn new(source: Option<Body>, limit: Option<u64>) -> Self {
        Self {
            headers: HeaderMap::new(),
            body: Vec::new(),
            limit,
            source,
            write_error: None,
            read_errors: 0,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Request body read errors reported to the engine as end of data.
    pub fn read_errors(&self) -> usize {
        self.read_errors
    }

    fn buffer(&mut self, chunk: &[u8]) -> Result<(), String> {
        let total = self.body.len() as u64 + chunk.len() as u64;
        if let Some(limit) = self.limit.filter(|&limit| total > limit) {
            return Err(format!("response body exceeds {limit} bytes"));
        }
        self.body
            .try_reserve(chunk.len())
            .map_err(|err| err.to_string())?;
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    pub fn into_response(self, status: u16) -> HttpResponse {
        let content_length = self.body.len() as u64;
        HttpResponse {
            status,
            protocol: HTTP3_PROTOCOL.to_string(),
            headers: self.headers,
            body: Body::from_bytes(self.body),
            content_length,
        }
    }
}

impl TransferIo for ResponseCollector {
    fn on_header(&mut self, line: &[u8]) -> bool {
        match parse_header_line(line) {
            // Last occurrence wins; repeated response headers collapse.
            Some((name, value)) => {
                self.headers.insert(name, value);
            }
            None => {
                let line = String::from_utf8_lossy(line);
                tracing::trace!(line = %line.trim_end(), "ignoring header line");
            }
        }
        true
    }

    fn on_body(&mut self, chunk: &[u8]) -> bool {
        match self.buffer(chunk) {
            Ok(()) => true,
            Err(err) => {
                self.write_error = Some(err);
                false
            }
        }
    }

    fn on_read(&mut self, buf: &mut [u8]) -> usize {
        let Some(source) = self.source.as_mut() else {
            return 0;
        };
        loop {
            match source.read(buf) {
                Ok(n) => return n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "request body read failed, ending upload");
                    self.read_errors += 1;
                    return 0;
                }
            }
        }
    }
}
