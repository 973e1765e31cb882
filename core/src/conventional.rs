//! Conventional transport over ureq.
//!
//! A blocking `ureq::Agent` carries requests that are not forced onto HTTP/3.
//! Status codes are data here: the agent is built with
//! `http_status_as_error(false)` so 4xx/5xx responses come back as
//! `HttpResponse` values rather than errors.

use http::HeaderMap;
use ureq::http::Version;
use ureq::{Agent, Body as UreqBody, RequestBuilder};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::RoundTrip;

#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    max_body_size: u64,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            max_body_size: config.max_body_size.unwrap_or(u64::MAX),
        }
    }

    /// Wrap an agent configured elsewhere.
    pub fn from_agent(agent: Agent) -> Self {
        Self {
            agent,
            max_body_size: u64::MAX,
        }
    }

    fn send(&self, request: HttpRequest) -> Result<ureq::http::Response<UreqBody>, ureq::Error> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let body = body
            .map(|mut body| body.read_to_vec())
            .transpose()
            .map_err(ureq::Error::Io)?;
        let agent = &self.agent;
        let uri = url.as_str();
        if body.is_some() && matches!(method, HttpMethod::Get | HttpMethod::Head) {
            tracing::debug!(%method, url = uri, "request body not sent");
        }

        match (method, body) {
            (HttpMethod::Get, _) => with_headers(agent.get(uri), &headers).call(),
            (HttpMethod::Head, _) => with_headers(agent.head(uri), &headers).call(),
            (HttpMethod::Delete, None) => with_headers(agent.delete(uri), &headers).call(),
            (HttpMethod::Post, Some(body)) => with_headers(agent.post(uri), &headers).send(body),
            (HttpMethod::Post, None) => with_headers(agent.post(uri), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(agent.put(uri), &headers).send(body),
            (HttpMethod::Put, None) => with_headers(agent.put(uri), &headers).send_empty(),
            (method, body) => {
                let mut builder = ureq::http::Request::builder()
                    .method(method.as_str())
                    .uri(uri);
                for (name, value) in &headers {
                    builder = builder.header(name, value);
                }
                let request = builder
                    .body(body.unwrap_or_default())
                    .map_err(ureq::Error::Http)?;
                agent.run(request)
            }
        }
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &HeaderMap) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.clone(), value.clone());
    }
    builder
}

fn protocol_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/1.1",
    }
}

impl RoundTrip for UreqTransport {
    fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut response = self.send(request)?;
        let status = response.status().as_u16();
        let protocol = protocol_label(response.version()).to_string();
        let headers = response.headers().clone();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_body_size)
            .read_to_vec()?;
        Ok(HttpResponse {
            status,
            protocol,
            headers,
            content_length: bytes.len() as u64,
            body: Body::from_bytes(bytes),
        })
    }
}
