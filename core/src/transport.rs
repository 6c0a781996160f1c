//! Blocking execution of `HttpRequest` values.
//!
//! # Design
//! `Transport` is the only seam between the sans-IO `KnotClient` and the
//! network. `UreqTransport` is the production implementation; tests swap in
//! recording fakes. Transport failures are reduced to three classes
//! (connection, timeout, other I/O) and every HTTP status, including 4xx and
//! 5xx, comes back as an `HttpResponse` for the client to interpret.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Failure to complete an HTTP exchange at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("timed out")]
    Timeout,

    #[error("i/o error: {0}")]
    Io(String),
}

/// Executes one request and returns the response as data.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// `Transport` backed by a ureq agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    log_bodies: bool,
    retry_on_connection_failure: bool,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(config.connect_timeout))
            .timeout_send_request(Some(config.write_timeout))
            .timeout_send_body(Some(config.write_timeout))
            .timeout_recv_response(Some(config.read_timeout))
            .timeout_recv_body(Some(config.read_timeout))
            .build()
            .new_agent();

        Self {
            agent,
            log_bodies: config.log_bodies,
            retry_on_connection_failure: config.retry_on_connection_failure,
        }
    }

    fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(&request.url), &request.headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(&request.url), &request.headers).send(body)
            }
            (HttpMethod::Post, None) => {
                with_headers(self.agent.post(&request.url), &request.headers).send_empty()
            }
        };
        let mut response = result.map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let bytes = response.body_mut().read_to_vec().map_err(map_ureq_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if self.log_bodies {
            debug!(
                method = request.method.as_str(),
                url = %request.url,
                content_type = request.header("content-type").unwrap_or(""),
                body_bytes = request.body.as_ref().map_or(0, Vec::len),
                "sending request"
            );
        }

        let response = with_reconnect(self.retry_on_connection_failure, &request.url, || {
            self.send_once(&request)
        })?;

        if self.log_bodies {
            debug!(status = response.status, body = %response.body, "received response");
        }
        Ok(response)
    }
}

/// Run `send`, re-attempting exactly once when it fails with
/// `ConnectionFailed` and `reconnect` is set. Other failures are returned
/// as-is.
fn with_reconnect<F>(reconnect: bool, url: &str, mut send: F) -> Result<HttpResponse, TransportError>
where
    F: FnMut() -> Result<HttpResponse, TransportError>,
{
    match send() {
        Err(TransportError::ConnectionFailed(cause)) if reconnect => {
            warn!(url, %cause, "connection failed, reconnecting once");
            send()
        }
        other => other,
    }
}

// ureq derives content-length from the body itself.
fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (key, value) in headers {
        if key.eq_ignore_ascii_case("content-length") {
            continue;
        }
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
            TransportError::ConnectionFailed(err.to_string())
        }
        ureq::Error::Io(io) => map_io_error(&io),
        other => TransportError::Io(other.to_string()),
    }
}

fn map_io_error(err: &io::Error) -> TransportError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::NotConnected => TransportError::ConnectionFailed(err.to_string()),
        io::ErrorKind::TimedOut => TransportError::Timeout,
        _ => TransportError::Io(err.to_string()),
    }
}
