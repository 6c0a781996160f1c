//! Stateless HTTP request builder and response parser for the classification API.
//!
//! # Design
//! `KnotClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the round-trip, so the same code serves the Rust
//! `Classifier` and native hosts that do their own networking.

use serde::de::DeserializeOwned;

use crate::error::ClassificationError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart;
use crate::payload::ImagePayload;
use crate::types::{ApiStatus, PredictionResult};

/// Path of the classification endpoint, relative to the base URL.
pub const PREDICT_PATH: &str = "/predecir";

/// Synchronous, stateless client for the classification API.
#[derive(Debug, Clone)]
pub struct KnotClient {
    base_url: String,
}

impl KnotClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the multipart upload for one image.
    pub fn build_classify(&self, payload: &ImagePayload) -> HttpRequest {
        let encoded = multipart::encode_image(payload);
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{PREDICT_PATH}", self.base_url),
            headers: vec![
                ("content-type".to_string(), encoded.content_type),
                ("content-length".to_string(), encoded.body.len().to_string()),
            ],
            body: Some(encoded.body),
        }
    }

    pub fn build_status(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_classify(&self, response: HttpResponse) -> Result<PredictionResult, ClassificationError> {
        parse_success_body(response)
    }

    pub fn parse_status(&self, response: HttpResponse) -> Result<ApiStatus, ClassificationError> {
        parse_success_body(response)
    }
}

/// Map the status code, then decode a 2xx body. An empty or undecodable
/// success body is `EmptyResponse`.
fn parse_success_body<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ClassificationError> {
    check_status(&response)?;
    if response.body.trim().is_empty() {
        return Err(ClassificationError::EmptyResponse);
    }
    serde_json::from_str(&response.body).map_err(|e| {
        tracing::debug!(error = %e, "undecodable success body");
        ClassificationError::EmptyResponse
    })
}

/// Map non-success status codes to the appropriate error variant.
fn check_status(response: &HttpResponse) -> Result<(), ClassificationError> {
    if response.is_success() {
        return Ok(());
    }
    match response.status {
        400 => Err(ClassificationError::BadRequest),
        // The body is passed through verbatim.
        500 => Err(ClassificationError::ServerError {
            message: (!response.body.is_empty()).then(|| response.body.clone()),
        }),
        other => Err(ClassificationError::UnexpectedStatus(other)),
    }
}
