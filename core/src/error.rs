//! Error types for the knot classification client.
//!
//! # Design
//! Every failure a caller can observe from `classify` or `check_availability`
//! is one variant of `ClassificationError`. Local precondition failures, the
//! three transport failure classes, and the HTTP status mapping each get a
//! dedicated variant so the UI can match exhaustively instead of inspecting
//! message text.

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Errors returned by the classification client. All of them are recoverable
/// at the call site.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassificationError {
    /// The local image file is missing or cannot be read.
    #[error("image file {} is unavailable: {reason}", .path.display())]
    FileUnavailable { path: PathBuf, reason: String },

    /// The image is larger than the upload limit. No request was sent.
    #[error("image is {size} bytes, the limit is {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// The file extension is not one of jpg, jpeg, png or webp.
    #[error("unsupported image format {extension:?}, use JPG, JPEG, PNG or WEBP")]
    UnsupportedFormat { extension: String },

    /// The endpoint could not be reached at all.
    #[error("could not connect to the classification server: {0}")]
    ConnectionFailed(String),

    /// No response arrived within the configured timeout.
    #[error("timed out waiting for the classification server")]
    Timeout,

    /// Any other I/O failure while the request was in transfer.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The server answered 2xx but the body was empty or not a prediction.
    #[error("empty response from the classification server")]
    EmptyResponse,

    /// The server answered 400: malformed request or missing image.
    #[error("bad request: malformed request or missing image")]
    BadRequest,

    /// The server answered 500, optionally with an error body.
    #[error("server error: {}", .message.as_deref().unwrap_or("no details provided"))]
    ServerError { message: Option<String> },

    /// The server answered with any other non-2xx status.
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
}

impl ClassificationError {
    /// What the caller should suggest to the user for this kind of failure.
    pub fn guidance(&self) -> &'static str {
        match self {
            ClassificationError::FileUnavailable { .. } => "select the image again",
            ClassificationError::PayloadTooLarge { .. } => "choose an image smaller than 10 MB",
            ClassificationError::UnsupportedFormat { .. } => "choose a JPG, JPEG, PNG or WEBP image",
            ClassificationError::ConnectionFailed(_) => {
                "the server may be down, unreachable from this network, or the address may be misconfigured"
            }
            ClassificationError::Timeout => "try again later",
            ClassificationError::NetworkError(_) => "check your internet connection",
            ClassificationError::EmptyResponse => "try again or report the server issue",
            ClassificationError::BadRequest => "the request was malformed; select the image again",
            ClassificationError::ServerError { .. } => "try again later",
            ClassificationError::UnexpectedStatus(_) => "report the status code shown",
        }
    }

    /// The HTTP status behind this error, when it came from a response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClassificationError::BadRequest => Some(400),
            ClassificationError::ServerError { .. } => Some(500),
            ClassificationError::UnexpectedStatus(code) => Some(*code),
            _ => None,
        }
    }

    /// True when no request reached the network because a local check failed.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ClassificationError::FileUnavailable { .. }
                | ClassificationError::PayloadTooLarge { .. }
                | ClassificationError::UnsupportedFormat { .. }
        )
    }
}

impl From<TransportError> for ClassificationError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectionFailed(cause) => ClassificationError::ConnectionFailed(cause),
            TransportError::Timeout => ClassificationError::Timeout,
            TransportError::Io(cause) => ClassificationError::NetworkError(cause),
        }
    }
}
