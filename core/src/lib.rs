//! Client core for the knot classification service.
//!
//! # Overview
//! Submits a photo of a rope knot to a remote classifier and normalizes the
//! outcome into `PredictionResult` or a typed `ClassificationError`. Also
//! carries the read-only knot catalog and the screen state a host app needs
//! to drive its UI.
//!
//! # Design
//! - `KnotClient` is stateless and sans-IO: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`.
//! - `Classifier` adds local validation and a `Transport` (ureq by default)
//!   to give the blocking `classify` / `check_availability` contract.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.
//! - Logging goes through `tracing`; the crate never installs a subscriber.

pub mod catalog;
pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod navigation;
pub mod payload;
pub mod probe;
pub mod session;
pub mod transport;
pub mod types;

pub use catalog::{CatalogProvider, Difficulty, KnotCatalogEntry, StaticCatalog, SUPPORTED_CLASSES};
pub use classifier::Classifier;
pub use client::KnotClient;
pub use config::ClientConfig;
pub use error::ClassificationError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use navigation::{Navigator, Screen};
pub use payload::{ImageFormat, ImagePayload, MAX_IMAGE_BYTES};
pub use session::ScanSession;
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{ApiStatus, PredictionResult};
