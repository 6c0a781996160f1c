//! End-to-end classification calls: validate, build, execute, parse.
//!
//! # Design
//! `Classifier` pairs the stateless `KnotClient` with a `Transport`. It keeps
//! no per-call state, so one instance can serve calls from several threads.
//! `classify` and `check_availability` share `send`, which is the only path
//! from a payload to a `PredictionResult`.

use std::path::Path;

use tracing::debug;

use crate::client::KnotClient;
use crate::config::ClientConfig;
use crate::error::ClassificationError;
use crate::payload::{ImageFormat, ImagePayload};
use crate::probe;
use crate::transport::{Transport, UreqTransport};
use crate::types::{ApiStatus, PredictionResult};

/// Blocking classification client. Calls may take up to the configured
/// timeouts, so UI hosts should invoke them off their render thread.
#[derive(Debug, Clone)]
pub struct Classifier<T = UreqTransport> {
    client: KnotClient,
    transport: T,
}

impl Classifier<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            client: KnotClient::new(&config.base_url),
            transport: UreqTransport::new(config),
        }
    }
}

impl<T: Transport> Classifier<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            client: KnotClient::new(base_url),
            transport,
        }
    }

    pub fn client(&self) -> &KnotClient {
        &self.client
    }

    /// Classify the image at `path`.
    ///
    /// Returns `FileUnavailable`, `PayloadTooLarge` or `UnsupportedFormat`
    /// without touching the network when a local check fails.
    pub fn classify(&self, path: impl AsRef<Path>) -> Result<PredictionResult, ClassificationError> {
        let payload = ImagePayload::from_path(path.as_ref())?;
        self.send(&payload)
    }

    /// Verify the server answers a real classification request, using a
    /// generated 1x1 black JPEG. The temporary file is deleted on every exit
    /// path. Size and format checks are skipped; the probe always passes them.
    pub fn check_availability(&self) -> Result<(), ClassificationError> {
        let probe_file = probe::write_probe_file()?;
        let payload = ImagePayload::read_trusted(probe_file.path(), ImageFormat::Jpeg)?;
        let prediction = self.send(&payload)?;
        debug!(
            class = %prediction.knot_class,
            probability = prediction.probability,
            "probe classified"
        );
        Ok(())
    }

    /// Fetch the server's status document.
    pub fn status(&self) -> Result<ApiStatus, ClassificationError> {
        let response = self.transport.execute(self.client.build_status())?;
        self.client.parse_status(response)
    }

    fn send(&self, payload: &ImagePayload) -> Result<PredictionResult, ClassificationError> {
        debug!(
            file = %payload.file_name,
            bytes = payload.bytes.len(),
            mime = payload.mime_type(),
            "classifying image"
        );
        let request = self.client.build_classify(payload);
        let response = self.transport.execute(request)?;
        self.client.parse_classify(response)
    }
}
