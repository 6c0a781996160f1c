//! DTOs for the classification API.
//!
//! # Design
//! Field names on the wire are the server's (`clase`, `probabilidad`,
//! `tiempo_proceso`); the Rust names describe the meaning. The mock-server
//! crate defines its own copies, and integration tests catch drift.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of one successful classification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(rename = "clase")]
    pub knot_class: String,
    /// Confidence in `0.0..=1.0`.
    #[serde(rename = "probabilidad")]
    pub probability: f64,
    #[serde(rename = "tiempo_proceso")]
    pub processing_time_seconds: f64,
}

/// Body of `GET /` on the classification server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub status: String,
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
    #[serde(rename = "clases_soportadas", default)]
    pub supported_classes: Vec<String>,
}
