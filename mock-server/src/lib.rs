//! In-process stand-in for the knot classification server.
//!
//! Serves the same two routes as the real service: `POST /predecir` takes a
//! multipart upload in the `imagen` field and answers with a deterministic
//! prediction, `GET /` answers with the status document. A file name
//! starting with `fail` makes `/predecir` answer 500, so clients can exercise
//! their server-error path over real HTTP.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Classes the model knows about.
pub const CLASSES: [&str; 13] = [
    "Nudo Ahorcado",
    "Nudo Calabrote",
    "Nudo Cote",
    "Nudo Empaquetador",
    "Nudo Llano",
    "Nudo Llano Doble",
    "Nudo Margarita",
    "Nudo Mariposa",
    "Nudo Pescador",
    "Nudo Pescador Doble",
    "Nudo Zarpa de Gato",
    "Nudo de Doble Lazo",
    "Nudo de Ocho",
];

/// Upload limit plus room for the multipart framing.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024 + 64 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    pub clase: String,
    pub probabilidad: f64,
    pub tiempo_proceso: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    pub endpoints: BTreeMap<String, String>,
    pub clases_soportadas: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                warn!(%error, "rejecting upload");
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
            }
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message).into_response(),
        }
    }
}

pub fn app() -> Router {
    Router::new()
        .route("/", get(status))
        .route("/predecir", post(predict))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn status() -> Json<Status> {
    Json(Status {
        status: "API funcionando correctamente".to_string(),
        endpoints: BTreeMap::from([(
            "/predecir".to_string(),
            "POST - Enviar imagen para clasificación".to_string(),
        )]),
        clases_soportadas: CLASSES.iter().map(|c| c.to_string()).collect(),
    })
}

async fn predict(mut multipart: Multipart) -> Result<Json<Prediction>, ApiError> {
    let started = Instant::now();
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("imagen") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(ApiError::BadRequest(format!("not an image: {content_type:?}")));
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let (file_name, bytes) = upload.ok_or_else(|| ApiError::BadRequest("missing field imagen".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("empty image".to_string()));
    }
    if file_name.starts_with("fail") {
        return Err(ApiError::Internal("internal error".to_string()));
    }

    let prediction = classify_bytes(&bytes, started.elapsed().as_secs_f64());
    info!(file = %file_name, bytes = bytes.len(), class = %prediction.clase, "classified upload");
    Ok(Json(prediction))
}

/// Deterministic stand-in for the model: the same bytes always get the same
/// class and probability.
pub fn classify_bytes(bytes: &[u8], elapsed_seconds: f64) -> Prediction {
    let sum: u64 = bytes.iter().map(|b| u64::from(*b)).sum();
    Prediction {
        clase: CLASSES[(sum % CLASSES.len() as u64) as usize].to_string(),
        probabilidad: 0.5 + (sum % 50) as f64 / 100.0,
        tiempo_proceso: elapsed_seconds,
    }
}
