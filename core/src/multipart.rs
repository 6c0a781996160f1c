//! Single-part `multipart/form-data` encoder for image uploads.

use uuid::Uuid;

use crate::payload::ImagePayload;

/// Form field the server reads the image from.
pub const IMAGE_FIELD: &str = "imagen";

/// An encoded multipart body together with its `content-type` header value.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Encode `payload` as the only part of a form, under `IMAGE_FIELD`.
pub fn encode_image(payload: &ImagePayload) -> MultipartBody {
    let boundary = format!("knot-boundary-{}", Uuid::new_v4().simple());
    encode_with_boundary(payload, &boundary)
}

fn encode_with_boundary(payload: &ImagePayload, boundary: &str) -> MultipartBody {
    let head = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{IMAGE_FIELD}\"; filename=\"{}\"\r\n\
         Content-Type: {}\r\n\r\n",
        escape_file_name(&payload.file_name),
        payload.mime_type(),
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    let mut body = Vec::with_capacity(head.len() + payload.bytes.len() + tail.len());
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(&payload.bytes);
    body.extend_from_slice(tail.as_bytes());

    MultipartBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        body,
    }
}

// Quotes would end the parameter and line breaks would end the header.
fn escape_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}
