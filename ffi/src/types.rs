//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, pointer plus length instead of `Vec`,
//! and enums with explicit discriminants. Conversion and release helpers
//! live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use knot_core::catalog::{Difficulty, KnotCatalogEntry, StaticCatalog};
use knot_core::http::HttpMethod;
use knot_core::{ClassificationError, Classifier, PredictionResult};

/// Opaque handle to a `Classifier`.
pub struct FfiClassifier {
    pub(crate) inner: Classifier,
}

/// Opaque handle to the knot catalog.
pub struct FfiCatalog {
    pub(crate) inner: StaticCatalog,
}

/// Convert a Rust string into an owned C string. Interior NULs are dropped.
pub(crate) fn to_c_string(s: impl Into<String>) -> *mut c_char {
    let s: String = s.into();
    CString::new(s.replace('\0', "")).unwrap_or_default().into_raw()
}

/// Release a C string produced by `to_c_string`. Null is ignored.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Leak a vector as a pointer to its first element. Null when empty.
pub(crate) fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let ptr = Box::into_raw(items.into_boxed_slice()) as *mut T;
    (ptr, len)
}

/// Reclaim a slice leaked by `into_raw_slice`.
pub(crate) unsafe fn from_raw_slice<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request for the host to execute.
///
/// `body` is binary (a multipart upload) and is `body_len` bytes long.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: knot_core::HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(k),
                value: to_c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_slice(headers);
        let (body, body_len) = into_raw_slice(req.body.unwrap_or_default());

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: to_c_string(req.url),
            headers,
            headers_len,
            body,
            body_len,
        }))
    }

    pub(crate) unsafe fn release(self) {
        unsafe {
            free_c_string(self.url);
            for header in from_raw_slice(self.headers, self.headers_len) {
                free_c_string(header.key);
                free_c_string(header.value);
            }
            drop(from_raw_slice(self.body, self.body_len));
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The host builds this after executing an `FfiHttpRequest` and passes a
/// pointer to `knot_parse_classify`. The FFI layer reads but does not free
/// these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiKnotResult`, one per `ClassificationError`
/// kind plus the FFI-specific failures.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    FileUnavailable = 1,
    PayloadTooLarge = 2,
    UnsupportedFormat = 3,
    ConnectionFailed = 4,
    Timeout = 5,
    NetworkError = 6,
    EmptyResponse = 7,
    BadRequest = 8,
    ServerError = 9,
    UnexpectedStatus = 10,
    Panic = 11,
    NullArg = 12,
}

impl From<&ClassificationError> for FfiErrorCode {
    fn from(err: &ClassificationError) -> Self {
        match err {
            ClassificationError::FileUnavailable { .. } => FfiErrorCode::FileUnavailable,
            ClassificationError::PayloadTooLarge { .. } => FfiErrorCode::PayloadTooLarge,
            ClassificationError::UnsupportedFormat { .. } => FfiErrorCode::UnsupportedFormat,
            ClassificationError::ConnectionFailed(_) => FfiErrorCode::ConnectionFailed,
            ClassificationError::Timeout => FfiErrorCode::Timeout,
            ClassificationError::NetworkError(_) => FfiErrorCode::NetworkError,
            ClassificationError::EmptyResponse => FfiErrorCode::EmptyResponse,
            ClassificationError::BadRequest => FfiErrorCode::BadRequest,
            ClassificationError::ServerError { .. } => FfiErrorCode::ServerError,
            ClassificationError::UnexpectedStatus(_) => FfiErrorCode::UnexpectedStatus,
        }
    }
}

/// Tag that tells `knot_free_result` what `FfiKnotResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Prediction = 1,
}

/// A prediction exposed to C.
#[repr(C)]
pub struct FfiPrediction {
    pub knot_class: *mut c_char,
    pub probability: f64,
    pub processing_time_seconds: f64,
}

/// Result envelope for classification calls.
///
/// On success `error_code` is `Ok`, the message pointers are null, and
/// `data` points to the payload tagged by `data_tag`. On failure
/// `error_message` and `guidance` are human-readable C strings, and
/// `http_status` is set when the error came from a response.
#[repr(C)]
pub struct FfiKnotResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub guidance: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiKnotResult {
    fn boxed(error_code: FfiErrorCode, message: Option<String>, guidance: Option<&str>, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiKnotResult {
            error_code,
            error_message: message.map_or(std::ptr::null_mut(), to_c_string),
            guidance: guidance.map_or(std::ptr::null_mut(), to_c_string),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build a success result carrying a prediction.
    pub(crate) fn ok_prediction(prediction: PredictionResult) -> *mut Self {
        let ffi_prediction = Box::new(FfiPrediction {
            knot_class: to_c_string(prediction.knot_class),
            probability: prediction.probability,
            processing_time_seconds: prediction.processing_time_seconds,
        });
        let result = Self::boxed(FfiErrorCode::Ok, None, None, 0);
        unsafe {
            (*result).data_tag = FfiDataTag::Prediction;
            (*result).data = Box::into_raw(ffi_prediction) as *mut std::ffi::c_void;
        }
        result
    }

    /// Build a success result with no payload (availability check).
    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, None, None, 0)
    }

    /// Build an error result from a `ClassificationError`.
    pub(crate) fn from_error(err: ClassificationError) -> *mut Self {
        Self::boxed(
            FfiErrorCode::from(&err),
            Some(err.to_string()),
            Some(err.guidance()),
            err.http_status().unwrap_or(0),
        )
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::NullArg, Some(format!("null argument: {name}")), None, 0)
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg.to_string()), None, 0)
    }

    pub(crate) unsafe fn release(self) {
        unsafe {
            free_c_string(self.error_message);
            free_c_string(self.guidance);
            if !self.data.is_null() {
                match self.data_tag {
                    FfiDataTag::Prediction => {
                        let prediction = Box::from_raw(self.data as *mut FfiPrediction);
                        free_c_string(prediction.knot_class);
                    }
                    FfiDataTag::None => {}
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDifficulty {
    Easy = 0,
    Intermediate = 1,
    Hard = 2,
}

impl From<Difficulty> for FfiDifficulty {
    fn from(d: Difficulty) -> Self {
        match d {
            Difficulty::Easy => FfiDifficulty::Easy,
            Difficulty::Intermediate => FfiDifficulty::Intermediate,
            Difficulty::Hard => FfiDifficulty::Hard,
        }
    }
}

/// One catalog entry exposed to C. `uses` holds `uses_len` C strings.
#[repr(C)]
pub struct FfiCatalogEntry {
    pub name: *mut c_char,
    pub image_ref: *mut c_char,
    pub description: *mut c_char,
    pub uses: *mut *mut c_char,
    pub uses_len: u32,
    pub difficulty: FfiDifficulty,
    pub difficulty_label: *mut c_char,
}

impl FfiCatalogEntry {
    pub(crate) fn from_core(entry: &KnotCatalogEntry) -> *mut Self {
        let uses: Vec<*mut c_char> = entry.uses.iter().map(|u| to_c_string(u.as_str())).collect();
        let (uses, uses_len) = into_raw_slice(uses);
        Box::into_raw(Box::new(FfiCatalogEntry {
            name: to_c_string(entry.name.as_str()),
            image_ref: to_c_string(entry.image_ref.as_str()),
            description: to_c_string(entry.description.as_str()),
            uses,
            uses_len,
            difficulty: entry.difficulty.into(),
            difficulty_label: to_c_string(entry.difficulty.label()),
        }))
    }

    pub(crate) unsafe fn release(self) {
        unsafe {
            free_c_string(self.name);
            free_c_string(self.image_ref);
            free_c_string(self.description);
            free_c_string(self.difficulty_label);
            for item in from_raw_slice(self.uses, self.uses_len) {
                free_c_string(item);
            }
        }
    }
}
