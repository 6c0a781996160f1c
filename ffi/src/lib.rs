//! C-ABI wrapper around `knot-core`.
//!
//! # Overview
//! Lets an Android or iOS host classify knot photos and browse the catalog
//! through `extern "C"` functions. Two ways to classify are offered:
//! - `knot_classify` / `knot_check_availability` run the whole call,
//!   networking included, and block until done. Call them off the UI thread.
//! - `knot_build_classify` / `knot_parse_classify` split the call so the
//!   host can use its own HTTP stack in between.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - A single `FfiKnotResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The caller owns all returned pointers and must call the matching
//!   `knot_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use knot_core::catalog::{CatalogProvider, StaticCatalog};
use knot_core::http::HttpResponse;
use knot_core::{ClassificationError, Classifier, ClientConfig, ImagePayload};

use types::*;

/// Read a C path argument. Non-UTF-8 paths become `FileUnavailable`.
fn path_arg(path: *const c_char) -> Result<PathBuf, ClassificationError> {
    let raw = unsafe { CStr::from_ptr(path) };
    raw.to_str()
        .map(PathBuf::from)
        .map_err(|_| ClassificationError::FileUnavailable {
            path: PathBuf::from(raw.to_string_lossy().into_owned()),
            reason: "path is not valid UTF-8".to_string(),
        })
}

// ---------------------------------------------------------------------------
// Classifier lifecycle
// ---------------------------------------------------------------------------

/// Create a classifier for `base_url` with default timeouts.
///
/// Returns null if `base_url` is null or not UTF-8.
/// The caller must free the returned pointer with `knot_classifier_free`.
#[unsafe(no_mangle)]
pub extern "C" fn knot_classifier_new(base_url: *const c_char) -> *mut FfiClassifier {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let url = match unsafe { CStr::from_ptr(base_url) }.to_str() {
            Ok(url) => url,
            Err(_) => return std::ptr::null_mut(),
        };
        let inner = Classifier::from_config(&ClientConfig::new(url));
        Box::into_raw(Box::new(FfiClassifier { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a classifier configured from `KNOT_*` environment variables,
/// falling back to the deployed server and 30 s timeouts.
#[unsafe(no_mangle)]
pub extern "C" fn knot_classifier_from_env() -> *mut FfiClassifier {
    catch_unwind(|| {
        let inner = Classifier::from_config(&ClientConfig::from_env());
        Box::into_raw(Box::new(FfiClassifier { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a classifier. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn knot_classifier_free(classifier: *mut FfiClassifier) {
    if !classifier.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(classifier) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Blocking calls
// ---------------------------------------------------------------------------

/// Classify the image at `path`. Blocks for up to the configured timeouts.
///
/// Returns a result with `data_tag = Prediction` on success.
#[unsafe(no_mangle)]
pub extern "C" fn knot_classify(classifier: *const FfiClassifier, path: *const c_char) -> *mut FfiKnotResult {
    catch_unwind(AssertUnwindSafe(|| {
        if classifier.is_null() {
            return FfiKnotResult::null_arg("classifier");
        }
        if path.is_null() {
            return FfiKnotResult::null_arg("path");
        }
        let classifier = unsafe { &*classifier };
        let outcome = path_arg(path).and_then(|p| classifier.inner.classify(p));
        match outcome {
            Ok(prediction) => FfiKnotResult::ok_prediction(prediction),
            Err(e) => FfiKnotResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiKnotResult::panic("panic in knot_classify"))
}

/// Check that the server answers, using a generated probe image.
///
/// Returns a result with `data_tag = None` on success.
#[unsafe(no_mangle)]
pub extern "C" fn knot_check_availability(classifier: *const FfiClassifier) -> *mut FfiKnotResult {
    catch_unwind(AssertUnwindSafe(|| {
        if classifier.is_null() {
            return FfiKnotResult::null_arg("classifier");
        }
        let classifier = unsafe { &*classifier };
        match classifier.inner.check_availability() {
            Ok(()) => FfiKnotResult::ok_empty(),
            Err(e) => FfiKnotResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiKnotResult::panic("panic in knot_check_availability"))
}

// ---------------------------------------------------------------------------
// Host-does-IO calls
// ---------------------------------------------------------------------------

/// Validate the image at `path` and build the upload request for it.
///
/// Returns null on failure; when `out_error` is not null it receives the
/// error code (`Ok` on success). Free the request with `knot_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn knot_build_classify(
    classifier: *const FfiClassifier,
    path: *const c_char,
    out_error: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    let report = |code: FfiErrorCode| {
        if !out_error.is_null() {
            unsafe { *out_error = code };
        }
    };
    catch_unwind(AssertUnwindSafe(|| {
        if classifier.is_null() || path.is_null() {
            report(FfiErrorCode::NullArg);
            return std::ptr::null_mut();
        }
        let classifier = unsafe { &*classifier };
        match path_arg(path).and_then(|p| ImagePayload::from_path(&p)) {
            Ok(payload) => {
                report(FfiErrorCode::Ok);
                FfiHttpRequest::from_core(classifier.inner.client().build_classify(&payload))
            }
            Err(e) => {
                report(FfiErrorCode::from(&e));
                std::ptr::null_mut()
            }
        }
    }))
    .unwrap_or_else(|_| {
        report(FfiErrorCode::Panic);
        std::ptr::null_mut()
    })
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }.to_string_lossy().into_owned()
    };
    HttpResponse::new(resp.status, body)
}

/// Parse the host's response to a request from `knot_build_classify`.
///
/// Returns a result with `data_tag = Prediction` on success.
#[unsafe(no_mangle)]
pub extern "C" fn knot_parse_classify(
    classifier: *const FfiClassifier,
    response: *const FfiHttpResponse,
) -> *mut FfiKnotResult {
    catch_unwind(AssertUnwindSafe(|| {
        if classifier.is_null() {
            return FfiKnotResult::null_arg("classifier");
        }
        if response.is_null() {
            return FfiKnotResult::null_arg("response");
        }
        let classifier = unsafe { &*classifier };
        let resp = unsafe { &*response };
        match classifier.inner.client().parse_classify(ffi_response_to_core(resp)) {
            Ok(prediction) => FfiKnotResult::ok_prediction(prediction),
            Err(e) => FfiKnotResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiKnotResult::panic("panic in knot_parse_classify"))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Load the bundled knot catalog. Returns null if the bundled data is invalid.
/// Free with `knot_catalog_free`.
#[unsafe(no_mangle)]
pub extern "C" fn knot_catalog_new() -> *mut FfiCatalog {
    catch_unwind(|| match StaticCatalog::builtin() {
        Ok(inner) => Box::into_raw(Box::new(FfiCatalog { inner })),
        Err(_) => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a catalog. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn knot_catalog_free(catalog: *mut FfiCatalog) {
    if !catalog.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(catalog) });
        });
    }
}

/// Number of entries in the catalog; 0 for null.
#[unsafe(no_mangle)]
pub extern "C" fn knot_catalog_len(catalog: *const FfiCatalog) -> u32 {
    if catalog.is_null() {
        return 0;
    }
    catch_unwind(|| unsafe { &*catalog }.inner.len() as u32).unwrap_or(0)
}

/// Copy the entry at `index`. Returns null if `catalog` is null or `index`
/// is out of range. Free with `knot_free_catalog_entry`.
#[unsafe(no_mangle)]
pub extern "C" fn knot_catalog_entry(catalog: *const FfiCatalog, index: u32) -> *mut FfiCatalogEntry {
    catch_unwind(|| {
        if catalog.is_null() {
            return std::ptr::null_mut();
        }
        let catalog = unsafe { &*catalog };
        catalog
            .inner
            .entries()
            .get(index as usize)
            .map_or(std::ptr::null_mut(), FfiCatalogEntry::from_core)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Copy the entry named `name` (exact match, e.g. a predicted class).
/// Returns null when there is no such entry.
#[unsafe(no_mangle)]
pub extern "C" fn knot_catalog_find(catalog: *const FfiCatalog, name: *const c_char) -> *mut FfiCatalogEntry {
    catch_unwind(|| {
        if catalog.is_null() || name.is_null() {
            return std::ptr::null_mut();
        }
        let catalog = unsafe { &*catalog };
        let name = unsafe { CStr::from_ptr(name) }.to_string_lossy();
        catalog
            .inner
            .find(&name)
            .map_or(std::ptr::null_mut(), FfiCatalogEntry::from_core)
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by `knot_build_classify`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn knot_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { Box::from_raw(req).release() });
}

/// Free a result returned by any classification call. Safe to call with
/// null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn knot_free_result(result: *mut FfiKnotResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { Box::from_raw(result).release() });
}

/// Free an entry returned by `knot_catalog_entry` or `knot_catalog_find`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn knot_free_catalog_entry(entry: *mut FfiCatalogEntry) {
    if entry.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { Box::from_raw(entry).release() });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn knot_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| unsafe { free_c_string(s) });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::io::Write;

    fn new_classifier(url: &str) -> *mut FfiClassifier {
        let url = CString::new(url).unwrap();
        knot_classifier_new(url.as_ptr())
    }

    fn c_path(file: &tempfile::NamedTempFile) -> CString {
        CString::new(file.path().to_str().unwrap()).unwrap()
    }

    fn image_file(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    fn read_c(s: *const c_char) -> String {
        unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_string()
    }

    #[test]
    fn classifier_new_and_free() {
        let classifier = new_classifier("http://localhost:5000");
        assert!(!classifier.is_null());
        knot_classifier_free(classifier);
    }

    #[test]
    fn classifier_new_null_returns_null() {
        assert!(knot_classifier_new(std::ptr::null()).is_null());
    }

    #[test]
    fn classifier_free_null_is_safe() {
        knot_classifier_free(std::ptr::null_mut());
    }

    #[test]
    fn classify_null_args() {
        let result = knot_classify(std::ptr::null(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        knot_free_result(result);

        let classifier = new_classifier("http://localhost:5000");
        let result = knot_classify(classifier, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        assert_eq!(read_c(r.error_message), "null argument: path");
        knot_free_result(result);
        knot_classifier_free(classifier);
    }

    #[test]
    fn classify_missing_file() {
        let classifier = new_classifier("http://localhost:5000");
        let path = CString::new("/no/such/knot.jpg").unwrap();
        let result = knot_classify(classifier, path.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::FileUnavailable);
        assert!(!r.error_message.is_null());
        assert!(!r.guidance.is_null());
        assert_eq!(r.http_status, 0);
        assert_eq!(r.data_tag, FfiDataTag::None);
        assert!(r.data.is_null());
        knot_free_result(result);
        knot_classifier_free(classifier);
    }

    #[test]
    fn classify_unsupported_format() {
        let classifier = new_classifier("http://localhost:5000");
        let file = image_file(".gif", b"GIF89a");
        let path = c_path(&file);
        let result = knot_classify(classifier, path.as_ptr());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::UnsupportedFormat);
        knot_free_result(result);
        knot_classifier_free(classifier);
    }

    #[test]
    fn build_classify_produces_multipart_request() {
        let classifier = new_classifier("http://localhost:5000/");
        let file = image_file(".png", b"png bytes");
        let path = c_path(&file);
        let mut code = FfiErrorCode::Panic;
        let req = knot_build_classify(classifier, path.as_ptr(), &mut code);
        assert!(!req.is_null());
        assert_eq!(code, FfiErrorCode::Ok);

        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Post);
        assert_eq!(read_c(r.url), "http://localhost:5000/predecir");
        assert_eq!(r.headers_len, 2);

        let headers = unsafe { std::slice::from_raw_parts(r.headers, r.headers_len as usize) };
        assert_eq!(read_c(headers[0].key), "content-type");
        assert!(read_c(headers[0].value).starts_with("multipart/form-data; boundary="));

        let body = unsafe { std::slice::from_raw_parts(r.body, r.body_len as usize) };
        let text = String::from_utf8_lossy(body);
        assert!(text.contains("name=\"imagen\""));
        assert!(text.contains("Content-Type: image/png"));
        assert!(text.contains("png bytes"));

        knot_free_request(req);
        knot_classifier_free(classifier);
    }

    #[test]
    fn build_classify_reports_precondition_failure() {
        let classifier = new_classifier("http://localhost:5000");
        let file = image_file(".bmp", b"BM");
        let path = c_path(&file);
        let mut code = FfiErrorCode::Ok;
        let req = knot_build_classify(classifier, path.as_ptr(), &mut code);
        assert!(req.is_null());
        assert_eq!(code, FfiErrorCode::UnsupportedFormat);

        // out_error is optional.
        assert!(knot_build_classify(classifier, path.as_ptr(), std::ptr::null_mut()).is_null());
        knot_classifier_free(classifier);
    }

    #[test]
    fn parse_classify_success() {
        let classifier = new_classifier("http://localhost:5000");
        let body = CString::new(r#"{"clase":"Nudo Llano","probabilidad":0.97,"tiempo_proceso":0.42}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = knot_parse_classify(classifier, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.data_tag, FfiDataTag::Prediction);

        let prediction = unsafe { &*(r.data as *const FfiPrediction) };
        assert_eq!(read_c(prediction.knot_class), "Nudo Llano");
        assert_eq!(prediction.probability, 0.97);
        assert_eq!(prediction.processing_time_seconds, 0.42);

        knot_free_result(result);
        knot_classifier_free(classifier);
    }

    #[test]
    fn parse_classify_server_error() {
        let classifier = new_classifier("http://localhost:5000");
        let body = CString::new("internal error").unwrap();
        let resp = FfiHttpResponse {
            status: 500,
            body: body.as_ptr(),
        };
        let result = knot_parse_classify(classifier, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::ServerError);
        assert_eq!(r.http_status, 500);
        assert_eq!(read_c(r.error_message), "server error: internal error");
        knot_free_result(result);
        knot_classifier_free(classifier);
    }

    #[test]
    fn parse_classify_null_body_is_empty_response() {
        let classifier = new_classifier("http://localhost:5000");
        let resp = FfiHttpResponse {
            status: 200,
            body: std::ptr::null(),
        };
        let result = knot_parse_classify(classifier, &resp);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::EmptyResponse);
        knot_free_result(result);
        knot_classifier_free(classifier);
    }

    #[test]
    fn parse_classify_unexpected_status() {
        let classifier = new_classifier("http://localhost:5000");
        let resp = FfiHttpResponse {
            status: 404,
            body: std::ptr::null(),
        };
        let result = knot_parse_classify(classifier, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::UnexpectedStatus);
        assert_eq!(r.http_status, 404);
        knot_free_result(result);
        knot_classifier_free(classifier);
    }

    #[test]
    fn parse_null_response_returns_null_arg() {
        let classifier = new_classifier("http://localhost:5000");
        let result = knot_parse_classify(classifier, std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        knot_free_result(result);
        knot_classifier_free(classifier);
    }

    #[test]
    fn catalog_entries() {
        let catalog = knot_catalog_new();
        assert!(!catalog.is_null());
        assert_eq!(knot_catalog_len(catalog), 13);

        let entry = knot_catalog_entry(catalog, 0);
        let e = unsafe { &*entry };
        assert_eq!(read_c(e.name), "Nudo Ahorcado");
        assert_eq!(e.difficulty, FfiDifficulty::Intermediate);
        assert_eq!(read_c(e.difficulty_label), "Intermedia");
        assert_eq!(e.uses_len, 4);
        let uses = unsafe { std::slice::from_raw_parts(e.uses, e.uses_len as usize) };
        assert_eq!(read_c(uses[2]), "Construcción de hamacas");
        knot_free_catalog_entry(entry);

        assert!(knot_catalog_entry(catalog, 13).is_null());
        knot_catalog_free(catalog);
    }

    #[test]
    fn catalog_find_by_predicted_class() {
        let catalog = knot_catalog_new();
        let name = CString::new("Nudo de Doble Lazo").unwrap();
        let entry = knot_catalog_find(catalog, name.as_ptr());
        assert!(!entry.is_null());
        assert_eq!(unsafe { &*entry }.difficulty, FfiDifficulty::Hard);
        knot_free_catalog_entry(entry);

        let missing = CString::new("Nudo Inventado").unwrap();
        assert!(knot_catalog_find(catalog, missing.as_ptr()).is_null());
        knot_catalog_free(catalog);
    }

    #[test]
    fn catalog_null_handles() {
        assert_eq!(knot_catalog_len(std::ptr::null()), 0);
        assert!(knot_catalog_entry(std::ptr::null(), 0).is_null());
        knot_catalog_free(std::ptr::null_mut());
    }

    #[test]
    fn free_functions_accept_null() {
        knot_free_request(std::ptr::null_mut());
        knot_free_result(std::ptr::null_mut());
        knot_free_catalog_entry(std::ptr::null_mut());
        knot_free_string(std::ptr::null_mut());
    }
}
