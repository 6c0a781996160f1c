//! Drive the C surface against the live mock server.
//!
//! # Design
//! Plays the role of a native host: the host-does-IO path builds the request
//! through `knot_build_classify`, sends it with ureq, and hands the response
//! back to `knot_parse_classify`. The blocking calls are checked against the
//! same server.

use std::ffi::{CStr, CString};
use std::io::Write;
use std::net::SocketAddr;
use std::os::raw::c_char;

use knot_ffi::types::{FfiDataTag, FfiErrorCode, FfiHttpMethod, FfiHttpRequest, FfiHttpResponse, FfiPrediction};
use knot_ffi::*;

fn start_mock_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn read_c(s: *const c_char) -> String {
    unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_string()
}

/// Send an `FfiHttpRequest` with ureq and return the status and body.
///
/// 4xx/5xx responses are returned as data so the library interprets them.
fn execute(req: &FfiHttpRequest) -> (u16, String) {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let url = read_c(req.url);
    let headers = unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) };
    let body = unsafe { std::slice::from_raw_parts(req.body, req.body_len as usize) };

    let mut response = match req.method {
        FfiHttpMethod::Get => agent.get(&url).call(),
        FfiHttpMethod::Post => {
            let mut builder = agent.post(&url);
            for header in headers {
                let key = read_c(header.key);
                if key.eq_ignore_ascii_case("content-length") {
                    continue;
                }
                builder = builder.header(key, read_c(header.value));
            }
            builder.send(body)
        }
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    (status, body)
}

fn image_file(prefix: &str, suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(contents).unwrap();
    file
}

fn c_path(file: &tempfile::NamedTempFile) -> CString {
    CString::new(file.path().to_str().unwrap()).unwrap()
}

#[test]
fn host_does_io_round_trip() {
    let addr = start_mock_server();
    let url = CString::new(format!("http://{addr}")).unwrap();
    let classifier = knot_classifier_new(url.as_ptr());
    assert!(!classifier.is_null());

    // Step 1: build the upload.
    let file = image_file("knot-", ".jpg", b"\xff\xd8 rope \xff\xd9");
    let path = c_path(&file);
    let mut code = FfiErrorCode::Panic;
    let req = knot_build_classify(classifier, path.as_ptr(), &mut code);
    assert_eq!(code, FfiErrorCode::Ok);
    assert!(!req.is_null());

    // Step 2: the host sends it.
    let (status, body) = execute(unsafe { &*req });
    knot_free_request(req);
    assert_eq!(status, 200);

    // Step 3: hand the response back for parsing.
    let body = CString::new(body).unwrap();
    let response = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    let result = knot_parse_classify(classifier, &response);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    assert_eq!(r.data_tag, FfiDataTag::Prediction);
    let prediction = unsafe { &*(r.data as *const FfiPrediction) };
    let class = read_c(prediction.knot_class);
    assert!(mock_server::CLASSES.contains(&class.as_str()), "{class}");

    // Step 4: the predicted class resolves in the catalog.
    let catalog = knot_catalog_new();
    let name = CString::new(class).unwrap();
    let entry = knot_catalog_find(catalog, name.as_ptr());
    assert!(!entry.is_null());
    knot_free_catalog_entry(entry);
    knot_catalog_free(catalog);

    knot_free_result(result);
    knot_classifier_free(classifier);
}

#[test]
fn host_does_io_server_failure() {
    let addr = start_mock_server();
    let url = CString::new(format!("http://{addr}")).unwrap();
    let classifier = knot_classifier_new(url.as_ptr());

    let file = image_file("fail-", ".png", b"png bytes");
    let path = c_path(&file);
    let req = knot_build_classify(classifier, path.as_ptr(), std::ptr::null_mut());
    let (status, body) = execute(unsafe { &*req });
    knot_free_request(req);

    let body = CString::new(body).unwrap();
    let response = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    let result = knot_parse_classify(classifier, &response);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::ServerError);
    assert_eq!(r.http_status, 500);
    assert_eq!(read_c(r.error_message), "server error: internal error");
    knot_free_result(result);
    knot_classifier_free(classifier);
}

#[test]
fn blocking_calls_against_mock_server() {
    let addr = start_mock_server();
    let url = CString::new(format!("http://{addr}")).unwrap();
    let classifier = knot_classifier_new(url.as_ptr());

    let result = knot_check_availability(classifier);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    assert_eq!(r.data_tag, FfiDataTag::None);
    assert!(r.data.is_null());
    knot_free_result(result);

    let file = image_file("knot-", ".webp", b"RIFF....WEBP");
    let path = c_path(&file);
    let result = knot_classify(classifier, path.as_ptr());
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    let prediction = unsafe { &*(r.data as *const FfiPrediction) };
    assert!((0.0..=1.0).contains(&prediction.probability));
    knot_free_result(result);

    let empty = image_file("empty-", ".jpg", b"");
    let path = c_path(&empty);
    let result = knot_classify(classifier, path.as_ptr());
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::BadRequest);
    assert_eq!(r.http_status, 400);
    knot_free_result(result);

    knot_classifier_free(classifier);
}

#[test]
fn blocking_calls_report_connection_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = CString::new(format!("http://{addr}")).unwrap();
    let classifier = knot_classifier_new(url.as_ptr());

    let result = knot_check_availability(classifier);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::ConnectionFailed);
    assert!(read_c(r.guidance).contains("down"));
    knot_free_result(result);

    knot_classifier_free(classifier);
}
