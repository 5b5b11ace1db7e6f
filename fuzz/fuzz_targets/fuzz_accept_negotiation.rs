#![no_main]

use http::header::ACCEPT;
use http::{HeaderMap, HeaderValue};
use libfuzzer_sys::fuzz_target;
use modkit_problem::{ResponseRecorder, Status, serve_error};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = HeaderValue::from_bytes(data) else {
        return;
    };
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, value);

    let mut w = ResponseRecorder::new();
    serve_error(&mut w, &headers, Some(&Status::BAD_REQUEST));
    assert_eq!(w.status(), 400);
});
