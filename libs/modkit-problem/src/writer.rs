//! Output sink abstraction and an in-memory recorder.

use std::io;

use http::{HeaderMap, Response, StatusCode};

/// Response sink the renderer writes to.
///
/// Headers must be set before `write_head`; the first status line is the
/// one the client sees.
pub trait ResponseWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commits the status line and the headers set so far.
    fn write_head(&mut self, status: u16);

    /// Appends to the response body.
    ///
    /// # Errors
    /// Returns an I/O error if the underlying transport rejects the write.
    fn write_body(&mut self, buf: &[u8]) -> io::Result<()>;
}

/// In-memory [`ResponseWriter`] that keeps the status, headers and body.
#[derive(Debug, Default, Clone)]
pub struct ResponseRecorder {
    status: Option<u16>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed status, or 200 if nothing was committed yet.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.unwrap_or(200)
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Converts the recording into an `http::Response`.
    ///
    /// Codes `http` cannot represent are sent as 500.
    #[must_use]
    pub fn into_response(self) -> Response<Vec<u8>> {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Response::new(self.body);
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: u16) {
        if let Some(committed) = self.status {
            tracing::warn!(
                committed,
                ignored = status,
                "superfluous write_head call; status line already written"
            );
            return;
        }
        self.status = Some(status);
    }

    fn write_body(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.status.is_none() {
            self.status = Some(200);
        }
        self.body.extend_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;

    #[test]
    fn first_status_line_wins() {
        let mut rec = ResponseRecorder::new();
        rec.write_head(404);
        rec.write_head(500);
        assert_eq!(rec.status(), 404);
    }

    #[test]
    fn body_write_implies_ok() {
        let mut rec = ResponseRecorder::new();
        rec.write_body(b"hello").unwrap();
        rec.write_head(500);
        assert_eq!(rec.status(), 200);
        assert_eq!(rec.body_string(), "hello");
    }

    #[test]
    fn into_response_keeps_headers_and_body() {
        let mut rec = ResponseRecorder::new();
        rec.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        rec.write_head(418);
        rec.write_body(b"short and stout").unwrap();

        let resp = rec.into_response();
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(resp.body(), b"short and stout");
    }

    #[test]
    fn unrepresentable_status_becomes_internal_error() {
        let mut rec = ResponseRecorder::new();
        rec.write_head(42);
        assert_eq!(rec.status(), 42);
        assert_eq!(
            rec.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
