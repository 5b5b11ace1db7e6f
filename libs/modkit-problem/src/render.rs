//! Content-negotiated rendering of errors as HTTP responses.

use std::sync::LazyLock;

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, HeaderValue};

use crate::config::RendererConfig;
use crate::http_error::HttpError;
use crate::inference::resolve;
use crate::negotiate::{Format, Negotiator};
use crate::status::Status;
use crate::writer::ResponseWriter;
use crate::xml::XML_HEADER;

/// Content type of JSON problem bodies.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json; charset=utf-8";
/// Content type of XML problem bodies.
pub const APPLICATION_PROBLEM_XML: &str = "application/problem+xml; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const NOSNIFF: &str = "nosniff";

static DEFAULT_RENDERER: LazyLock<Renderer> = LazyLock::new(Renderer::default);

/// Renders errors as problem details in the representation the client asked for.
#[derive(Debug, Clone)]
pub struct Renderer {
    max_cause_depth: usize,
    negotiator: Negotiator,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&RendererConfig::default())
    }
}

impl Renderer {
    #[must_use]
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            max_cause_depth: config.max_cause_depth,
            negotiator: Negotiator::new(&config.json_media_pattern, &config.xml_media_pattern),
        }
    }

    /// Status code for `err` under this renderer's chain depth bound.
    #[must_use]
    pub fn status_code(&self, err: Option<&dyn HttpError>) -> u16 {
        resolve(err, self.max_cause_depth)
    }

    /// Representation that would be chosen for these request headers.
    #[must_use]
    pub fn negotiate(&self, request_headers: &HeaderMap) -> Format {
        self.negotiator.negotiate(request_headers)
    }

    /// Replies to a request by rendering `err`.
    ///
    /// An absent error renders as 200 OK. Errors providing a responder write
    /// the whole response themselves. Otherwise the error is rendered as
    /// JSON, XML or plain text depending on the request's `Accept` header.
    ///
    /// Exactly one status line is written. Body encoding failures after that
    /// point are logged and otherwise ignored.
    pub fn render(
        &self,
        w: &mut dyn ResponseWriter,
        request_headers: &HeaderMap,
        err: Option<&dyn HttpError>,
    ) {
        let err: &dyn HttpError = err.unwrap_or(&Status::OK);

        if let Some(responder) = err.responder() {
            tracing::debug!(error = %err, "error provides its own response");
            responder.respond(w, request_headers);
            return;
        }

        let status = self.status_code(Some(err));
        let format = self.negotiator.negotiate(request_headers);
        tracing::debug!(status, format = format.as_str(), "rendering error response");

        match format {
            Format::Json => serve_json(w, err, status),
            Format::Xml => serve_xml(w, err, status),
            Format::Text => serve_text(w, err, status),
        }
    }
}

fn set_content_type(w: &mut dyn ResponseWriter, content_type: &'static str) {
    let headers = w.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF));
}

fn serve_json(w: &mut dyn ResponseWriter, err: &dyn HttpError, status: u16) {
    set_content_type(w, APPLICATION_PROBLEM_JSON);
    w.write_head(status);

    let body = match err.encode_json(status) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(status, error = %e, "failed to encode JSON problem body");
            return;
        }
    };
    if let Err(e) = w
        .write_body(&body)
        .and_then(|()| w.write_body(b"\n"))
    {
        tracing::warn!(status, error = %e, "failed to write JSON problem body");
    }
}

fn serve_xml(w: &mut dyn ResponseWriter, err: &dyn HttpError, status: u16) {
    set_content_type(w, APPLICATION_PROBLEM_XML);
    w.write_head(status);

    let body = match err.encode_xml(status) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(status, error = %e, "failed to encode XML problem body");
            return;
        }
    };
    if let Err(e) = w
        .write_body(XML_HEADER.as_bytes())
        .and_then(|()| w.write_body(&body))
    {
        tracing::warn!(status, error = %e, "failed to write XML problem body");
    }
}

fn serve_text(w: &mut dyn ResponseWriter, err: &dyn HttpError, status: u16) {
    w.headers_mut().remove(CONTENT_LENGTH);
    set_content_type(w, TEXT_PLAIN);
    w.write_head(status);

    let mut body = err.to_string();
    body.push('\n');
    if let Err(e) = w.write_body(body.as_bytes()) {
        tracing::warn!(status, error = %e, "failed to write plain text error body");
    }
}

/// Process-wide renderer built from the default configuration.
#[must_use]
pub fn default_renderer() -> &'static Renderer {
    &DEFAULT_RENDERER
}

/// Renders `err` with the default renderer. See [`Renderer::render`].
pub fn serve_error(w: &mut dyn ResponseWriter, request_headers: &HeaderMap, err: Option<&dyn HttpError>) {
    DEFAULT_RENDERER.render(w, request_headers, err);
}

/// Replies with 404 Not Found.
pub fn not_found(w: &mut dyn ResponseWriter, request_headers: &HeaderMap) {
    serve_error(w, request_headers, Some(&Status::NOT_FOUND));
}

/// Replies with 405 Method Not Allowed.
pub fn method_not_allowed(w: &mut dyn ResponseWriter, request_headers: &HeaderMap) {
    serve_error(w, request_headers, Some(&Status::METHOD_NOT_ALLOWED));
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::details::{Details, DetailsError};
    use crate::error::EncodeError;
    use crate::http_error::{Message, Respond, wrap};
    use crate::writer::ResponseRecorder;
    use http::header::ACCEPT;
    use std::borrow::Cow;
    use std::fmt;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[derive(Debug)]
    struct Unencodable;

    impl fmt::Display for Unencodable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("unencodable")
        }
    }

    impl std::error::Error for Unencodable {}

    impl HttpError for Unencodable {
        fn status_code(&self) -> Option<u16> {
            Some(422)
        }

        fn encode_json(&self, _status: u16) -> Result<Cow<'static, [u8]>, EncodeError> {
            Err(EncodeError::Io(std::io::Error::other("encoder broke")))
        }
    }

    #[derive(Debug)]
    struct Teapot;

    impl fmt::Display for Teapot {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("teapot")
        }
    }

    impl std::error::Error for Teapot {}

    impl HttpError for Teapot {
        fn responder(&self) -> Option<&dyn Respond> {
            Some(self)
        }
    }

    impl Respond for Teapot {
        fn respond(&self, w: &mut dyn ResponseWriter, _request_headers: &HeaderMap) {
            w.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/x-teapot"));
            w.write_head(418);
            w.write_body(b"short and stout").unwrap();
        }
    }

    #[test]
    fn json_rendering_sets_headers() {
        let mut rec = ResponseRecorder::new();
        serve_error(&mut rec, &accept("application/json"), Some(&Status::BAD_REQUEST));
        assert_eq!(rec.status(), 400);
        assert_eq!(rec.header("content-type"), Some(APPLICATION_PROBLEM_JSON));
        assert_eq!(rec.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(
            rec.body_string(),
            "{\"detail\":\"Bad Request\",\"status\":400,\"title\":\"Bad Request\"}\n"
        );
    }

    #[test]
    fn xml_rendering_writes_declaration() {
        let mut rec = ResponseRecorder::new();
        serve_error(&mut rec, &accept("text/xml"), Some(&wrap(409, Message::new("taken"))));
        assert_eq!(rec.status(), 409);
        assert_eq!(rec.header("content-type"), Some(APPLICATION_PROBLEM_XML));
        assert_eq!(
            rec.body_string(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <problem xmlns=\"urn:ietf:rfc:7807\"><detail>taken</detail><status>409</status><title>Conflict</title></problem>"
        );
    }

    #[test]
    fn text_fallback() {
        let mut rec = ResponseRecorder::new();
        rec.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("99"));
        serve_error(&mut rec, &HeaderMap::new(), Some(&Message::new("plain failure")));
        assert_eq!(rec.status(), 500);
        assert_eq!(rec.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(rec.header("content-length"), None);
        assert_eq!(rec.body_string(), "plain failure\n");
    }

    #[test]
    fn absent_error_is_ok() {
        let mut rec = ResponseRecorder::new();
        serve_error(&mut rec, &HeaderMap::new(), None);
        assert_eq!(rec.status(), 200);
        assert_eq!(rec.body_string(), "OK\n");
    }

    #[test]
    fn responder_bypasses_negotiation() {
        let mut rec = ResponseRecorder::new();
        serve_error(&mut rec, &accept("application/json"), Some(&Teapot));
        assert_eq!(rec.status(), 418);
        assert_eq!(rec.header("content-type"), Some("text/x-teapot"));
        assert_eq!(rec.body_string(), "short and stout");
    }

    #[test]
    fn encode_failure_keeps_status_line() {
        let mut rec = ResponseRecorder::new();
        serve_error(&mut rec, &accept("application/json"), Some(&Unencodable));
        assert!(rec.is_committed());
        assert_eq!(rec.status(), 422);
        assert!(rec.body().is_empty());
    }

    #[test]
    fn invalid_xml_member_name_leaves_body_empty() {
        let details = Details::new(
            DetailsError::from_error(Status::BAD_REQUEST),
            serde_json::json!({"trace id": "abc"}),
        );
        let mut rec = ResponseRecorder::new();
        serve_error(&mut rec, &accept("application/xml"), Some(&details));
        assert_eq!(rec.status(), 400);
        assert_eq!(rec.header("content-type"), Some(APPLICATION_PROBLEM_XML));
        assert!(rec.body().is_empty());

        // JSON has no naming restriction.
        let mut rec = ResponseRecorder::new();
        serve_error(&mut rec, &accept("application/json"), Some(&details));
        assert!(rec.body_string().contains("\"trace id\":\"abc\""));
    }

    #[test]
    fn shortcuts() {
        let mut rec = ResponseRecorder::new();
        not_found(&mut rec, &HeaderMap::new());
        assert_eq!(rec.status(), 404);
        assert_eq!(rec.body_string(), "Not Found\n");

        let mut rec = ResponseRecorder::new();
        method_not_allowed(&mut rec, &accept("application/json"));
        assert_eq!(rec.status(), 405);
        assert_eq!(
            rec.body_string(),
            "{\"detail\":\"Method Not Allowed\",\"status\":405,\"title\":\"Method Not Allowed\"}\n"
        );
    }

    #[test]
    fn configured_patterns_drive_negotiation() {
        let renderer = Renderer::new(&RendererConfig {
            json_media_pattern: "application/vnd.*".to_owned(),
            ..RendererConfig::default()
        });
        assert_eq!(renderer.negotiate(&accept("application/json")), Format::Text);
        assert_eq!(renderer.negotiate(&accept("application/vnd.api")), Format::Json);
    }
}
