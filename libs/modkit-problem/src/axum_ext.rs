//! Axum integration: render errors as negotiated problem responses.

use axum::body::Body;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::http_error::HttpError;
use crate::render::default_renderer;
use crate::status::Status;
use crate::writer::ResponseRecorder;

/// An error paired with the headers of the request it answers.
///
/// ```ignore
/// async fn get_user(headers: HeaderMap, Path(id): Path<u64>) -> Result<Json<User>, ProblemResponse> {
///     let user = repo.find(id).map_err(|e| ProblemResponse::new(&headers, e))?;
///     Ok(Json(user))
/// }
/// ```
#[derive(Debug)]
pub struct ProblemResponse {
    request_headers: HeaderMap,
    error: Option<Box<dyn HttpError>>,
}

impl ProblemResponse {
    #[must_use]
    pub fn new<E: HttpError + 'static>(request_headers: &HeaderMap, err: E) -> Self {
        Self::from_boxed(request_headers, Some(Box::new(err)))
    }

    #[must_use]
    pub fn from_boxed(request_headers: &HeaderMap, err: Option<Box<dyn HttpError>>) -> Self {
        Self {
            request_headers: request_headers.clone(),
            error: err,
        }
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut recorder = ResponseRecorder::new();
        default_renderer().render(&mut recorder, &self.request_headers, self.error.as_deref());
        recorder.into_response().map(Body::from)
    }
}

/// Fallback handler replying 404 Not Found.
#[allow(clippy::unused_async, clippy::needless_pass_by_value)] // axum handler signature
pub async fn not_found(headers: HeaderMap) -> Response {
    ProblemResponse::new(&headers, Status::NOT_FOUND).into_response()
}

/// Fallback handler replying 405 Method Not Allowed.
#[allow(clippy::unused_async, clippy::needless_pass_by_value)] // axum handler signature
pub async fn method_not_allowed(headers: HeaderMap) -> Response {
    ProblemResponse::new(&headers, Status::METHOD_NOT_ALLOWED).into_response()
}
