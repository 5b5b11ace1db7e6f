//! Status code inference over a chain of wrapped errors.

use std::iter::FusedIterator;

use crate::http_error::HttpError;

/// Default bound on how many errors of a cause chain are inspected.
pub const DEFAULT_MAX_CAUSE_DEPTH: usize = 32;

const OK: u16 = 200;
const INTERNAL_SERVER_ERROR: u16 = 500;
const SERVICE_UNAVAILABLE: u16 = 503;
const GATEWAY_TIMEOUT: u16 = 504;

/// Iterator over an error and its causes, outermost first.
#[derive(Clone)]
pub struct Chain<'a> {
    next: Option<&'a dyn HttpError>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a dyn HttpError;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.unwrap_cause();
        Some(current)
    }
}

impl FusedIterator for Chain<'_> {}

/// Walks `err` and everything it wraps.
///
/// The iterator is unbounded; combine it with `take` when the chain may be
/// cyclic.
#[must_use]
pub fn chain(err: &dyn HttpError) -> Chain<'_> {
    Chain { next: Some(err) }
}

/// Reports the HTTP status code for `err`, inspecting at most
/// [`DEFAULT_MAX_CAUSE_DEPTH`] errors of its chain. See [`resolve`].
#[must_use]
pub fn status_code(err: Option<&dyn HttpError>) -> u16 {
    resolve(err, DEFAULT_MAX_CAUSE_DEPTH)
}

/// Reports the HTTP status code associated with `err`.
///
/// Each error in the chain is checked in turn: an explicit status code wins
/// immediately, otherwise a timeout yields 504 and a transient error 503.
/// When nothing in the chain matches the result is 500; an absent error is
/// 200. Codes outside 100..=599 reported by an error are passed through.
///
/// At most `max_depth` errors are inspected; a longer (or cyclic) chain
/// resolves to 500.
#[must_use]
pub fn resolve(err: Option<&dyn HttpError>, max_depth: usize) -> u16 {
    let Some(err) = err else {
        return OK;
    };

    let mut walked = chain(err);
    for node in walked.by_ref().take(max_depth) {
        if let Some(status) = node.status_code() {
            return status;
        }
        if node.is_timeout() {
            return GATEWAY_TIMEOUT;
        }
        if node.is_temporary() {
            return SERVICE_UNAVAILABLE;
        }
    }

    if walked.next().is_some() {
        tracing::warn!(
            max_depth,
            error = %err,
            "error cause chain exceeds max depth; giving up status inference"
        );
    }

    INTERNAL_SERVER_ERROR
}
