//! The `HttpError` capability trait and the basic error values built on it.
//!
//! An error taking part in problem rendering only has to carry a message
//! (`Display`). Everything else is an optional capability expressed as a
//! provided method with a neutral default; a type opts in by overriding it.

use std::borrow::Cow;
use std::fmt;
use std::io;

use http::HeaderMap;
use serde_json::{Map, Value};

use crate::error::EncodeError;
use crate::status::status_text;
use crate::writer::ResponseWriter;

/// An error that can be rendered as an HTTP problem.
pub trait HttpError: std::error::Error + Send + Sync {
    /// Explicit HTTP status for this error. Takes precedence over every
    /// other signal in the cause chain.
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// Whether the error is a timeout (rendered as 504).
    fn is_timeout(&self) -> bool {
        false
    }

    /// Whether the error is transient (rendered as 503).
    fn is_temporary(&self) -> bool {
        false
    }

    /// The error this one wraps, if any.
    fn unwrap_cause(&self) -> Option<&dyn HttpError> {
        None
    }

    /// Errors that know how to write their own response return a responder
    /// here; content negotiation is then skipped entirely.
    fn responder(&self) -> Option<&dyn Respond> {
        None
    }

    /// Problem members of this error in rendering order.
    ///
    /// `status` is the resolved status code for the response.
    ///
    /// # Errors
    /// Returns `EncodeError` if extension members cannot be serialized.
    fn problem_members(&self, status: u16) -> Result<Map<String, Value>, EncodeError> {
        let mut members = Map::new();
        members.insert("detail".to_owned(), Value::String(self.to_string()));
        members.insert("status".to_owned(), Value::from(status));
        members.insert(
            "title".to_owned(),
            Value::String(status_text(status).to_owned()),
        );
        Ok(members)
    }

    /// JSON body for this error, without a trailing newline.
    ///
    /// # Errors
    /// Returns `EncodeError` if the members cannot be serialized.
    fn encode_json(&self, status: u16) -> Result<Cow<'static, [u8]>, EncodeError> {
        let members = self.problem_members(status)?;
        Ok(Cow::Owned(serde_json::to_vec(&members)?))
    }

    /// XML `problem` element for this error, without the XML declaration.
    ///
    /// # Errors
    /// Returns `EncodeError` if the members cannot be serialized.
    fn encode_xml(&self, status: u16) -> Result<Vec<u8>, EncodeError> {
        let members = self.problem_members(status)?;
        crate::xml::encode_problem(&members)
    }
}

/// Full control over the response for an error.
pub trait Respond {
    /// Writes the complete response for this error to `w`.
    fn respond(&self, w: &mut dyn ResponseWriter, request_headers: &HeaderMap);
}

impl HttpError for io::Error {
    fn is_timeout(&self) -> bool {
        self.kind() == io::ErrorKind::TimedOut
    }

    fn is_temporary(&self) -> bool {
        matches!(
            self.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
        )
    }
}

/// A plain error message with no capabilities of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(Cow<'static, str>);

impl Message {
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

impl HttpError for Message {}

/// An error associated with an explicit HTTP status code.
///
/// The message is the wrapped error's message; the wrapped error stays
/// reachable through [`HttpError::unwrap_cause`] and `source()`.
#[derive(Debug)]
pub struct StatusError {
    status: u16,
    source: Box<dyn HttpError>,
}

impl StatusError {
    #[must_use]
    pub fn new<E: HttpError + 'static>(status: u16, err: E) -> Self {
        Self::from_boxed(status, Box::new(err))
    }

    #[must_use]
    pub fn from_boxed(status: u16, source: Box<dyn HttpError>) -> Self {
        Self { status, source }
    }

    /// Shorthand for a status code paired with a plain message.
    #[must_use]
    pub fn msg(status: u16, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(status, Message::new(message))
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn into_inner(self) -> Box<dyn HttpError> {
        self.source
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl std::error::Error for StatusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source: &(dyn std::error::Error + 'static) = &*self.source;
        Some(source)
    }
}

impl HttpError for StatusError {
    fn status_code(&self) -> Option<u16> {
        Some(self.status)
    }

    fn unwrap_cause(&self) -> Option<&dyn HttpError> {
        Some(self.source.as_ref())
    }
}

/// Associates an error with a status code.
#[must_use]
pub fn wrap<E: HttpError + 'static>(status: u16, err: E) -> StatusError {
    StatusError::new(status, err)
}

/// Builds a [`StatusError`] from a status code and a format string.
///
/// ```
/// use modkit_problem::status_error;
///
/// let err = status_error!(404, "user {} not found", 42);
/// assert_eq!(err.to_string(), "user 42 not found");
/// ```
#[macro_export]
macro_rules! status_error {
    ($status:expr, $($arg:tt)+) => {
        $crate::StatusError::msg($status, ::std::format!($($arg)+))
    };
}
