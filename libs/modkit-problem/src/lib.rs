//! RFC 7807 problem details for HTTP error responses.
//!
//! This crate turns arbitrary errors into HTTP responses with as little
//! boilerplate as possible:
//! - status code inference over a chain of wrapped errors (`status_code`)
//! - JSON, XML or plain text rendering negotiated from the `Accept` header
//!   (`serve_error`, `Renderer`)
//! - an extensible problem details record (`DetailsError`, `Details`)
//! - sentinel errors for every registered HTTP status (`Status`)
//!
//! ```
//! use http::HeaderMap;
//! use modkit_problem::{ResponseRecorder, Status, serve_error};
//!
//! let mut w = ResponseRecorder::new();
//! serve_error(&mut w, &HeaderMap::new(), Some(&Status::BAD_REQUEST));
//! assert_eq!(w.status(), 400);
//! assert_eq!(w.body_string(), "Bad Request\n");
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod details;
pub mod error;
pub mod http_error;
pub mod inference;
pub mod negotiate;
mod node;
pub mod render;
pub mod status;
pub mod writer;
pub mod xml;

#[cfg(feature = "axum")]
pub mod axum_ext;

// Re-export commonly used types
pub use config::RendererConfig;
pub use details::{ABOUT_BLANK, Details, DetailsError, marshal_json, marshal_xml, unmarshal};
pub use error::{DecodeError, EncodeError};
pub use http_error::{HttpError, Message, Respond, StatusError, wrap};
pub use inference::{DEFAULT_MAX_CAUSE_DEPTH, chain, resolve, status_code};
pub use negotiate::{Format, Negotiator};
pub use render::{
    APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, Renderer, default_renderer,
    method_not_allowed, not_found, serve_error,
};
pub use status::{Status, status_text};
pub use writer::{ResponseRecorder, ResponseWriter};
pub use xml::{PROBLEM_NAMESPACE, XML_HEADER};

#[cfg(feature = "axum")]
pub use axum_ext::ProblemResponse;
