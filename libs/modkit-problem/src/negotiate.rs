//! Accept-header content negotiation.
//!
//! Accepted media types are matched against shell-style patterns in the
//! order the client listed them; the first entry matching the JSON or XML
//! pattern decides. Quality weights are not considered.

use glob::{MatchOptions, Pattern};
use http::HeaderMap;
use http::header::ACCEPT;

/// Default pattern selecting a JSON representation.
pub const JSON_MEDIA_PATTERN: &str = "*/*json";
/// Default pattern selecting an XML representation.
pub const XML_MEDIA_PATTERN: &str = "*/*xml";

/// `*` never crosses the `/` between type and subtype.
const MEDIA_MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Representation chosen for an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
    Text,
}

impl Format {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Text => "text",
        }
    }
}

/// Compiled media type patterns.
#[derive(Debug, Clone)]
pub struct Negotiator {
    json: Option<Pattern>,
    xml: Option<Pattern>,
}

impl Default for Negotiator {
    fn default() -> Self {
        Self::new(JSON_MEDIA_PATTERN, XML_MEDIA_PATTERN)
    }
}

impl Negotiator {
    /// Compiles the JSON and XML patterns. A pattern that fails to compile
    /// is logged and dropped, so its format is never selected.
    #[must_use]
    pub fn new(json_pattern: &str, xml_pattern: &str) -> Self {
        Self {
            json: compile(json_pattern),
            xml: compile(xml_pattern),
        }
    }

    /// Picks the representation for a request with the given headers.
    #[must_use]
    pub fn negotiate(&self, request_headers: &HeaderMap) -> Format {
        accepted_media_types(request_headers)
            .find_map(|media_type| self.match_media_type(media_type))
            .unwrap_or(Format::Text)
    }

    fn match_media_type(&self, media_type: &str) -> Option<Format> {
        if matches(self.json.as_ref(), media_type) {
            Some(Format::Json)
        } else if matches(self.xml.as_ref(), media_type) {
            Some(Format::Xml)
        } else {
            None
        }
    }
}

fn matches(pattern: Option<&Pattern>, media_type: &str) -> bool {
    pattern.is_some_and(|p| p.matches_with(media_type, MEDIA_MATCH))
}

fn compile(pattern: &str) -> Option<Pattern> {
    match Pattern::new(pattern) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid media type pattern; ignoring");
            None
        }
    }
}

/// Media types from every `Accept` header, in the order sent, with
/// parameters stripped.
pub fn accepted_media_types(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|entry| entry.split_once(';').map_or(entry, |(media_type, _)| media_type).trim())
        .filter(|media_type| !media_type.is_empty())
}
