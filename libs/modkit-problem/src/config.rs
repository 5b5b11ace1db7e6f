//! Configuration for problem rendering.

use serde::Deserialize;

use crate::inference::DEFAULT_MAX_CAUSE_DEPTH;
use crate::negotiate::{JSON_MEDIA_PATTERN, XML_MEDIA_PATTERN};

/// Configuration for [`Renderer`](crate::Renderer).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RendererConfig {
    /// Maximum number of errors of a cause chain inspected while inferring
    /// the status code. Longer chains resolve to 500.
    /// Default: `32`
    pub max_cause_depth: usize,

    /// Accept entry pattern selecting the JSON representation.
    /// Default: `"*/*json"`
    pub json_media_pattern: String,

    /// Accept entry pattern selecting the XML representation.
    /// Default: `"*/*xml"`
    pub xml_media_pattern: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_cause_depth: DEFAULT_MAX_CAUSE_DEPTH,
            json_media_pattern: JSON_MEDIA_PATTERN.to_owned(),
            xml_media_pattern: XML_MEDIA_PATTERN.to_owned(),
        }
    }
}
