//! Errors produced while encoding or decoding problem details.

/// Failure to decode a problem details document.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The input does not start with `{` or `<` after leading whitespace.
    #[error("invalid problem details encoding")]
    InvalidEncoding,
    #[error("invalid problem details JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid problem details XML: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// Failure to encode a problem details body.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("failed to encode problem details as JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A member name that cannot be written as an XML element.
    #[error("member name `{0}` is not a valid XML element name")]
    InvalidName(String),
    #[error("failed to write problem details: {0}")]
    Io(#[from] std::io::Error),
}
