//! RFC 7807 problem details record.
//!
//! See: <https://datatracker.ietf.org/doc/html/rfc7807>

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::error::{DecodeError, EncodeError};
use crate::http_error::HttpError;
use crate::inference::status_code;
use crate::node::Node;
use crate::status::status_text;
use crate::xml::XML_HEADER;

/// Members owned by [`DetailsError`]; everything else belongs to an extension.
const BASE_MEMBERS: [&str; 5] = ["detail", "instance", "status", "title", "type"];

/// Problem type assumed when `type` is absent.
pub const ABOUT_BLANK: &str = "about:blank";

/// RFC 7807 problem details, usable as an error in its own right.
///
/// Extra members are added by composing it into [`Details`]:
///
/// ```
/// use modkit_problem::{Details, DetailsError, Status};
///
/// #[derive(Debug, serde::Serialize)]
/// struct Trace {
///     trace_id: String,
/// }
///
/// let problem = Details::new(
///     DetailsError::from_error(Status::NOT_FOUND),
///     Trace { trace_id: "abc".to_owned() },
/// );
/// # let _ = problem;
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[cfg_attr(
    feature = "utoipa",
    schema(
        title = "Problem",
        description = "RFC 7807 Problem Details for HTTP APIs"
    )
)]
#[serde(rename = "problem")]
#[must_use]
pub struct DetailsError {
    /// A human-readable explanation specific to this occurrence of the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence of the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// The HTTP status code generated by the origin server for this
    /// occurrence of the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// A short, human-readable summary of the problem type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// A URI reference that identifies the problem type; `about:blank` when absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_url: Option<String>,

    #[serde(skip)]
    source: Option<Box<dyn HttpError>>,
}

impl DetailsError {
    /// Builds a record from `err`: detail is its message, status is the
    /// inferred status code and title its reason phrase. `err` stays
    /// reachable as the cause.
    pub fn from_error<E: HttpError + 'static>(err: E) -> Self {
        Self::from_boxed(Some(Box::new(err)))
    }

    /// Like [`DetailsError::from_error`]; an absent error yields a 200 OK record.
    pub fn from_boxed(err: Option<Box<dyn HttpError>>) -> Self {
        let status = status_code(err.as_deref());
        let detail = err
            .as_ref()
            .map(ToString::to_string)
            .filter(|d| !d.is_empty());
        let title = Some(status_text(status))
            .filter(|t| !t.is_empty())
            .map(str::to_owned);

        Self {
            detail,
            status: Some(status),
            title,
            source: err,
            ..Self::default()
        }
    }

    /// Parses a JSON or XML encoded record. See [`unmarshal`].
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidEncoding` if the input is neither JSON
    /// nor XML, or the decoder's error if it is malformed.
    pub fn unmarshal(data: &[u8]) -> Result<Self, DecodeError> {
        unmarshal(data)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = Some(uri.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = Some(type_url.into());
        self
    }

    /// The problem type, defaulting to `about:blank`.
    #[must_use]
    pub fn problem_type(&self) -> &str {
        self.type_url.as_deref().unwrap_or(ABOUT_BLANK)
    }
}

/// Records compare by their serialized members; causes are ignored.
impl PartialEq for DetailsError {
    fn eq(&self, other: &Self) -> bool {
        self.detail == other.detail
            && self.instance == other.instance
            && self.status == other.status
            && self.title == other.title
            && self.type_url == other.type_url
    }
}

impl fmt::Display for DetailsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.detail.as_deref().unwrap_or_default())
    }
}

impl std::error::Error for DetailsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source: &(dyn std::error::Error + 'static) = self.source.as_deref()?;
        Some(source)
    }
}

impl HttpError for DetailsError {
    fn status_code(&self) -> Option<u16> {
        self.status
    }

    fn unwrap_cause(&self) -> Option<&dyn HttpError> {
        self.source.as_deref()
    }

    fn problem_members(&self, status: u16) -> Result<Map<String, Value>, EncodeError> {
        let status = self.status.unwrap_or(status);
        let title = self
            .title
            .clone()
            .unwrap_or_else(|| status_text(status).to_owned());

        let mut members = Map::new();
        if let Some(detail) = &self.detail {
            members.insert("detail".to_owned(), Value::String(detail.clone()));
        }
        if let Some(instance) = &self.instance {
            members.insert("instance".to_owned(), Value::String(instance.clone()));
        }
        members.insert("status".to_owned(), Value::from(status));
        members.insert("title".to_owned(), Value::String(title));
        if let Some(type_url) = &self.type_url {
            members.insert("type".to_owned(), Value::String(type_url.clone()));
        }
        Ok(members)
    }
}

/// A [`DetailsError`] extended with application-specific members.
///
/// Renders as one flat object (or element): the base members first, then
/// the fields of `X` in declaration order. Base members take precedence
/// over extension fields of the same name. `X` must serialize to a map;
/// anything else contributes no members.
#[derive(Debug, Serialize)]
pub struct Details<X> {
    #[serde(flatten)]
    pub problem: DetailsError,
    #[serde(flatten)]
    pub extensions: X,
}

impl<X> Details<X> {
    #[must_use]
    pub fn new(problem: DetailsError, extensions: X) -> Self {
        Self {
            problem,
            extensions,
        }
    }
}

/// Splits the decoded members into the base record and the extension.
///
/// Members are buffered in a `Node` tree rather than through
/// `#[serde(flatten)]` so that XML text leaves can still be parsed into the
/// typed fields of both halves.
impl<'de, X: DeserializeOwned> Deserialize<'de> for Details<X> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Node::Map(members) = Node::deserialize(deserializer)? else {
            return Err(D::Error::custom("expected a problem details object"));
        };
        let (base, extensions): (Vec<_>, Vec<_>) = members
            .into_iter()
            .partition(|(name, _)| BASE_MEMBERS.contains(&name.as_str()));

        let problem = DetailsError::deserialize(Node::Map(base)).map_err(D::Error::custom)?;
        let extensions = X::deserialize(Node::Map(extensions)).map_err(D::Error::custom)?;
        Ok(Self {
            problem,
            extensions,
        })
    }
}

impl<X> fmt::Display for Details<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.problem, f)
    }
}

impl<X: fmt::Debug> std::error::Error for Details<X> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.problem)
    }
}

impl<X> HttpError for Details<X>
where
    X: Serialize + fmt::Debug + Send + Sync,
{
    fn status_code(&self) -> Option<u16> {
        self.problem.status_code()
    }

    fn unwrap_cause(&self) -> Option<&dyn HttpError> {
        self.problem.unwrap_cause()
    }

    fn problem_members(&self, status: u16) -> Result<Map<String, Value>, EncodeError> {
        let mut members = self.problem.problem_members(status)?;
        if let Value::Object(extensions) = serde_json::to_value(&self.extensions)? {
            for (name, value) in extensions {
                members.entry(name).or_insert(value);
            }
        }
        Ok(members)
    }
}

/// Parses a JSON or XML encoded problem.
///
/// Leading whitespace is skipped; `{` selects JSON and `<` selects XML.
/// Only the first byte is sniffed: malformed documents surface the
/// decoder's own error.
///
/// # Errors
/// Returns `DecodeError::InvalidEncoding` for empty input or any other
/// leading byte, `DecodeError::Json` / `DecodeError::Xml` if decoding fails.
pub fn unmarshal<T: DeserializeOwned>(data: &[u8]) -> Result<T, DecodeError> {
    let data = data.trim_ascii_start();
    match data.first() {
        Some(b'{') => Ok(serde_json::from_slice(data)?),
        Some(b'<') => Ok(quick_xml::de::from_reader(data)?),
        _ => Err(DecodeError::InvalidEncoding),
    }
}

/// JSON encoding of `err` as it would be rendered, without trailing newline.
///
/// # Errors
/// Returns `EncodeError` if the members cannot be serialized.
pub fn marshal_json(err: &dyn HttpError) -> Result<Vec<u8>, EncodeError> {
    let status = status_code(Some(err));
    Ok(err.encode_json(status)?.into_owned())
}

/// XML document for `err` as it would be rendered, declaration included.
///
/// # Errors
/// Returns `EncodeError` if the members cannot be serialized.
pub fn marshal_xml(err: &dyn HttpError) -> Result<Vec<u8>, EncodeError> {
    let status = status_code(Some(err));
    let mut doc = XML_HEADER.as_bytes().to_vec();
    doc.extend(err.encode_xml(status)?);
    Ok(doc)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::http_error::{Message, wrap};
    use crate::status::Status;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TraceId {
        id: String,
    }

    fn traced() -> Details<TraceId> {
        Details::new(
            DetailsError::from_error(wrap(400, Message::new("error"))),
            TraceId {
                id: "myid".to_owned(),
            },
        )
    }

    #[test]
    fn from_error_derives_fields() {
        let details = DetailsError::from_error(wrap(400, Message::new("error")));
        assert_eq!(details.detail.as_deref(), Some("error"));
        assert_eq!(details.status, Some(400));
        assert_eq!(details.title.as_deref(), Some("Bad Request"));
        assert_eq!(details.problem_type(), ABOUT_BLANK);
        assert_eq!(details.to_string(), "error");
        assert_eq!(
            details.unwrap_cause().map(ToString::to_string).as_deref(),
            Some("error")
        );
    }

    #[test]
    fn from_absent_error_is_ok() {
        let details = DetailsError::from_boxed(None);
        assert_eq!(details.detail, None);
        assert_eq!(details.status, Some(200));
        assert_eq!(details.title.as_deref(), Some("OK"));
        assert!(details.unwrap_cause().is_none());
    }

    #[test]
    fn extension_exposes_base_behaviour() {
        let details = traced();
        assert_eq!(details.to_string(), "error");
        assert_eq!(details.status_code(), Some(400));
    }

    #[test]
    fn extension_members_follow_base_members() {
        let json = marshal_json(&traced()).unwrap();
        assert_eq!(
            String::from_utf8(json).unwrap(),
            r#"{"detail":"error","status":400,"title":"Bad Request","id":"myid"}"#
        );
    }

    #[test]
    fn extension_xml() {
        let xml = marshal_xml(&traced()).unwrap();
        assert_eq!(
            String::from_utf8(xml).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <problem xmlns=\"urn:ietf:rfc:7807\"><detail>error</detail><status>400</status><title>Bad Request</title><id>myid</id></problem>"
        );
    }

    #[test]
    fn missing_status_and_title_filled_at_render_time() {
        let details = DetailsError::default().with_detail("lost").with_instance("/orders/7");
        let members = details.problem_members(500).unwrap();
        let keys: Vec<&str> = members.keys().map(String::as_str).collect();
        assert_eq!(keys, ["detail", "instance", "status", "title"]);
        assert_eq!(members["status"], 500);
        assert_eq!(members["title"], "Internal Server Error");
    }

    #[test]
    fn explicit_fields_are_kept() {
        let details = DetailsError::from_error(Status::NOT_FOUND)
            .with_title("No such order")
            .with_type("https://errors.example.com/order-not-found");
        let members = details.problem_members(500).unwrap();
        assert_eq!(members["status"], 404);
        assert_eq!(members["title"], "No such order");
        assert_eq!(members["type"], "https://errors.example.com/order-not-found");
    }

    #[test]
    fn json_round_trip() {
        let details = DetailsError::from_error(wrap(422, Message::new("name is required")))
            .with_instance("/users/1");
        let decoded = DetailsError::unmarshal(&serde_json::to_vec(&details).unwrap()).unwrap();
        assert_eq!(decoded, details);
        assert!(decoded.unwrap_cause().is_none());
    }

    #[test]
    fn xml_round_trip() {
        let details = DetailsError::from_error(wrap(409, Message::new("taken")))
            .with_type("https://errors.example.com/conflict");
        let decoded = DetailsError::unmarshal(&marshal_xml(&details).unwrap()).unwrap();
        assert_eq!(decoded, details);
    }

    #[test]
    fn extension_json_round_trip() {
        let details = traced();
        let decoded: Details<TraceId> = unmarshal(&marshal_json(&details).unwrap()).unwrap();
        assert_eq!(decoded.problem, details.problem);
        assert_eq!(decoded.extensions, details.extensions);
    }

    #[test]
    fn extension_xml_round_trip() {
        let details = traced();
        let decoded: Details<TraceId> = unmarshal(&marshal_xml(&details).unwrap()).unwrap();
        assert_eq!(decoded.problem, details.problem);
        assert_eq!(decoded.extensions, details.extensions);
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Quota {
        limit: u32,
        exhausted: bool,
        ratio: f64,
        buckets: Vec<String>,
        owner: Owner,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Owner {
        id: u64,
        name: String,
    }

    #[test]
    fn typed_extension_members_survive_xml() {
        let details = Details::new(
            DetailsError::from_error(Status::TOO_MANY_REQUESTS).with_instance("/quota/7"),
            Quota {
                limit: 100,
                exhausted: true,
                ratio: 0.5,
                buckets: vec!["daily".to_owned(), "hourly".to_owned()],
                owner: Owner {
                    id: 7,
                    name: "alice".to_owned(),
                },
            },
        );
        let xml = marshal_xml(&details).unwrap();
        let decoded: Details<Quota> = unmarshal(&xml).unwrap();
        assert_eq!(decoded.problem, details.problem);
        assert_eq!(decoded.extensions, details.extensions);

        let json = marshal_json(&details).unwrap();
        let decoded: Details<Quota> = unmarshal(&json).unwrap();
        assert_eq!(decoded.extensions, details.extensions);
    }

    #[test]
    fn single_repeated_element_decodes_as_list() {
        #[derive(Debug, Deserialize)]
        struct Tags {
            tags: Vec<String>,
        }

        let decoded: Details<Tags> = unmarshal(
            b"<problem xmlns=\"urn:ietf:rfc:7807\"><status>400</status><tags>only</tags></problem>",
        )
        .unwrap();
        assert_eq!(decoded.problem.status, Some(400));
        assert_eq!(decoded.extensions.tags, ["only"]);
    }

    #[test]
    fn extension_decode_errors_are_reported() {
        let err = unmarshal::<Details<TraceId>>(b"{\"status\":400}").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)), "{err}");
        let err = unmarshal::<Details<Quota>>(
            b"<problem><limit>lots</limit></problem>",
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::Xml(_)), "{err}");
    }

    #[test]
    fn unmarshal_skips_leading_whitespace() {
        let decoded = DetailsError::unmarshal(b" \n\t{\"status\":404}").unwrap();
        assert_eq!(decoded.status, Some(404));
    }

    #[test]
    fn unmarshal_rejects_unknown_encodings() {
        for input in [&b""[..], b"  []", b"   ", b"status: 400"] {
            let err = DetailsError::unmarshal(input).unwrap_err();
            assert!(matches!(err, DecodeError::InvalidEncoding), "{err}");
        }
    }

    #[test]
    fn unmarshal_surfaces_decoder_errors() {
        assert!(matches!(
            DetailsError::unmarshal(b"{\"status\":"),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            DetailsError::unmarshal(b"<problem><status>abc</status></problem>"),
            Err(DecodeError::Xml(_))
        ));
    }
}
