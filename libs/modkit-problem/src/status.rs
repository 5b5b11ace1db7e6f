//! HTTP status table and sentinel status errors.
//!
//! Codes and reason phrases follow the IANA HTTP Status Code Registry.
//! See: <https://www.iana.org/assignments/http-status-codes/http-status-codes.xhtml>

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;

use crate::error::EncodeError;
use crate::http_error::HttpError;

/// Returns the canonical reason phrase for `code`, or an empty string when
/// the code is not registered.
#[must_use]
pub const fn status_text(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",

        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",

        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",

        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",

        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",

        _ => "",
    }
}

/// An error that is nothing but an HTTP status code.
///
/// Its message is the reason phrase and it reports itself as its own status,
/// so `serve_error(w, headers, Some(&Status::NOT_FOUND))` renders a plain
/// 404 in whichever format the client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(u16);

macro_rules! sentinels {
    ($($name:ident = $code:literal;)+) => {
        impl Status {
            $(
                pub const $name: Status = Status($code);
            )+

            /// Every registered status, in ascending order.
            pub const ALL: &'static [Status] = &[$(Status::$name),+];
        }
    };
}

sentinels! {
    CONTINUE = 100;                        // RFC 9110, 15.2.1
    SWITCHING_PROTOCOLS = 101;             // RFC 9110, 15.2.2
    PROCESSING = 102;                      // RFC 2518, 10.1
    EARLY_HINTS = 103;                     // RFC 8297
    OK = 200;                              // RFC 9110, 15.3.1
    CREATED = 201;                         // RFC 9110, 15.3.2
    ACCEPTED = 202;                        // RFC 9110, 15.3.3
    NON_AUTHORITATIVE_INFO = 203;          // RFC 9110, 15.3.4
    NO_CONTENT = 204;                      // RFC 9110, 15.3.5
    RESET_CONTENT = 205;                   // RFC 9110, 15.3.6
    PARTIAL_CONTENT = 206;                 // RFC 9110, 15.3.7
    MULTI_STATUS = 207;                    // RFC 4918, 11.1
    ALREADY_REPORTED = 208;                // RFC 5842, 7.1
    IM_USED = 226;                         // RFC 3229, 10.4.1
    MULTIPLE_CHOICES = 300;                // RFC 9110, 15.4.1
    MOVED_PERMANENTLY = 301;               // RFC 9110, 15.4.2
    FOUND = 302;                           // RFC 9110, 15.4.3
    SEE_OTHER = 303;                       // RFC 9110, 15.4.4
    NOT_MODIFIED = 304;                    // RFC 9110, 15.4.5
    USE_PROXY = 305;                       // RFC 9110, 15.4.6
    TEMPORARY_REDIRECT = 307;              // RFC 9110, 15.4.8
    PERMANENT_REDIRECT = 308;              // RFC 9110, 15.4.9
    BAD_REQUEST = 400;                     // RFC 9110, 15.5.1
    UNAUTHORIZED = 401;                    // RFC 9110, 15.5.2
    PAYMENT_REQUIRED = 402;                // RFC 9110, 15.5.3
    FORBIDDEN = 403;                       // RFC 9110, 15.5.4
    NOT_FOUND = 404;                       // RFC 9110, 15.5.5
    METHOD_NOT_ALLOWED = 405;              // RFC 9110, 15.5.6
    NOT_ACCEPTABLE = 406;                  // RFC 9110, 15.5.7
    PROXY_AUTH_REQUIRED = 407;             // RFC 9110, 15.5.8
    REQUEST_TIMEOUT = 408;                 // RFC 9110, 15.5.9
    CONFLICT = 409;                        // RFC 9110, 15.5.10
    GONE = 410;                            // RFC 9110, 15.5.11
    LENGTH_REQUIRED = 411;                 // RFC 9110, 15.5.12
    PRECONDITION_FAILED = 412;             // RFC 9110, 15.5.13
    REQUEST_ENTITY_TOO_LARGE = 413;        // RFC 9110, 15.5.14
    REQUEST_URI_TOO_LONG = 414;            // RFC 9110, 15.5.15
    UNSUPPORTED_MEDIA_TYPE = 415;          // RFC 9110, 15.5.16
    REQUESTED_RANGE_NOT_SATISFIABLE = 416; // RFC 9110, 15.5.17
    EXPECTATION_FAILED = 417;              // RFC 9110, 15.5.18
    TEAPOT = 418;                          // RFC 9110, 15.5.19 (Unused)
    MISDIRECTED_REQUEST = 421;             // RFC 9110, 15.5.20
    UNPROCESSABLE_ENTITY = 422;            // RFC 9110, 15.5.21
    LOCKED = 423;                          // RFC 4918, 11.3
    FAILED_DEPENDENCY = 424;               // RFC 4918, 11.4
    TOO_EARLY = 425;                       // RFC 8470, 5.2.
    UPGRADE_REQUIRED = 426;                // RFC 9110, 15.5.22
    PRECONDITION_REQUIRED = 428;           // RFC 6585, 3
    TOO_MANY_REQUESTS = 429;               // RFC 6585, 4
    REQUEST_HEADER_FIELDS_TOO_LARGE = 431; // RFC 6585, 5
    UNAVAILABLE_FOR_LEGAL_REASONS = 451;   // RFC 7725, 3
    INTERNAL_SERVER_ERROR = 500;           // RFC 9110, 15.6.1
    NOT_IMPLEMENTED = 501;                 // RFC 9110, 15.6.2
    BAD_GATEWAY = 502;                     // RFC 9110, 15.6.3
    SERVICE_UNAVAILABLE = 503;             // RFC 9110, 15.6.4
    GATEWAY_TIMEOUT = 504;                 // RFC 9110, 15.6.5
    HTTP_VERSION_NOT_SUPPORTED = 505;      // RFC 9110, 15.6.6
    VARIANT_ALSO_NEGOTIATES = 506;         // RFC 2295, 8.1
    INSUFFICIENT_STORAGE = 507;            // RFC 4918, 11.5
    LOOP_DETECTED = 508;                   // RFC 5842, 7.2
    NOT_EXTENDED = 510;                    // RFC 2774, 7
    NETWORK_AUTHENTICATION_REQUIRED = 511; // RFC 6585, 6
}

#[derive(Serialize)]
struct CanonicalBody<'a> {
    detail: &'a str,
    status: u16,
    title: &'a str,
}

/// `{"detail":T,"status":C,"title":T}` for every registered status, encoded once.
static CANONICAL_JSON: LazyLock<HashMap<u16, Vec<u8>>> = LazyLock::new(|| {
    Status::ALL
        .iter()
        .filter_map(|status| {
            let text = status.text();
            let body = CanonicalBody {
                detail: text,
                status: status.code(),
                title: text,
            };
            serde_json::to_vec(&body).ok().map(|b| (status.code(), b))
        })
        .collect()
});

impl Status {
    /// Creates a sentinel for an arbitrary code. Codes outside the registry
    /// are accepted as-is and carry an empty reason phrase.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Reason phrase for this status.
    #[must_use]
    pub const fn text(self) -> &'static str {
        status_text(self.0)
    }

    /// Precomputed JSON problem body, available for registered codes only.
    #[must_use]
    pub fn canonical_json(self) -> Option<&'static [u8]> {
        CANONICAL_JSON.get(&self.0).map(Vec::as_slice)
    }
}

impl From<Status> for u16 {
    fn from(status: Status) -> Self {
        status.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl std::error::Error for Status {}

impl HttpError for Status {
    fn status_code(&self) -> Option<u16> {
        Some(self.0)
    }

    fn encode_json(&self, status: u16) -> Result<Cow<'static, [u8]>, EncodeError> {
        match self.canonical_json() {
            Some(body) if status == self.0 => Ok(Cow::Borrowed(body)),
            _ => {
                let members = self.problem_members(status)?;
                Ok(Cow::Owned(serde_json::to_vec(&members)?))
            }
        }
    }
}
