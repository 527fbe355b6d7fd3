//! Response wrapper, decoded bodies and content-type dispatch.
//!
//! A successful call yields a [`Response<Body>`]: the decoded body together
//! with the status, headers and latency of the exchange. The body is parsed
//! JSON when the server declares a JSON content type and raw text otherwise.

use crate::{Error, Result};
use http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// A wrapper around a successful HTTP response.
///
/// # Type Parameters
///
/// * `T` - The type of the response data ([`Body`] once decoded, `String`
///   for the raw captured reply)
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The response data.
    pub data: T,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from sending the request until the body was read.
    pub latency: Duration,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(data: T, status: StatusCode, headers: HeaderMap, latency: Duration) -> Self {
        Self {
            data,
            status,
            headers,
            latency,
        }
    }

    /// Maps the response data to a different type, preserving the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dagport::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    /// );
    ///
    /// let parsed = response.map(|s| s.parse::<u32>().unwrap());
    /// assert_eq!(parsed.data, 42);
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        }
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// The server declared a JSON content type; the body was parsed.
    Json(Value),
    /// Any other content type; the body is kept verbatim.
    Text(String),
}

impl Body {
    /// Returns the parsed JSON value, if this is a JSON body.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    /// Returns the raw text, if this is a text body.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Json(_) => None,
            Body::Text(text) => Some(text),
        }
    }

    /// Converts the body into a JSON value. Text bodies become JSON strings.
    pub fn into_json(self) -> Value {
        match self {
            Body::Json(value) => value,
            Body::Text(text) => Value::String(text),
        }
    }
}

/// What the transport needs to know about a received reply.
///
/// Any HTTP library can feed the decoder by implementing these accessors.
pub trait Reply {
    /// The HTTP status code.
    fn status(&self) -> StatusCode;

    /// The declared `Content-Type`, if any.
    fn content_type(&self) -> Option<&str>;

    /// The body as text.
    fn text(&self) -> &str;

    /// The body parsed as JSON.
    fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(self.text())
    }
}

impl Reply for Response<String> {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    fn text(&self) -> &str {
        &self.data
    }
}

/// Returns `true` if the content type names a JSON media type.
///
/// Parameters such as `charset` are ignored, the comparison is
/// case-insensitive, and structured suffixes like `application/problem+json`
/// count as JSON.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Decodes a reply according to its declared content type.
///
/// # Errors
///
/// Returns [`Error::DeserializationFailed`] when the reply claims to be JSON
/// but its body does not parse.
///
/// # Examples
///
/// ```
/// use dagport::response::{decode_body, Body};
/// use dagport::Response;
/// use http::{HeaderMap, HeaderValue, StatusCode};
/// use std::time::Duration;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("content-type", HeaderValue::from_static("text/html"));
/// let reply = Response::new(
///     "{\"not\": \"parsed\"}".to_string(),
///     StatusCode::OK,
///     headers,
///     Duration::ZERO,
/// );
///
/// assert_eq!(
///     decode_body(&reply).unwrap(),
///     Body::Text("{\"not\": \"parsed\"}".to_string())
/// );
/// ```
pub fn decode_body(reply: &impl Reply) -> Result<Body> {
    let is_json = reply.content_type().is_some_and(is_json_content_type);
    if !is_json {
        return Ok(Body::Text(reply.text().to_string()));
    }

    reply
        .json()
        .map(Body::Json)
        .map_err(|e| Error::DeserializationFailed {
            raw_response: reply.text().to_string(),
            serde_error: e.to_string(),
            status: reply.status(),
        })
}
