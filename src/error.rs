//! Error types for orchestrator API calls.
//!
//! Transport-level problems are kept structured here. The facade turns them
//! into the uniform `{"error": ...}` shape only at its public boundary, so
//! callers that care can still tell a timeout from a 404 via [`ErrorKind`].

use http::{HeaderMap, StatusCode};

/// The error type for a single request against the orchestrator API.
///
/// # Examples
///
/// ```no_run
/// use dagport::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("http://localhost:8080")?
///     .build()?;
///
/// match client.get("test", None).await {
///     Ok(response) => println!("Reachable: {:?}", response.data),
///     Err(failure) => match failure.error() {
///         Error::HttpError { status, raw_response, .. } => {
///             eprintln!("HTTP error {}: {}", status, raw_response);
///         }
///         other => eprintln!("{}: {}", failure, other),
///     },
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The response declared a JSON content type but the body was not valid JSON.
    #[error("Failed to decode response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to decode
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The server returned a non-2xx HTTP status code.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// Invalid configuration was provided, such as a malformed header value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failed to serialize the request payload.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// An invalid URL was provided or built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(err)
        }
    }
}

/// The closed set of failure categories an operation can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The server could not be reached or the connection broke.
    Network,
    /// The request did not complete in time.
    Timeout,
    /// The server answered with a non-success status.
    Status,
    /// The response body could not be decoded.
    Decode,
    /// The request could not be built (bad URL, header value or payload).
    Configuration,
}

impl Error {
    /// Returns the category of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use dagport::{Error, ErrorKind};
    /// use http::StatusCode;
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::NOT_FOUND,
    ///     raw_response: "no such dag".to_string(),
    ///     headers: http::HeaderMap::new(),
    /// };
    ///
    /// assert_eq!(err.kind(), ErrorKind::Status);
    /// assert_eq!(Error::Timeout.kind(), ErrorKind::Timeout);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::Timeout => ErrorKind::Timeout,
            Error::HttpError { .. } => ErrorKind::Status,
            Error::DeserializationFailed { .. } => ErrorKind::Decode,
            Error::ConfigurationError(_) => ErrorKind::Configuration,
            Error::SerializationFailed(_) => ErrorKind::Configuration,
            Error::InvalidUrl(_) => ErrorKind::Configuration,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for orchestrator API calls.
pub type Result<T> = std::result::Result<T, Error>;
