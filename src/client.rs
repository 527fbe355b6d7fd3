//! Transport layer: one request in, one normalized outcome out.
//!
//! The [`Client`] owns the normalized base URL and the default headers. Every
//! GET, POST and DELETE goes through [`Client::execute`], which never returns
//! anything but a decoded [`Response<Body>`] or a [`Failure`].

use crate::{
    endpoint::Endpoint,
    response::{decode_body, Body},
    Error, ErrorKind, Response, Result,
};
use http::{
    header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE},
    HeaderMap, HeaderName, HeaderValue, Method,
};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use url::Url;

/// The API root appended to every base URL unless overridden.
pub const DEFAULT_API_ROOT: &str = "api/experimental";

/// How a credential passed to one call affects later calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialMode {
    /// The credential is sent with that call only.
    #[default]
    PerCall,

    /// The most recent non-empty credential is remembered and sent with every
    /// later call on the same client until another one replaces it.
    ///
    /// Kept for compatibility with callers that authenticate once and then
    /// omit the credential. Clones of a client share the remembered value.
    Sticky,
}

/// A request that did not produce a decoded body.
///
/// Displays as the generic `Failed to perform <VERB> request for endpoint <path>`
/// message; the underlying cause stays available through [`Failure::error`].
#[derive(Debug)]
pub struct Failure {
    method: Method,
    endpoint: String,
    error: Error,
}

impl Failure {
    /// Creates a failure for the given endpoint.
    pub fn new(method: Method, endpoint: impl Into<String>, error: Error) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            error,
        }
    }

    /// The HTTP method of the failed request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The relative path of the failed request.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The underlying cause.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// The category of the underlying cause.
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Consumes the failure, returning the underlying cause.
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to perform {} request for endpoint {}",
            self.method, self.endpoint
        )
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// An HTTP client bound to one orchestrator address.
///
/// Construct it once per target and reuse it; it is cheap to clone.
///
/// # Examples
///
/// ```no_run
/// use dagport::Client;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::builder()
///     .base_url("http://localhost:8080/")?
///     .build()?;
///
/// let runs = client.get("dags/etl/dag_runs", Some("Bearer abc")).await?;
/// println!("Runs: {:?}", runs.data);
///
/// let created = client
///     .post("dags/etl/dag_runs", &json!({"conf": {}}), None)
///     .await?;
/// println!("Status: {}", created.status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    credential_mode: CredentialMode,
    sticky_credential: RwLock<Option<HeaderValue>>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The normalized base URL, always ending in `/<api root>/`.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The credential policy this client was built with.
    pub fn credential_mode(&self) -> CredentialMode {
        self.inner.credential_mode
    }

    /// Builds the absolute URL for a relative path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the joined string does not parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use dagport::Client;
    ///
    /// # fn example() -> Result<(), dagport::Error> {
    /// let client = Client::builder().base_url("http://host:8080/")?.build()?;
    /// assert_eq!(
    ///     client.url_for("dags/etl/paused")?.as_str(),
    ///     "http://host:8080/api/experimental/dags/etl/paused"
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn url_for(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{}{}", self.inner.base_url, path))?)
    }

    /// Executes one request and normalizes its outcome.
    ///
    /// `payload` is sent as the JSON body of POST requests and ignored for
    /// other methods. A non-empty `credential` is sent as the `Authorization`
    /// header; see [`CredentialMode`] for whether it outlives this call.
    ///
    /// No retries are attempted: a failed request is terminal.
    pub async fn execute(
        &self,
        endpoint: &Endpoint,
        payload: Option<&Value>,
        credential: Option<&str>,
    ) -> std::result::Result<Response<Body>, Failure> {
        match self.send(endpoint, payload, credential).await {
            Ok(response) => Ok(response),
            Err(e) => {
                let failure = Failure::new(endpoint.method.clone(), endpoint.path.clone(), e);
                tracing::error!(
                    method = %endpoint.method,
                    endpoint = %endpoint.path,
                    kind = ?failure.kind(),
                    error = %failure.error(),
                    "{}",
                    failure
                );
                Err(failure)
            }
        }
    }

    /// Makes a GET request to the given relative path.
    pub async fn get(
        &self,
        path: impl Into<String>,
        credential: Option<&str>,
    ) -> std::result::Result<Response<Body>, Failure> {
        self.execute(&Endpoint::get(path), None, credential).await
    }

    /// Makes a POST request with a JSON body to the given relative path.
    pub async fn post(
        &self,
        path: impl Into<String>,
        payload: &Value,
        credential: Option<&str>,
    ) -> std::result::Result<Response<Body>, Failure> {
        self.execute(&Endpoint::post(path), Some(payload), credential)
            .await
    }

    /// Makes a DELETE request to the given relative path.
    pub async fn delete(
        &self,
        path: impl Into<String>,
        credential: Option<&str>,
    ) -> std::result::Result<Response<Body>, Failure> {
        self.execute(&Endpoint::delete(path), None, credential).await
    }

    /// Resolves the `Authorization` value for one call.
    fn authorization(&self, credential: Option<&str>) -> Result<Option<HeaderValue>> {
        let supplied = match credential.filter(|c| !c.is_empty()) {
            Some(credential) => {
                let mut value = HeaderValue::from_str(credential).map_err(|e| {
                    Error::ConfigurationError(format!("Invalid credential header value: {}", e))
                })?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        match self.inner.credential_mode {
            CredentialMode::PerCall => Ok(supplied),
            CredentialMode::Sticky => {
                if let Some(value) = supplied {
                    let mut slot = self
                        .inner
                        .sticky_credential
                        .write()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    *slot = Some(value);
                }
                let slot = self
                    .inner
                    .sticky_credential
                    .read()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                Ok(slot.clone())
            }
        }
    }

    /// Sends the request and decodes the reply.
    async fn send(
        &self,
        endpoint: &Endpoint,
        payload: Option<&Value>,
        credential: Option<&str>,
    ) -> Result<Response<Body>> {
        let authorization = self.authorization(credential)?;
        let url = self.url_for(&endpoint.path)?;

        tracing::debug!(
            method = %endpoint.method,
            url = %url,
            authorized = authorization.is_some(),
            "Executing HTTP request"
        );

        let mut request = self
            .inner
            .http_client
            .request(endpoint.method.clone(), url)
            .headers(self.inner.default_headers.clone());

        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        if endpoint.method == Method::POST {
            if let Some(payload) = payload {
                let body = serde_json::to_vec(payload)
                    .map_err(|e| Error::SerializationFailed(e.to_string()))?;
                request = request.body(body);
            }
        }

        let start_time = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            let raw_response = response.text().await.unwrap_or_default();

            if status.is_client_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Client error (4xx)"
                );
            } else if status.is_server_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Server error (5xx)"
                );
            }

            return Err(Error::HttpError {
                status,
                raw_response,
                headers,
            });
        }

        let raw_body = response.text().await?;
        let latency = start_time.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        let reply = Response::new(raw_body, status, headers, latency);
        let body = decode_body(&reply)?;
        Ok(reply.map(|_| body))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .field("credential_mode", &self.inner.credential_mode)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use dagport::{ClientBuilder, CredentialMode};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), dagport::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://airflow.internal:8080")?
///     .timeout(Duration::from_secs(30))
///     .credential_mode(CredentialMode::Sticky)
///     .default_header("User-Agent", "nightly-etl/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<String>,
    api_root: String,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    credential_mode: CredentialMode,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    ///
    /// Every request carries `Content-Type: application/json` and
    /// `Cache-Control: no-cache` unless overridden.
    pub fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        Self {
            base_url: None,
            api_root: DEFAULT_API_ROOT.to_string(),
            default_headers,
            timeout: None,
            credential_mode: CredentialMode::default(),
        }
    }

    /// Sets the orchestrator's address, e.g. `http://localhost:8080`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not a valid URL.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        Url::parse(url)?;
        self.base_url = Some(url.to_string());
        Ok(self)
    }

    /// Overrides the API root segment appended to the base URL.
    pub fn api_root(mut self, api_root: impl AsRef<str>) -> Self {
        self.api_root = api_root.as_ref().trim_matches('/').to_string();
        self
    }

    /// Adds a header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets a per-request timeout. Without one the HTTP library default applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets how credentials carry over between calls.
    pub fn credential_mode(mut self, mode: CredentialMode) -> Self {
        self.credential_mode = mode;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or the HTTP client cannot
    /// be constructed.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;
        let base_url = normalize_base_url(&base_url, &self.api_root);

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                default_headers: self.default_headers,
                timeout: self.timeout,
                credential_mode: self.credential_mode,
                sticky_credential: RwLock::new(None),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Strips trailing slashes and appends the API root, ending in exactly one `/`.
fn normalize_base_url(base_url: &str, api_root: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if api_root.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}/", base, api_root)
    }
}
