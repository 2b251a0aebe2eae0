//! HttpClient middleware used by TrackerClient
//!
//! Responsible for
//!  - handling all HTTP api requests
//!  - logging/tracing
//!  - mapping non-success responses into TrackerErrors
//!
//! Requests are sent once. Failures are reported to the caller, which decides
//! whether to surface or retry them.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use bytes::Bytes;
use reqwest::{ClientBuilder, Method, StatusCode, Url, cookie::Jar, redirect};
use serde::{Serialize, de::DeserializeOwned};
use snafu::prelude::*;
use tracing::{debug, error, trace};
use zeroize::Zeroizing;

use crate::{Result, config::SESSION_COOKIE_NAME, prelude::*};

/// Cumulative request counters, shared by clones of the client
#[derive(Debug, Default)]
pub struct HttpMetrics {
    requests: AtomicU64,
    /// Failed requests, including unexpected redirects
    errors: AtomicU64,
    /// 401 responses, also counted in `errors`
    unauthorized: AtomicU64,
}

impl HttpMetrics {
    pub fn snapshot(&self) -> HttpMetricsSnapshot {
        HttpMetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            unauthorized: self.unauthorized.load(Ordering::Relaxed),
        }
    }

    fn count(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`HttpMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpMetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub unauthorized: u64,
}

/// A 2xx or 3xx response
struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: Bytes,
}

impl Reply {
    /// Error text for a redirect where json was expected
    fn redirect_message(&self) -> String {
        let reason = self.status.canonical_reason().unwrap_or("redirect");
        match (&self.location, String::from_utf8_lossy(&self.body).trim()) {
            (Some(location), _) => format!("{reason}: redirected to {location}"),
            (None, "") => reason.to_string(),
            (None, text) => format!("{reason}: {text}"),
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Bytes>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("body", &self.body.as_ref().map_or(0, Bytes::len))
            .finish()
    }
}

#[derive(Debug)]
pub(crate) struct HttpClient {
    pub client: reqwest::Client,

    /// Base URL for API requests (e.g., "http://127.0.0.1:8000")
    pub base_url: String,

    limits: ValidationLimits,

    /// HTTP request/response metrics
    pub metrics: Arc<HttpMetrics>,
}

impl HttpClient {
    /// Builds the http client. If `session_cookie` is set, it's installed in the
    /// client's cookie jar for the base url; cookies set by the server
    /// (including the logout cookie reset) are kept in the same jar.
    pub fn new(
        builder: ClientBuilder,
        base_url: String,
        limits: ValidationLimits,
        session_cookie: Option<&Zeroizing<String>>,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = Url::parse(&base_url).map_err(|e| TrackerError::Validation {
            message: format!("invalid base url '{base_url}': {e}"),
        })?;
        let jar = Arc::new(Jar::default());
        if let Some(cookie) = session_cookie {
            let cookie = Zeroizing::new(format!("{SESSION_COOKIE_NAME}={}", cookie.as_str()));
            jar.add_cookie_str(&cookie, &url);
        }
        let client = builder
            .cookie_provider(jar)
            .redirect(redirect::Policy::none())
            .build()
            .context(HttpSnafu {
                method: "client-init",
                url: "",
            })?;
        Ok(HttpClient {
            client,
            base_url,
            limits,
            metrics: Arc::new(HttpMetrics::default()),
        })
    }

    /// Returns a snapshot of current HTTP metrics
    pub fn metrics_snapshot(&self) -> HttpMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub(crate) async fn get_request<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let req = HttpRequest {
            method: Method::GET,
            path: path.into(),
            body: None,
        };
        self.send(req).await
    }

    /// Makes a PUT request with JSON body.
    pub(crate) async fn put_request<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let req = HttpRequest {
            method: Method::PUT,
            path: path.into(),
            body: Some(Bytes::from(
                serde_json::to_vec(body).context(SerializationSnafu)?,
            )),
        };
        self.send(req).await
    }

    /// Makes a GET request where only the status matters.
    /// Redirects are not followed and count as success.
    pub(crate) async fn get_no_content(&self, path: &str) -> Result<StatusCode> {
        let req = HttpRequest {
            method: Method::GET,
            path: path.into(),
            body: None,
        };
        Ok(self.execute(&req).await?.status)
    }

    /// Sends the request and deserializes the json response body into T.
    /// A redirect is an error here, reported with its target or body text.
    pub(crate) async fn send<T: DeserializeOwned>(&self, req: HttpRequest) -> Result<T> {
        let reply = self.execute(&req).await?;
        if !reply.status.is_success() {
            HttpMetrics::count(&self.metrics.errors);
            let message = reply.redirect_message();
            error!(status = reply.status.as_u16(), %message, ?req, "http: unexpected redirect");
            return Err(TrackerError::ApiError {
                code: reply.status.as_u16(),
                method: req.method.to_string(),
                url: req.path,
                message,
            });
        }
        deserialize_json(&reply.body)
    }

    /// This function handles all tracker api requests
    /// - sends the request once, with the session cookie from the jar
    /// - maps http error codes into TrackerErrors, keeping the response body text
    /// - returns the 2xx or 3xx reply
    async fn execute(&self, req: &HttpRequest) -> Result<Reply> {
        if let Some(ref body) = req.body {
            self.limits
                .validate_body(body, &format!("http {} {}", &req.method, &req.path))?;
        }

        let full_url = format!("{}{}", self.base_url, req.path);
        let mut builder = self.client.request(req.method.clone(), &full_url);
        if let Some(ref body) = req.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        // debug log (if tracing enabled)
        log_request(&builder, req.body.as_ref());

        HttpMetrics::count(&self.metrics.requests);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(source=?e, ?req, "http");
                HttpMetrics::count(&self.metrics.errors);
                return Err(TrackerError::Http {
                    method: req.method.to_string(),
                    url: req.path.clone(),
                    source: e,
                });
            }
        };

        let code = response.status();
        match code {
            ok if ok.is_success() || ok.is_redirection() => {
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let body = response.bytes().await.context(HttpSnafu {
                    method: req.method.to_string(),
                    url: req.path.clone(),
                })?;
                log_response(&req.path, &body);
                debug!(method=%req.method, path=%req.path, status=code.as_u16(), "http");
                Ok(Reply {
                    status: code,
                    location,
                    body,
                })
            }
            StatusCode::UNAUTHORIZED /* 401 */ => {
                HttpMetrics::count(&self.metrics.errors);
                HttpMetrics::count(&self.metrics.unauthorized);
                let message = response.text().await.unwrap_or_default();
                error!(?code, ?message, ?req, "http");
                Err(TrackerError::Unauthorized { message })
            }
            _ => {
                HttpMetrics::count(&self.metrics.errors);
                let message = response.text().await.unwrap_or_default();
                error!(?code, ?message, ?req, "http");
                Err(TrackerError::ApiError {
                    code: code.as_u16(),
                    method: req.method.to_string(),
                    url: req.path.clone(),
                    message,
                })
            }
        }
    }
}

// dump request
// requires RUST_LOG=aquatrack::http_json=trace
fn log_request(builder: &reqwest::RequestBuilder, body: Option<&Bytes>) {
    if tracing::enabled!(target: "aquatrack::http_json", tracing::Level::TRACE)
        && let Some(req) = builder.try_clone().and_then(|b| b.build().ok())
    {
        let method = req.method().as_str();
        let url = req.url();
        let body = body
            .map(|b| String::from_utf8_lossy(b).to_string())
            .unwrap_or_default();
        // headers are not logged: they carry the session cookie
        trace!(target: "aquatrack::http_json", "{method} url={url} body={body}");
    }
}

// dump json response, for debugging
fn log_response(path: &str, body: &Bytes) {
    if tracing::enabled!(target: "aquatrack::http_json", tracing::Level::TRACE) {
        trace!(target: "aquatrack::http_json", "Response path={path} body={}",
            String::from_utf8_lossy(body)
        );
    }
}

// deserialize, reporting errors with 'serde_path_to_error', which provides
// detailed json path to the error
pub(crate) fn deserialize_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(value) => Ok(value),
        Err(err) => {
            error!("Deserialization failed at {}: {}", err.path(), err);
            Err(TrackerError::Deserialization {
                source: err.into_inner(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::LocationItem;

    fn reply(status: u16, location: Option<&str>, body: &'static str) -> Reply {
        Reply {
            status: StatusCode::from_u16(status).expect("status"),
            location: location.map(str::to_string),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_redirect_message() {
        assert_eq!(
            reply(302, Some("/login"), "").redirect_message(),
            "Found: redirected to /login"
        );
        assert_eq!(reply(307, None, " moved\n").redirect_message(), "Temporary Redirect: moved");
        assert_eq!(reply(303, None, "").redirect_message(), "See Other");
    }

    #[test]
    fn test_deserialize_json_reports_error() {
        let result: Result<Vec<LocationItem>> = deserialize_json(br#"[{"id": 1}]"#);
        assert!(matches!(result, Err(TrackerError::Deserialization { .. })));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpClient::new(
            reqwest::Client::builder(),
            "not a url".into(),
            ValidationLimits::default(),
            None,
        );
        assert!(matches!(result, Err(TrackerError::Validation { .. })));
    }
}
