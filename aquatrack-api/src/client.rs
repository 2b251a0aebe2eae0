//! Aquatrack Rust API Client
//!
//! # Creating new api client
//!
//! - [new](TrackerClient::new) - create new client with default configuration
//! - [with_config](TrackerClient::with_config) - create client with custom configuration
//! - [with_client](TrackerClient::with_client) - create client with configuration and custom reqwest client
//!
//! # Configuration
//!
//! - [get_config](TrackerClient::get_config) - returns configuration
//!

use std::{fmt, sync::Arc, time::Duration};

use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::{
    AQUATRACK_DEFAULT_URL, Result,
    config::{AQUATRACK_SESSION_ENV, AQUATRACK_URL_ENV},
    http_client::HttpClient,
    items::{ItemRequest, ListItemsRequest},
    prelude::*,
    session::SessionRequest,
    stats::StatsRequest,
};

/// Configuration for the tracker client. Defines endpoint url, session credential,
/// validation limits, and request timeout.
///
/// ```rust,no_run
/// use aquatrack::prelude::*;
/// # fn create_client() -> Result<TrackerClient, TrackerError> {
/// let config = ClientConfig::default()
///     .base_url("http://127.0.0.1:8000")
///     .session_cookie("cookie-value-from-browser");
/// let client = TrackerClient::with_config(config)?;
/// # Ok(client)
/// # }
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Base url for all HTTP api requests.
    /// If not provided in config, url is determined by:
    /// * The environment variable AQUATRACK_URL, if defined, or
    /// * "http://127.0.0.1:8000" `aquatrack::AQUATRACK_DEFAULT_URL`
    pub base_url: String,

    /// Value of the server's `session` cookie. Sessions are established by the
    /// server's login flow; the client only carries the cookie.
    /// Defaults to the environment variable AQUATRACK_SESSION, if defined.
    pub session_cookie: Option<Zeroizing<String>>,

    /// Limits for sanity checking.
    pub limits: ValidationLimits,

    /// Optional per-request timeout. No timeout is enforced when unset.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<redacted>"),
            )
            .field("limits", &self.limits)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: std::env::var(AQUATRACK_URL_ENV)
                .unwrap_or(AQUATRACK_DEFAULT_URL.to_string()),
            session_cookie: std::env::var(AQUATRACK_SESSION_ENV)
                .ok()
                .filter(|value| !value.is_empty())
                .map(Zeroizing::new),
            limits: Default::default(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn base_url(self, base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..self
        }
    }

    /// Sets the session cookie value.
    pub fn session_cookie(self, cookie: impl Into<String>) -> Self {
        ClientConfig {
            session_cookie: Some(Zeroizing::new(cookie.into())),
            ..self
        }
    }

    /// Removes any session cookie (including one picked up from the environment).
    pub fn no_session(self) -> Self {
        ClientConfig {
            session_cookie: None,
            ..self
        }
    }

    pub fn limits(self, limits: ValidationLimits) -> Self {
        ClientConfig { limits, ..self }
    }

    pub fn timeout(self, timeout: Option<Duration>) -> Self {
        ClientConfig { timeout, ..self }
    }

    pub fn get_limits(&self) -> &ValidationLimits {
        &self.limits
    }
}

/// Response of the health endpoint
#[derive(Clone, Debug, Default, Deserialize, serde::Serialize, PartialEq, Eq)]
pub struct Health {
    #[serde(default)]
    pub ok: bool,
}

/// An ergonomic aquarium tracker API client in Rust.
#[derive(Clone)]
pub struct TrackerClient {
    pub(crate) client: Arc<HttpClient>,
    pub(crate) config: ClientConfig,
}

impl fmt::Debug for TrackerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerClient")
            .field("config", &self.config)
            .finish()
    }
}

impl TrackerClient {
    /// Creates a new client with default configuration.
    ///
    /// # Example
    /// ```rust,no_run
    /// use aquatrack::prelude::*;
    /// # fn create_client() -> Result<TrackerClient, TrackerError> {
    /// let client = TrackerClient::new()?;
    /// # Ok(client)
    /// # }
    /// ```
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with the provided configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut client = reqwest::Client::builder().no_proxy();
        if let Some(timeout) = config.timeout {
            client = client.timeout(timeout);
        }
        Self::with_client(client, config)
    }

    /// Creates a client from a `reqwest::ClientBuilder` and configuration.
    /// ClientBuilder can be customized with proxies, dns servers, user_agent, etc.
    /// The cookie store and redirect policy are set by this crate.
    ///
    /// # Example
    /// ```rust,no_run
    /// use aquatrack::prelude::*;
    /// # fn create_client() -> Result<TrackerClient, TrackerError> {
    /// let builder = reqwest::Client::builder().user_agent("my-app/1.0");
    /// let client = TrackerClient::with_client(builder, ClientConfig::default())?;
    /// # Ok(client)
    /// # }
    /// ```
    pub fn with_client(client: reqwest::ClientBuilder, config: ClientConfig) -> Result<Self> {
        debug!(url=?config.base_url, has_session=config.session_cookie.is_some(), "new client");
        let client = HttpClient::new(
            client,
            config.base_url.clone(),
            config.limits.clone(),
            config.session_cookie.as_ref(),
        )?;
        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Returns the configuration.
    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the (normalized) base url
    pub fn base_url(&self) -> &str {
        &self.client.base_url
    }

    /// Lists items: `client.items().list()`
    pub fn items(&self) -> ListItemsRequest {
        ListItemsRequest::new(self.client.clone())
    }

    /// Updates a single item: `client.item(id).set_visited(true)`
    pub fn item(&self, id: impl Into<ItemId>) -> ItemRequest {
        ItemRequest::new(self.client.clone(), self.config.limits.clone(), id.into())
    }

    /// Aggregate statistics: `client.stats().get()`
    pub fn stats(&self) -> StatsRequest {
        StatsRequest::new(self.client.clone())
    }

    /// Session status: `client.session().get()`
    pub fn session(&self) -> SessionRequest {
        SessionRequest::new(self.client.clone())
    }

    /// Checks server liveness. Does not require a session.
    pub async fn health(&self) -> Result<Health> {
        self.client.get_request("/api/health").await
    }

    /// Ends the server session. The server answers with a redirect and clears
    /// the cookie; subsequent requests from this client are logged out.
    pub async fn logout(&self) -> Result<()> {
        let status = self.client.get_no_content("/logout").await?;
        debug!(status = status.as_u16(), "logout");
        Ok(())
    }

    /// Request and error counts since the client was built
    pub fn http_metrics(&self) -> HttpMetricsSnapshot {
        self.client.metrics_snapshot()
    }
}
