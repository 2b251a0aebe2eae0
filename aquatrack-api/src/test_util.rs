//! Test utilities
//!
//! Helper functions used to test the `aquatrack` library and its dependents.
//! These are not part of the supported api and are subject to change.
//!
#![doc(hidden)]

use std::net::SocketAddr;
use std::sync::Arc;

use futures::FutureExt;
use snafu::prelude::*;

use crate::mock::{MOCK_USERS, MockAquarium, MockTrackerServer, MockTrackerServerHandle};
use crate::prelude::{ClientConfig, TrackerClient, TrackerError};

// =============================================================================
// TestError
// =============================================================================

#[doc(hidden)]
pub type TestResult<T> = std::result::Result<T, TestError>;

#[doc(hidden)]
#[derive(Debug, Snafu)]
pub enum TestError {
    #[snafu(display("API error: {source}"))]
    Api { source: TrackerError },

    #[snafu(display("Mock server error: {source}"))]
    Server { source: std::io::Error },

    #[snafu(display("Configuration error: {message}"))]
    Config { message: String },

    #[snafu(display("Test assertion failed: {message}"))]
    Assertion { message: String },
}

impl From<TrackerError> for TestError {
    fn from(source: TrackerError) -> Self {
        TestError::Api { source }
    }
}

// =============================================================================
// TestContext
// =============================================================================

/// Test context: a running mock server and a client logged in to it
#[doc(hidden)]
pub struct TestContext {
    pub client: TrackerClient,
    pub server: MockTrackerServerHandle,
}

impl TestContext {
    /// Starts a mock server with the default fixture and a client for the first mock user
    pub async fn new() -> TestResult<Self> {
        Self::with_server(MockTrackerServer::new()).await
    }

    pub async fn with_aquariums(aquariums: Vec<MockAquarium>) -> TestResult<Self> {
        Self::with_server(MockTrackerServer::with_aquariums(aquariums)).await
    }

    async fn with_server(server: MockTrackerServer) -> TestResult<Self> {
        let server = server.spawn(local_addr()).await.context(ServerSnafu)?;
        let client = test_client(&server.url(), Some(MOCK_USERS[0].0))?;
        Ok(Self { client, server })
    }

    /// Another client for the same server, with a different (or no) session
    pub fn client_for(&self, token: Option<&str>) -> TestResult<TrackerClient> {
        test_client(&self.server.url(), token)
    }

    pub async fn shutdown(self) {
        self.server.shutdown().await;
    }
}

/// Creates a client for `base_url`, ignoring environment overrides
#[doc(hidden)]
pub fn test_client(base_url: &str, session: Option<&str>) -> TestResult<TrackerClient> {
    let mut config = ClientConfig::default().base_url(base_url).no_session();
    if let Some(session) = session {
        config = config.session_cookie(session);
    }
    Ok(TrackerClient::with_config(config)?)
}

fn local_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

/// Runs `f` with a fresh test context; the mock server is shut down afterwards,
/// even if `f` panics.
#[doc(hidden)]
pub async fn with_test_context<F, Fut, T>(f: F) -> TestResult<T>
where
    F: FnOnce(Arc<TestContext>) -> Fut,
    Fut: std::future::Future<Output = TestResult<T>>,
{
    let ctx = Arc::new(TestContext::new().await?);
    let result = std::panic::AssertUnwindSafe(f(Arc::clone(&ctx)))
        .catch_unwind()
        .await;
    match Arc::try_unwrap(ctx) {
        Ok(ctx) => ctx.shutdown().await,
        Err(_) => eprintln!("test context still referenced; mock server left running"),
    }
    match result {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
