//! # Statistics
//!
//! Aggregate visit counts for the logged-in user.
//!
//! ```rust,no_run
//! use aquatrack::prelude::*;
//! # async fn example(client: &TrackerClient) -> Result<(), TrackerError> {
//! let stats = client.stats().get().await?;
//! let progress = stats.progress();
//! println!("{} ({}%)", progress.label(), progress.percent);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Result, http_client::HttpClient};

/// Visit counts, as reported by the server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub visited: u64,
    #[serde(default)]
    pub total: u64,
}

impl Stats {
    pub fn progress(&self) -> Progress {
        Progress::new(self.visited, self.total)
    }
}

/// Progress indicator derived from [`Stats`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub visited: u64,
    pub total: u64,
    /// visited/total as a rounded percentage; 0 when total is 0
    pub percent: u64,
}

impl Progress {
    pub fn new(visited: u64, total: u64) -> Self {
        let percent = (visited as f64 / total.max(1) as f64 * 100.0).round() as u64;
        Self {
            visited,
            total,
            percent,
        }
    }

    pub fn label(&self) -> String {
        format!("訪問: {} / {}", self.visited, self.total)
    }
}

/// Request builder for statistics. Obtained via `TrackerClient::stats`.
#[derive(Debug)]
pub struct StatsRequest {
    client: Arc<HttpClient>,
}

impl StatsRequest {
    pub(crate) fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    pub async fn get(self) -> Result<Stats> {
        self.client.get_request("/api/stats").await
    }
}
