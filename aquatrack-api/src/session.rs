//! # Session status
//!
//! The server establishes sessions through its own login flow; this module only
//! asks whether the current cookie belongs to a logged-in user.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Result, http_client::HttpClient, prelude::*};

/// Identity of the current session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub logged_in: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl SessionInfo {
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// First non-empty of name, email, user id
    pub fn display_name(&self) -> Option<&str> {
        [&self.name, &self.email, &self.user_id]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|value| !value.is_empty())
    }

    /// Status line shown while logged in, e.g. "Hanako でログイン中"
    pub fn status_label(&self) -> Option<String> {
        if !self.logged_in {
            return None;
        }
        Some(format!("{} でログイン中", self.display_name().unwrap_or("")))
    }
}

/// Request builder for session status. Obtained via `TrackerClient::session`.
#[derive(Debug)]
pub struct SessionRequest {
    client: Arc<HttpClient>,
}

impl SessionRequest {
    pub(crate) fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Returns the session status.
    ///
    /// An error status from the server is read as "logged out" rather than
    /// reported as a failure. Transport and decode errors are returned.
    pub async fn get(self) -> Result<SessionInfo> {
        match self.client.get_request::<SessionInfo>("/api/session").await {
            Ok(info) => {
                debug!(logged_in = info.logged_in, "session");
                Ok(info)
            }
            Err(TrackerError::ApiError { code, .. }) => {
                warn!(code, "session check failed; treating as logged out");
                Ok(SessionInfo::logged_out())
            }
            Err(TrackerError::Unauthorized { .. }) => Ok(SessionInfo::logged_out()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_precedence() {
        let info = SessionInfo {
            logged_in: true,
            user_id: Some("u-1".into()),
            email: Some("hanako@example.com".into()),
            name: Some(String::new()),
            picture: None,
        };
        assert_eq!(info.display_name(), Some("hanako@example.com"));
        assert_eq!(
            info.status_label().as_deref(),
            Some("hanako@example.com でログイン中")
        );
    }

    #[test]
    fn logged_out_has_no_label() {
        let info: SessionInfo =
            serde_json::from_str(r#"{"logged_in": false}"#).expect("decode session");
        assert_eq!(info, SessionInfo::logged_out());
        assert_eq!(info.status_label(), None);
    }
}
