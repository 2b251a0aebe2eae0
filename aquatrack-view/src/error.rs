//! Errors returned by `Session`
//!
use aquatrack::prelude::*;
use snafu::prelude::*;

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SessionError {
    /// The session check succeeded but nobody is logged in. Nothing was loaded.
    #[snafu(display("Not logged in: {message}"))]
    Session { message: String },

    /// The session check itself failed
    #[snafu(display("Session check failed: {source}"))]
    SessionRequest { source: TrackerError },

    /// Fetching items or stats failed. The previous state is kept.
    #[snafu(display("Load failed: {source}"))]
    Load { source: TrackerError },

    /// A visited or note update failed. The previous state is kept.
    #[snafu(display("Update of {id} failed: {source}"))]
    Mutation { id: ItemId, source: TrackerError },
}

impl SessionError {
    /// Text for a user-visible notification: the server's message where there is one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Session { message } => message.clone(),
            Self::SessionRequest { source } | Self::Load { source } | Self::Mutation { source, .. } => {
                source.user_message()
            }
        }
    }

    /// True when the user has to log in (again) before anything else will work
    pub fn is_session_failure(&self) -> bool {
        match self {
            Self::Session { .. } | Self::SessionRequest { .. } => true,
            Self::Load { source } | Self::Mutation { source, .. } => source.is_unauthorized(),
        }
    }

    /// The underlying client error, if any
    pub fn tracker_error(&self) -> Option<&TrackerError> {
        match self {
            Self::Session { .. } => None,
            Self::SessionRequest { source } | Self::Load { source } | Self::Mutation { source, .. } => {
                Some(source)
            }
        }
    }
}
