//! The remote operations a [`Session`](crate::session::Session) depends on.
//!
//! [`TrackerClient`] is the production implementation.

use aquatrack::prelude::*;

#[allow(async_fn_in_trait)]
pub trait TrackerApi {
    /// Session status. Error statuses are reported as logged out.
    async fn session(&self) -> Result<SessionInfo, TrackerError>;

    /// Full item collection, in server order
    async fn list_items(&self) -> Result<Vec<LocationItem>, TrackerError>;

    async fn stats(&self) -> Result<Stats, TrackerError>;

    async fn set_visited(&self, id: &ItemId, visited: bool) -> Result<VisitRecord, TrackerError>;

    async fn set_note(&self, id: &ItemId, note: &str) -> Result<VisitRecord, TrackerError>;
}

impl TrackerApi for TrackerClient {
    async fn session(&self) -> Result<SessionInfo, TrackerError> {
        TrackerClient::session(self).get().await
    }

    async fn list_items(&self) -> Result<Vec<LocationItem>, TrackerError> {
        self.items().list().await
    }

    async fn stats(&self) -> Result<Stats, TrackerError> {
        TrackerClient::stats(self).get().await
    }

    async fn set_visited(&self, id: &ItemId, visited: bool) -> Result<VisitRecord, TrackerError> {
        self.item(id).set_visited(visited).await
    }

    async fn set_note(&self, id: &ItemId, note: &str) -> Result<VisitRecord, TrackerError> {
        self.item(id).set_note(note).await
    }
}
