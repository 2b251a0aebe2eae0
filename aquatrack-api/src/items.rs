//! # Location items
//!
//! Items are the aquarium records held by the server, merged with the current
//! user's visit state (visited flag, note).
//!
//! ## Item methods on TrackerClient
//!
//! - [items](TrackerClient::items) - list all items
//! - [item](TrackerClient::item) - mutate a single item (visited flag, note)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aquatrack::prelude::*;
//!
//! # async fn example(client: &TrackerClient) -> Result<(), TrackerError> {
//! let items = client.items().list().await?;
//! let mapped = items.iter().filter(|item| item.coordinates().is_some()).count();
//! println!("{} items, {mapped} with coordinates", items.len());
//!
//! client.item(ItemId::from(7u64)).set_visited(true).await?;
//! client.item(ItemId::from(7u64)).set_note("混雑注意").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Wire format
//!
//! The server is not strict about value types: ids may be numbers or strings,
//! coordinates may be numbers, numeric strings, or null, and the star flag is
//! an integer. Decoding accepts all of these; values that can't be interpreted
//! as coordinates decode as `None` and the item is simply not mapped.

use std::{fmt, sync::Arc};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::{Result, http_client::HttpClient, prelude::*};

/// Opaque, stable item identifier.
///
/// The server uses integer ids; they're held as strings so the client doesn't
/// depend on the representation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&ItemId> for ItemId {
    fn from(id: &ItemId) -> Self {
        id.clone()
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(serde_json::Number),
            Text(String),
        }
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => ItemId(n.to_string()),
            RawId::Text(s) => ItemId(s),
        })
    }
}

/// Validated latitude/longitude pair: both finite and within range.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }
}

/// An aquarium record, merged with the current user's visit state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationItem {
    pub id: ItemId,

    pub name: String,

    /// Primary division (prefecture), e.g. "東京都"
    #[serde(default, deserialize_with = "de_text")]
    pub prefecture: String,

    /// Sub division (city)
    #[serde(default, deserialize_with = "de_text")]
    pub city: String,

    /// Location text as imported, e.g. "東京都墨田区押上1-1-2"
    #[serde(default, deserialize_with = "de_text")]
    pub location_raw: String,

    #[serde(default, alias = "latitude", deserialize_with = "de_coordinate")]
    pub lat: Option<f64>,

    #[serde(default, alias = "longitude", deserialize_with = "de_coordinate")]
    pub lng: Option<f64>,

    #[serde(default, deserialize_with = "de_flag")]
    pub visited: bool,

    /// Single-bit favorite marker
    #[serde(default, rename = "mola_star", deserialize_with = "de_flag")]
    pub starred: bool,

    #[serde(default, deserialize_with = "de_text")]
    pub note: String,

    #[serde(default, deserialize_with = "de_url")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "de_timestamp")]
    pub visited_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "de_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LocationItem {
    /// Returns the item position, if both coordinates are present, finite, and in range.
    pub fn coordinates(&self) -> Option<LatLng> {
        LatLng::new(self.lat?, self.lng?)
    }
}

/// Server acknowledgement of a visited/note update.
/// The session reloads after a mutation, so the fields are informational.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    #[serde(default, alias = "aquarium_id")]
    pub item_id: Option<ItemId>,

    #[serde(default)]
    pub visited: Option<bool>,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default, deserialize_with = "de_timestamp")]
    pub visited_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "de_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// REQUEST BODY TYPES (internal)
// ============================================================================

#[derive(Debug, Serialize)]
struct SetVisitedBody {
    visited: bool,
}

#[derive(Debug, Serialize)]
struct SetNoteBody {
    note: String,
}

// ============================================================================
// BUILDER STRUCTS (public)
// ============================================================================

/// Request builder for listing items.
///
/// Obtained via [`TrackerClient::items`].
#[derive(Debug)]
pub struct ListItemsRequest {
    client: Arc<HttpClient>,
}

impl ListItemsRequest {
    pub(crate) fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Fetches the full item collection, in server order.
    pub async fn list(self) -> Result<Vec<LocationItem>> {
        let items: Vec<LocationItem> = self.client.get_request("/api/items").await?;
        debug!(count = items.len(), "listed items");
        Ok(items)
    }
}

/// Request builder for updating a single item.
///
/// Obtained via [`TrackerClient::item`]. Both updates are idempotent `PUT`s.
#[derive(Debug)]
pub struct ItemRequest {
    client: Arc<HttpClient>,
    limits: ValidationLimits,
    id: ItemId,
}

impl ItemRequest {
    pub(crate) fn new(client: Arc<HttpClient>, limits: ValidationLimits, id: ItemId) -> Self {
        Self { client, limits, id }
    }

    /// Sets the visited flag.
    ///
    /// # Errors
    /// - [`TrackerError::Validation`] if the id is malformed
    /// - [`TrackerError::ApiError`] if the server rejects the update
    pub async fn set_visited(self, visited: bool) -> Result<VisitRecord> {
        self.limits.validate_id(&self.id)?;
        self.client
            .put_request(
                &format!("/api/items/{}/visited", self.id),
                &SetVisitedBody { visited },
            )
            .await
    }

    /// Replaces the note text. An empty string clears the note.
    ///
    /// # Errors
    /// - [`TrackerError::Validation`] if the id is malformed or the note is too long
    /// - [`TrackerError::ApiError`] if the server rejects the update
    pub async fn set_note(self, note: impl Into<String>) -> Result<VisitRecord> {
        let note = note.into();
        self.limits.validate_id(&self.id)?;
        self.limits.validate_note(&note)?;
        self.client
            .put_request(&format!("/api/items/{}/note", self.id), &SetNoteBody { note })
            .await
    }
}

// ============================================================================
// LENIENT DECODERS
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

fn de_coordinate<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    Ok(match Option::<RawScalar>::deserialize(deserializer)? {
        Some(RawScalar::Number(n)) => Some(n),
        Some(RawScalar::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(RawScalar::Bool(_)) | None => None,
    })
}

fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(match Option::<RawScalar>::deserialize(deserializer)? {
        Some(RawScalar::Bool(b)) => b,
        Some(RawScalar::Number(n)) => n == 1.0,
        Some(RawScalar::Text(s)) => matches!(s.trim(), "1" | "true"),
        None => false,
    })
}

fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn de_url<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty()))
}

// The server writes naive utc timestamps (no offset); accept both forms.
fn de_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    let Some(text) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&text) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc()))
}
