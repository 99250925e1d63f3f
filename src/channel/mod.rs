//! Location-scoped message rooms.
//!
//! A room is addressed by a [`LocationKey`] derived from coordinates. Backends
//! deliver whole-room snapshots to a subscriber until the returned
//! [`Subscription`] is dropped.

mod error;
mod firebase;
mod local;

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::viewport::{ItemId, PaneEntry};

pub use error::ChannelError;
pub use firebase::{DEFAULT_DATABASE_URL, FirebaseChannel};
pub use local::LocalChannel;

pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self::new(40.0, -111.0)
    }
}

impl Location {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn key(&self) -> LocationKey {
        LocationKey::for_location(*self)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Room address: both coordinates scaled by ten and rounded half away from
/// zero, e.g. `400_-1110`. Small negatives that round to zero keep their sign;
/// an exact zero does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn for_location(location: Location) -> Self {
        Self(format!(
            "{}_{}",
            scaled(location.latitude),
            scaled(location.longitude)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn scaled(value: f64) -> String {
    // Adding +0.0 turns an exact -0.0 into 0.0.
    format!("{:.0}", (value * 10.0 + 0.0).round())
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message as stored in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: ItemId,
    pub username: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub date: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Post {
    pub fn to_entry(&self) -> PaneEntry {
        PaneEntry {
            id: self.id.clone(),
            author: self.username.clone(),
            content: self.content.clone(),
        }
    }
}

/// A message about to be written. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub date: i64,
    pub content: String,
    pub username: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewPost {
    /// Stamp a post with the current time. An empty name posts as
    /// [`ANONYMOUS`].
    pub fn new(location: Location, username: &str, content: impl Into<String>) -> Self {
        let username = if username.is_empty() {
            ANONYMOUS.to_string()
        } else {
            username.to_string()
        };
        Self {
            date: chrono::Utc::now().timestamp_millis(),
            content: content.into(),
            username,
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }

    pub fn into_post(self, id: ItemId) -> Post {
        Post {
            id,
            username: self.username,
            content: self.content,
            date: self.date,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug)]
pub enum ChannelEvent {
    /// Every post currently in the room, oldest first.
    Snapshot { key: LocationKey, posts: Vec<Post> },
    Failed { key: LocationKey, error: ChannelError },
}

impl ChannelEvent {
    pub const fn key(&self) -> &LocationKey {
        match self {
            Self::Snapshot { key, .. } | Self::Failed { key, .. } => key,
        }
    }
}

/// Live interest in one room. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    key: LocationKey,
    token: CancellationToken,
}

impl Subscription {
    pub fn new(key: LocationKey) -> Self {
        Self {
            key,
            token: CancellationToken::new(),
        }
    }

    pub const fn key(&self) -> &LocationKey {
        &self.key
    }

    /// Token the delivering task watches for cancellation.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
        tracing::debug!(key = %self.key, "unsubscribed");
    }
}

/// A backend holding location rooms.
pub trait MessageChannel: Send + Sync {
    /// Start delivering snapshots of the room at `key` to `tx`. Must be called
    /// from within a tokio runtime.
    fn subscribe(&self, key: &LocationKey, tx: mpsc::Sender<ChannelEvent>) -> Subscription;

    /// Append a post to the room. Fire-and-forget; failures are logged.
    fn add_post(&self, key: &LocationKey, post: NewPost);
}
