use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{ChannelError, ChannelEvent, LocationKey, MessageChannel, NewPost, Post, Subscription};
use crate::viewport::ItemId;

pub const DEFAULT_DATABASE_URL: &str = "https://geo-chat-7d7c6.firebaseio.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A post as the Realtime Database stores it, keyed by push id.
#[derive(Debug, Deserialize)]
struct StoredPost {
    #[serde(default)]
    date: i64,
    #[serde(default)]
    content: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

impl StoredPost {
    fn into_post(self, id: String) -> Post {
        Post {
            id: ItemId::new(id),
            username: self.username,
            content: self.content,
            date: self.date,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Firebase Realtime Database over its REST interface.
///
/// Rooms live at `messages/{key}/posts`. Subscriptions poll the room and
/// deliver a snapshot on the first fetch and whenever it changes.
#[derive(Clone)]
pub struct FirebaseChannel {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
}

impl FirebaseChannel {
    pub fn new(base_url: &str, poll_interval: Duration) -> Result<Self, ChannelError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                poll_interval,
            }),
        })
    }

    fn room_url(&self, key: &LocationKey) -> String {
        self.inner.room_url(key)
    }

    /// Every post in the room, ordered by push id.
    pub async fn fetch(&self, key: &LocationKey) -> Result<Vec<Post>, ChannelError> {
        self.inner.fetch(key).await
    }

    /// Append a post and return the id the database assigned.
    pub async fn push(&self, key: &LocationKey, post: &NewPost) -> Result<ItemId, ChannelError> {
        let response: PushResponse = self
            .inner
            .http
            .post(self.room_url(key))
            .json(post)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(ItemId::new(response.name))
    }
}

impl Inner {
    fn room_url(&self, key: &LocationKey) -> String {
        format!("{}/messages/{}/posts.json", self.base_url, key)
    }

    async fn fetch(&self, key: &LocationKey) -> Result<Vec<Post>, ChannelError> {
        let room: Option<BTreeMap<String, StoredPost>> = self
            .http
            .get(self.room_url(key))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(room
            .unwrap_or_default()
            .into_iter()
            .map(|(id, stored)| stored.into_post(id))
            .collect())
    }
}

impl MessageChannel for FirebaseChannel {
    fn subscribe(&self, key: &LocationKey, tx: mpsc::Sender<ChannelEvent>) -> Subscription {
        let subscription = Subscription::new(key.clone());
        let token = subscription.token();
        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        tracing::info!(%key, url = %inner.room_url(&key), "subscribing");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Vec<Post>> = None;

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                let result = tokio::select! {
                    () = token.cancelled() => break,
                    result = inner.fetch(&key) => result,
                };

                let event = match result {
                    Ok(posts) if last.as_ref() == Some(&posts) => continue,
                    Ok(posts) => {
                        tracing::debug!(%key, count = posts.len(), "room changed");
                        last = Some(posts.clone());
                        ChannelEvent::Snapshot {
                            key: key.clone(),
                            posts,
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%key, %error, "room fetch failed");
                        // Redeliver on recovery so the failure is cleared.
                        last = None;
                        ChannelEvent::Failed {
                            key: key.clone(),
                            error,
                        }
                    }
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            tracing::trace!(%key, "poller stopped");
        });

        subscription
    }

    fn add_post(&self, key: &LocationKey, post: NewPost) {
        let channel = self.clone();
        let key = key.clone();
        tokio::spawn(async move {
            match channel.push(&key, &post).await {
                Ok(id) => tracing::debug!(%key, %id, "post added"),
                Err(error) => tracing::warn!(%key, %error, "post failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Location;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ROOM: &str = "/messages/400_-1110/posts.json";

    fn room() -> LocationKey {
        Location::default().key()
    }

    fn channel(server: &MockServer) -> FirebaseChannel {
        FirebaseChannel::new(&server.uri(), Duration::from_millis(20)).unwrap()
    }

    fn two_posts() -> serde_json::Value {
        json!({
            "-Nb": {"date": 2, "content": "second", "username": "bo", "latitude": 40.0, "longitude": -111.0},
            "-Na": {"date": 1, "content": "first", "username": "al", "latitude": 40.0, "longitude": -111.0}
        })
    }

    async fn next_event(rx: &mut mpsc::Receiver<ChannelEvent>) -> ChannelEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn fetch_orders_posts_by_push_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ROOM))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_posts()))
            .mount(&server)
            .await;

        let posts = assert_ok!(channel(&server).fetch(&room()).await);

        let contents: Vec<&str> = posts.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(posts[0].id.as_str(), "-Na");
        assert_eq!(posts[1].username, "bo");
    }

    #[tokio::test]
    async fn empty_room_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ROOM))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
            .mount(&server)
            .await;

        let posts = assert_ok!(channel(&server).fetch(&room()).await);

        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn http_errors_map_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ROOM))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = assert_err!(channel(&server).fetch(&room()).await);

        assert!(matches!(err, ChannelError::HttpStatus(401, _)));
    }

    #[tokio::test]
    async fn push_posts_the_message_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ROOM))
            .and(body_partial_json(json!({"content": "hello", "username": "ada"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-Nz"})))
            .expect(1)
            .mount(&server)
            .await;

        let post = NewPost::new(Location::default(), "ada", "hello");
        let id = assert_ok!(channel(&server).push(&room(), &post).await);

        assert_eq!(id.as_str(), "-Nz");
    }

    #[tokio::test]
    async fn subscription_delivers_only_changes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ROOM))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "-Na": {"date": 1, "content": "first", "username": "al"}
            })))
            .up_to_n_times(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(ROOM))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_posts()))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(8);
        let _subscription = channel(&server).subscribe(&room(), tx);

        let ChannelEvent::Snapshot { posts, .. } = next_event(&mut rx).await else {
            panic!("expected snapshot");
        };
        assert_eq!(posts.len(), 1);

        // Two unchanged polls are skipped; the next event is the new post.
        let ChannelEvent::Snapshot { key, posts } = next_event(&mut rx).await else {
            panic!("expected snapshot");
        };
        assert_eq!(key, room());
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn subscription_reports_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ROOM))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(8);
        let _subscription = channel(&server).subscribe(&room(), tx);

        let ChannelEvent::Failed { error, .. } = next_event(&mut rx).await else {
            panic!("expected failure");
        };
        assert_eq!(error, ChannelError::HttpStatus(503, "Service Unavailable".into()));
    }

    #[tokio::test]
    async fn dropping_subscription_stops_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ROOM))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_posts()))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(8);
        let subscription = channel(&server).subscribe(&room(), tx);
        next_event(&mut rx).await;

        drop(subscription);

        let closed = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(closed, Ok(None)));
    }
}
