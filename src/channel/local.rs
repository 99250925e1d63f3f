use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};

use super::{ChannelEvent, LocationKey, MessageChannel, NewPost, Post, Subscription};
use crate::viewport::ItemId;

/// In-process rooms, for offline use.
///
/// Ids are the post's millisecond timestamp followed by a sequence number, so
/// they sort chronologically like database push ids.
#[derive(Clone, Default)]
pub struct LocalChannel {
    rooms: Arc<Mutex<HashMap<LocationKey, watch::Sender<Vec<Post>>>>>,
    sequence: Arc<AtomicU64>,
}

impl LocalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_room<R>(
        &self,
        key: &LocationKey,
        f: impl FnOnce(&watch::Sender<Vec<Post>>) -> R,
    ) -> R {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        let room = rooms
            .entry(key.clone())
            .or_insert_with(|| watch::channel(Vec::new()).0);
        f(room)
    }

    /// Current posts in a room.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn posts(&self, key: &LocationKey) -> Vec<Post> {
        self.with_room(key, |room| room.borrow().clone())
    }

    fn next_id(&self, date: i64) -> ItemId {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        ItemId::new(format!("{date:013}-{sequence:06}"))
    }
}

impl MessageChannel for LocalChannel {
    fn subscribe(&self, key: &LocationKey, tx: mpsc::Sender<ChannelEvent>) -> Subscription {
        let subscription = Subscription::new(key.clone());
        let token = subscription.token();
        let mut rx = self.with_room(key, watch::Sender::subscribe);
        let key = key.clone();

        tokio::spawn(async move {
            loop {
                let posts = rx.borrow_and_update().clone();
                let event = ChannelEvent::Snapshot {
                    key: key.clone(),
                    posts,
                };
                if tx.send(event).await.is_err() {
                    break;
                }
                tokio::select! {
                    () = token.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        subscription
    }

    fn add_post(&self, key: &LocationKey, post: NewPost) {
        let id = self.next_id(post.date);
        tracing::debug!(%key, %id, "post added");
        let post = post.into_post(id);
        self.with_room(key, |room| room.send_modify(|posts| posts.push(post)));
    }
}
