use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Stable identity of a rendered item (the message's push id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
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

/// Scroll geometry of a container, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub scroll_top: u32,
    pub client_height: u32,
    pub scroll_height: u32,
}

impl Geometry {
    /// Largest offset the container accepts; anything above clamps here.
    pub const fn max_scroll_top(&self) -> u32 {
        self.scroll_height.saturating_sub(self.client_height)
    }
}

/// Vertical extent of a child, relative to the top of the container's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub top: u32,
    pub height: u32,
}

impl Extent {
    pub const fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

/// A rendered child. `extent` is `None` until the child has been laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    pub id: ItemId,
    pub extent: Option<Extent>,
}

/// True when the child overlaps the visible window, fully or partially.
pub fn in_view(viewport: Geometry, child: Extent) -> bool {
    let c_top = viewport.scroll_top;
    let c_bottom = c_top + viewport.client_height;
    let e_top = child.top;
    let e_bottom = child.bottom();

    let total = e_top >= c_top && e_bottom <= c_bottom;
    let partial = (e_top < c_top && e_bottom > c_top) || (e_bottom > c_bottom && e_top < c_bottom);
    total || partial
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

impl ContainerId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The scrollable region the viewport core observes.
pub trait ScrollContainer {
    /// Identity of this mounted container; a remount yields a new id.
    fn id(&self) -> ContainerId;

    /// `None` while the container is not attached or not yet laid out.
    fn geometry(&self) -> Option<Geometry>;

    /// Rendered children in display order.
    fn children(&self) -> &[Child];

    fn set_scroll_top(&mut self, top: u32);

    /// Register for scroll events. Each event carries the geometry at the time
    /// of the scroll.
    fn listen(&mut self) -> ScrollListener;
}

/// Registered interest in a container's scroll events.
///
/// Dropping the listener (or calling [`ScrollListener::release`]) detaches it;
/// the container prunes closed listeners the next time it emits.
#[derive(Debug)]
pub struct ScrollListener {
    rx: mpsc::UnboundedReceiver<Geometry>,
}

impl ScrollListener {
    pub fn channel() -> (mpsc::UnboundedSender<Geometry>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Pending scroll events in arrival order.
    pub fn drain(&mut self) -> Vec<Geometry> {
        let mut events = Vec::new();
        while let Ok(geometry) = self.rx.try_recv() {
            events.push(geometry);
        }
        events
    }

    pub fn release(mut self) {
        self.rx.close();
    }
}

/// Sender side kept by a container. Sending to a released listener fails and
/// the entry is dropped.
#[derive(Debug, Default)]
pub struct ScrollListeners {
    senders: Vec<mpsc::UnboundedSender<Geometry>>,
}

impl ScrollListeners {
    pub fn register(&mut self) -> ScrollListener {
        let (tx, listener) = ScrollListener::channel();
        self.senders.push(tx);
        listener
    }

    pub fn emit(&mut self, geometry: Geometry) {
        self.senders.retain(|tx| tx.send(geometry).is_ok());
    }

    pub fn active_count(&mut self) -> usize {
        self.senders.retain(|tx| !tx.is_closed());
        self.senders.len()
    }
}
