//! Fakes and builders shared by unit tests.

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use crate::app::{App, AppConfig, Focus};
use crate::channel::{ChannelEvent, LocalChannel, Location, Post};
use crate::storage::Storage;
use crate::theme::Theme;
use crate::viewport::{
    ChatView, Child, ContainerId, Extent, Geometry, IndicatorSink, ItemId, PaneEntry,
    ScrollContainer, ScrollListener, ScrollListeners,
};

/// Fixed timestamp for deterministic posts: 2023-11-14 22:13:20 UTC, in ms.
pub const TEST_DATE: i64 = 1_700_000_000_000;

/// A scroll container driven directly by tests.
///
/// `set_scroll_top` stores the raw value without clamping, the way a test
/// wants to see exactly what the controller asked for.
pub struct FakeContainer {
    id: ContainerId,
    pub scroll_top: u32,
    pub client_height: u32,
    pub children: Vec<Child>,
    pub attached: bool,
    scroll_height: Option<u32>,
    listeners: ScrollListeners,
}

impl FakeContainer {
    pub fn new(scroll_top: u32, client_height: u32) -> Self {
        Self {
            id: ContainerId::next(),
            scroll_top,
            client_height,
            children: Vec::new(),
            attached: true,
            scroll_height: None,
            listeners: ScrollListeners::default(),
        }
    }

    pub fn child(mut self, id: &str, top: u32, height: u32) -> Self {
        self.children.push(Child {
            id: ItemId::from(id),
            extent: Some(Extent { top, height }),
        });
        self
    }

    pub fn scroll_height(mut self, height: u32) -> Self {
        self.scroll_height = Some(height);
        self
    }

    /// Content grew; no scroll event fires.
    pub fn grow_to(&mut self, height: u32) {
        self.scroll_height = Some(height);
    }

    /// The user scrolled to `top`.
    pub fn user_scroll(&mut self, top: u32) {
        self.set_scroll_top(top);
    }

    pub fn listener_count(&mut self) -> usize {
        self.listeners.active_count()
    }

    fn content_height(&self) -> u32 {
        let children = self
            .children
            .iter()
            .filter_map(|c| c.extent)
            .map(|e| e.bottom())
            .max()
            .unwrap_or(0);
        children.max(self.scroll_top + self.client_height)
    }
}

impl ScrollContainer for FakeContainer {
    fn id(&self) -> ContainerId {
        self.id
    }

    fn geometry(&self) -> Option<Geometry> {
        self.attached.then(|| Geometry {
            scroll_top: self.scroll_top,
            client_height: self.client_height,
            scroll_height: self.scroll_height.unwrap_or_else(|| self.content_height()),
        })
    }

    fn children(&self) -> &[Child] {
        &self.children
    }

    fn set_scroll_top(&mut self, top: u32) {
        self.scroll_top = top;
        if let Some(geometry) = self.geometry() {
            self.listeners.emit(geometry);
        }
    }

    fn listen(&mut self) -> ScrollListener {
        self.listeners.register()
    }
}

/// What a [`RecordingSink`] was asked to show.
#[derive(Debug, Default)]
pub struct SinkLog {
    pub current: String,
    pub history: Vec<String>,
    pub restores: usize,
    pub fail: bool,
}

/// Indicator sink that records into a shared [`SinkLog`].
pub struct RecordingSink {
    original: String,
    log: Rc<RefCell<SinkLog>>,
}

impl RecordingSink {
    pub fn new(original: &str) -> (Self, Rc<RefCell<SinkLog>>) {
        let log = Rc::new(RefCell::new(SinkLog {
            current: original.to_string(),
            ..SinkLog::default()
        }));
        let sink = Self {
            original: original.to_string(),
            log: Rc::clone(&log),
        };
        (sink, log)
    }
}

impl IndicatorSink for RecordingSink {
    fn set(&mut self, value: &str) -> io::Result<()> {
        let mut log = self.log.borrow_mut();
        if log.fail {
            return Err(io::Error::other("sink unavailable"));
        }
        log.current = value.to_string();
        log.history.push(value.to_string());
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        let mut log = self.log.borrow_mut();
        if log.fail {
            return Err(io::Error::other("sink unavailable"));
        }
        log.current.clone_from(&self.original);
        log.restores += 1;
        Ok(())
    }
}

pub fn sample_posts(count: usize) -> Vec<Post> {
    let location = Location::default();
    (0..count)
        .map(|i| Post {
            id: ItemId::new(format!("msg-{i:03}")),
            username: format!("user{i}"),
            content: format!("message {i}"),
            date: TEST_DATE + i as i64 * 1_000,
            latitude: location.latitude,
            longitude: location.longitude,
        })
        .collect()
}

pub fn pane_entries(count: usize) -> Vec<PaneEntry> {
    sample_posts(count).iter().map(Post::to_entry).collect()
}

/// Builds an [`App`] wired to an in-memory channel and a recording sink.
pub struct TestAppBuilder {
    username: String,
    posts: Vec<Post>,
    focus: Focus,
    debug_visible: bool,
    notice: Option<String>,
    channel: LocalChannel,
    storage: Option<Storage>,
    config_dir: Option<PathBuf>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            username: String::new(),
            posts: Vec::new(),
            focus: Focus::Message,
            debug_visible: false,
            notice: None,
            channel: LocalChannel::new(),
            storage: None,
            config_dir: None,
        }
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    pub fn with_posts(mut self, posts: Vec<Post>) -> Self {
        self.posts = posts;
        self
    }

    pub fn focus(mut self, focus: Focus) -> Self {
        self.focus = focus;
        self
    }

    pub fn debug_visible(mut self) -> Self {
        self.debug_visible = true;
        self
    }

    pub fn notice(mut self, text: &str) -> Self {
        self.notice = Some(text.to_string());
        self
    }

    /// Share a channel with the test so it can inspect rooms.
    pub fn channel(mut self, channel: LocalChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn config_dir(mut self, dir: PathBuf) -> Self {
        self.config_dir = Some(dir);
        self
    }

    pub fn build(self) -> App {
        let (sink, _log) = RecordingSink::new("terminal");
        let chat = ChatView::mount(Box::new(sink), 1);
        let mut app = App::new(
            Arc::new(self.channel),
            chat,
            AppConfig {
                location: Location::default(),
                username: self.username,
                theme: Theme::default(),
                storage: self.storage,
                config_dir: self.config_dir,
            },
        );
        app.focus = self.focus;
        app.debug.visible = self.debug_visible;
        if !self.posts.is_empty() {
            app.handle_channel_event(ChannelEvent::Snapshot {
                key: app.location_key.clone(),
                posts: self.posts,
            });
        }
        app.notice = self.notice;
        app
    }
}
