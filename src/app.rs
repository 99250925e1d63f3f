use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::channel::{
    ChannelEvent, Location, LocationKey, MessageChannel, NewPost, Post, Subscription,
};
use crate::input::InputField;
use crate::settings::{self, Settings};
use crate::storage::{Storage, USERNAME_KEY};
use crate::theme::Theme;
use crate::viewport::ChatView;
use crate::views;

const LOCATION_COMMAND: &str = "/loc";
const LOCATION_USAGE: &str = "Usage: /loc <latitude> <longitude>";

#[derive(Debug)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

/// Debug panel state: a ring of recent log lines.
#[derive(Debug, Default)]
pub struct DebugState {
    pub visible: bool,
    pub log: VecDeque<LogEntry>,
}

impl DebugState {
    const MAX_LOG_ENTRIES: usize = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        let message = msg.into();
        tracing::debug!("{message}");
        self.log.push_back(LogEntry {
            at: Local::now(),
            message,
        });
        if self.log.len() > Self::MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    Username,
    #[default]
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    ToggleDebug,
    FocusNext,
    Submit,
    Input(char),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    ClearInput,
    ScrollBy(i64),
    PageUp,
    PageDown,
    ScrollTop,
    ScrollBottom,
}

/// Startup values for an [`App`].
pub struct AppConfig {
    pub location: Location,
    pub username: String,
    pub theme: Theme,
    pub storage: Option<Storage>,
    pub config_dir: Option<PathBuf>,
}

pub struct App {
    pub location: Location,
    pub location_key: LocationKey,
    pub username: InputField,
    pub draft: InputField,
    pub focus: Focus,
    /// Posts of the current room, oldest first.
    pub posts: Vec<Post>,
    pub chat: ChatView,
    pub theme: Theme,
    pub notice: Option<String>,
    pub should_quit: bool,
    pub debug: DebugState,
    // Channel events
    pub event_tx: mpsc::Sender<ChannelEvent>,
    pub event_rx: mpsc::Receiver<ChannelEvent>,
    channel: Arc<dyn MessageChannel>,
    subscription: Option<Subscription>,
    // Persistence
    storage: Option<Storage>,
    config_dir: Option<PathBuf>,
    committed_username: String,
}

impl App {
    pub fn new(channel: Arc<dyn MessageChannel>, chat: ChatView, config: AppConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(16);
        Self {
            location_key: config.location.key(),
            location: config.location,
            username: InputField::new(config.username.clone()),
            draft: InputField::default(),
            focus: Focus::default(),
            posts: Vec::new(),
            chat,
            theme: config.theme,
            notice: None,
            should_quit: false,
            debug: DebugState::new(),
            event_tx,
            event_rx,
            channel,
            subscription: None,
            storage: config.storage,
            config_dir: config.config_dir,
            committed_username: config.username,
        }
    }

    /// Subscribe to the current room. Must run inside a tokio runtime.
    pub fn start(&mut self) {
        self.subscribe();
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| s.is_active() && s.key() == &self.location_key)
    }

    fn subscribe(&mut self) {
        // The old subscription is cancelled before the new one starts.
        self.subscription = None;
        let subscription = self
            .channel
            .subscribe(&self.location_key, self.event_tx.clone());
        self.debug.log(format!("Subscribed to {}", self.location_key));
        self.subscription = Some(subscription);
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        if event.key() != &self.location_key {
            self.debug
                .log(format!("Update for {} discarded (stale)", event.key()));
            return;
        }
        match event {
            ChannelEvent::Snapshot { posts, .. } => {
                self.debug.log(format!(
                    "Snapshot for {}: {} posts",
                    self.location_key,
                    posts.len()
                ));
                self.chat
                    .set_entries(posts.iter().map(Post::to_entry).collect());
                self.posts = posts;
                self.notice = None;
            }
            ChannelEvent::Failed { error, .. } => {
                self.debug.log(format!("Channel failed: {error}"));
                self.notice = Some(error.user_message());
            }
        }
    }

    /// Commit the terminal area to the message pane and settle the chat view.
    pub fn layout(&mut self, area: Rect) {
        let pane = views::chat::pane_area(area, self.debug.visible);
        self.chat.layout(pane.width, pane.height);
        self.chat.settle(&(&self.location_key, self.posts.len()));
    }

    pub fn update(&mut self, msg: Message) {
        match msg {
            Message::Quit => self.should_quit = true,
            Message::ToggleDebug => self.debug.toggle(),
            Message::FocusNext => self.focus_next(),
            Message::Submit => self.submit(),
            Message::Input(c) => self.focused_input().insert(c),
            Message::Backspace => self.focused_input().backspace(),
            Message::Delete => self.focused_input().delete(),
            Message::CursorLeft => self.focused_input().move_left(),
            Message::CursorRight => self.focused_input().move_right(),
            Message::CursorHome => self.focused_input().move_home(),
            Message::CursorEnd => self.focused_input().move_end(),
            Message::ClearInput => self.focused_input().clear(),
            Message::ScrollBy(delta) => self.chat.scroll_by(delta),
            Message::PageUp => self.chat.page_up(),
            Message::PageDown => self.chat.page_down(),
            Message::ScrollTop => self.chat.scroll_to_top(),
            Message::ScrollBottom => self.chat.scroll_to_bottom(),
        }
    }

    fn focused_input(&mut self) -> &mut InputField {
        match self.focus {
            Focus::Username => &mut self.username,
            Focus::Message => &mut self.draft,
        }
    }

    fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Username => {
                self.commit_username();
                Focus::Message
            }
            Focus::Message => Focus::Username,
        };
    }

    fn submit(&mut self) {
        match self.focus {
            Focus::Username => {
                self.commit_username();
                self.focus = Focus::Message;
            }
            Focus::Message => self.send_draft(),
        }
    }

    /// Remember the display name if it changed since the last commit.
    fn commit_username(&mut self) {
        let name = self.username.value().to_string();
        if name == self.committed_username {
            return;
        }
        if let Some(storage) = &self.storage
            && let Err(e) = storage.queue_preference(USERNAME_KEY, &name)
        {
            self.debug.log(format!("Failed to save username: {e}"));
            return;
        }
        self.debug.log(format!("Username set to '{name}'"));
        self.committed_username = name;
    }

    fn send_draft(&mut self) {
        let text = self.draft.take();
        let mut words = text.split_whitespace();
        if words.next() == Some(LOCATION_COMMAND) {
            match parse_location(words) {
                Ok(location) => self.relocate(location),
                Err(e) => {
                    self.notice = Some(e);
                    self.draft = InputField::new(text);
                }
            }
            return;
        }
        if text.trim().is_empty() {
            return;
        }

        self.commit_username();
        let post = NewPost::new(self.location, self.username.value(), text);
        self.debug.log(format!(
            "Sending as {} to {}",
            post.username, self.location_key
        ));
        self.channel.add_post(&self.location_key, post);
    }

    /// Move to another room. The chat view is remounted, so the new room
    /// starts with nothing seen and follows its newest message.
    fn relocate(&mut self, location: Location) {
        self.location = location;
        self.persist_location();

        let key = location.key();
        if key == self.location_key {
            self.debug.log(format!("Already in {key}"));
            return;
        }
        self.debug
            .log(format!("Relocating {} -> {key}", self.location_key));
        self.location_key = key;
        self.posts.clear();
        self.chat.remount();
        self.notice = None;
        self.subscribe();
    }

    fn persist_location(&mut self) {
        let Some(config_dir) = &self.config_dir else {
            return;
        };
        let path = settings::settings_path(config_dir);
        let mut current = match Settings::load(&path) {
            Ok(current) => current,
            Err(e) if path.exists() => {
                self.debug.log(format!("Won't save: {e}"));
                return;
            }
            Err(_) => Settings::default(),
        };
        current.latitude = Some(self.location.latitude);
        current.longitude = Some(self.location.longitude);
        if let Err(e) = current.save(&path) {
            self.debug.log(format!("Failed to save settings: {e}"));
        }
    }
}

fn parse_location<'a>(mut args: impl Iterator<Item = &'a str>) -> Result<Location, String> {
    let (Some(lat), Some(lon), None) = (args.next(), args.next(), args.next()) else {
        return Err(LOCATION_USAGE.to_string());
    };
    let parse = |value: &str| value.parse::<f64>().ok().filter(|v| v.is_finite());
    match (parse(lat), parse(lon)) {
        (Some(latitude), Some(longitude))
            if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) =>
        {
            Ok(Location::new(latitude, longitude))
        }
        _ => Err(format!("Not a location: {lat} {lon}")),
    }
}
