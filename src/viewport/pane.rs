//! The scrollable message region of the chat screen.
//!
//! Entries are wrapped to the committed width and stacked top to bottom, one
//! child per entry. Offsets and heights are in terminal rows, so the pane can
//! be observed through [`ScrollContainer`] the same way a browser element
//! would be.

use std::collections::{HashMap, HashSet};

use super::geometry::{
    Child, ContainerId, Extent, Geometry, ItemId, ScrollContainer, ScrollListener, ScrollListeners,
};

/// One message as the pane displays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneEntry {
    pub id: ItemId,
    pub author: String,
    pub content: String,
}

/// A wrapped row. `author_len` is the byte length of the `author:` prefix on
/// the first row of an entry, 0 elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneLine {
    pub text: String,
    pub author_len: usize,
}

pub struct MessagePane {
    id: ContainerId,
    entries: Vec<PaneEntry>,
    wrapped: HashMap<ItemId, Vec<PaneLine>>,
    lines: Vec<PaneLine>,
    children: Vec<Child>,
    width: u16,
    client_height: u16,
    scroll_top: u32,
    scroll_height: u32,
    listeners: ScrollListeners,
    revision: u64,
}

impl Default for MessagePane {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagePane {
    pub fn new() -> Self {
        Self {
            id: ContainerId::next(),
            entries: Vec::new(),
            wrapped: HashMap::new(),
            lines: Vec::new(),
            children: Vec::new(),
            width: 0,
            client_height: 0,
            scroll_top: 0,
            scroll_height: 0,
            listeners: ScrollListeners::default(),
            revision: 0,
        }
    }

    pub fn is_laid_out(&self) -> bool {
        self.width > 0 && self.client_height > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every change that can move a child relative to the window.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub const fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn listener_count(&mut self) -> usize {
        self.listeners.active_count()
    }

    /// Replace the displayed entries with a new snapshot.
    pub fn set_entries(&mut self, entries: Vec<PaneEntry>) {
        if entries == self.entries {
            return;
        }
        self.entries = entries;
        let live: HashSet<&ItemId> = self.entries.iter().map(|e| &e.id).collect();
        self.wrapped.retain(|id, _| live.contains(id));
        self.reflow();
    }

    /// Commit the area the pane occupies. Zero in either dimension means the
    /// pane is not on screen.
    pub fn layout(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.client_height {
            return;
        }
        if width != self.width {
            self.wrapped.clear();
        }
        self.width = width;
        self.client_height = height;
        self.reflow();
    }

    /// Rows currently inside the window.
    pub fn visible_lines(&self) -> &[PaneLine] {
        let start = (self.scroll_top as usize).min(self.lines.len());
        let end = (start + self.client_height as usize).min(self.lines.len());
        &self.lines[start..end]
    }

    pub fn scroll_by(&mut self, delta: i64) {
        let target = (i64::from(self.scroll_top) + delta).max(0);
        self.scroll_to(u32::try_from(target).unwrap_or(u32::MAX));
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-i64::from(self.page_size()));
    }

    pub fn page_down(&mut self) {
        self.scroll_by(i64::from(self.page_size()));
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_to(0);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_to(self.scroll_height);
    }

    fn page_size(&self) -> u16 {
        self.client_height.saturating_sub(1).max(1)
    }

    fn max_scroll_top(&self) -> u32 {
        self.scroll_height.saturating_sub(u32::from(self.client_height))
    }

    /// Move the window, clamping like a browser does. Emits a scroll event when
    /// the offset actually changes.
    fn scroll_to(&mut self, top: u32) {
        let clamped = top.min(self.max_scroll_top());
        if clamped == self.scroll_top {
            return;
        }
        self.scroll_top = clamped;
        self.revision += 1;
        if let Some(geometry) = self.geometry() {
            self.listeners.emit(geometry);
        }
    }

    fn reflow(&mut self) {
        self.revision += 1;
        self.lines.clear();
        self.children.clear();

        if self.width == 0 {
            self.children = self
                .entries
                .iter()
                .map(|entry| Child {
                    id: entry.id.clone(),
                    extent: None,
                })
                .collect();
            self.scroll_height = 0;
            self.scroll_to(0);
            return;
        }

        let width = usize::from(self.width);
        let mut top = 0u32;
        for entry in &self.entries {
            let lines = self
                .wrapped
                .entry(entry.id.clone())
                .or_insert_with(|| wrap_entry(entry, width));
            let height = lines.len() as u32;
            self.children.push(Child {
                id: entry.id.clone(),
                extent: Some(Extent { top, height }),
            });
            self.lines.extend(lines.iter().cloned());
            top += height;
        }
        self.scroll_height = top;

        // Content shrank under the window.
        self.scroll_to(self.scroll_top);
    }
}

fn wrap_entry(entry: &PaneEntry, width: usize) -> Vec<PaneLine> {
    let prefix = format!("{}:", entry.author);
    let text = format!("{prefix} {}", entry.content);
    textwrap::wrap(&text, width)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let author_len = if i == 0 && line.starts_with(&prefix) {
                prefix.len()
            } else {
                0
            };
            PaneLine {
                text: line.into_owned(),
                author_len,
            }
        })
        .collect()
}

impl ScrollContainer for MessagePane {
    fn id(&self) -> ContainerId {
        self.id
    }

    fn geometry(&self) -> Option<Geometry> {
        self.is_laid_out().then_some(Geometry {
            scroll_top: self.scroll_top,
            client_height: u32::from(self.client_height),
            scroll_height: self.scroll_height,
        })
    }

    fn children(&self) -> &[Child] {
        &self.children
    }

    fn set_scroll_top(&mut self, top: u32) {
        self.scroll_to(top);
    }

    fn listen(&mut self) -> ScrollListener {
        self.listeners.register()
    }
}
