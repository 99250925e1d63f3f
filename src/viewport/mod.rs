//! What the user has seen, and whether the message pane follows new content.

mod geometry;
mod pane;
mod sticky;
mod unread;
mod visibility;

use std::hash::Hash;

pub use geometry::{
    Child, ContainerId, Extent, Geometry, ItemId, ScrollContainer, ScrollListener, ScrollListeners,
    in_view,
};
pub use pane::{MessagePane, PaneEntry, PaneLine};
pub use sticky::{DEFAULT_TOLERANCE, Stickiness, StickyScroll, is_scrolled_up};
pub use unread::{
    IndicatorSink, TerminalTitle, UnreadIndicator, display_unread, indicator_text, unread,
};
pub use visibility::{SeenSet, VisibilityTracker};

/// The mounted chat view: the message pane plus the state observing it.
///
/// Event order inside one pass is fixed by [`ChatView::settle`]: layout is
/// committed first, then stickiness may move the offset, then visibility reads
/// the final geometry, then the indicator is refreshed. Dropping the view
/// releases the scroll listener and restores the indicator.
///
/// The seen-set belongs to one mounted pane. [`ChatView::remount`] starts a
/// new pane and an empty seen-set while keeping the indicator.
pub struct ChatView {
    pane: MessagePane,
    tracker: VisibilityTracker,
    sticky: StickyScroll,
    indicator: UnreadIndicator,
    tolerance: u32,
    observed_revision: Option<u64>,
    mounted: bool,
}

impl ChatView {
    pub fn mount(sink: Box<dyn IndicatorSink>, tolerance: u32) -> Self {
        Self {
            pane: MessagePane::new(),
            tracker: VisibilityTracker::new(),
            sticky: StickyScroll::new(tolerance),
            indicator: UnreadIndicator::new(sink),
            tolerance,
            observed_revision: None,
            mounted: true,
        }
    }

    pub const fn pane(&self) -> &MessagePane {
        &self.pane
    }

    pub fn seen(&self) -> &SeenSet {
        self.tracker.seen()
    }

    pub const fn stickiness(&self) -> Stickiness {
        self.sticky.state()
    }

    pub fn total(&self) -> usize {
        self.pane.len()
    }

    pub fn unread(&self) -> u64 {
        display_unread(self.total(), self.seen().len())
    }

    pub fn indicator_text(&self) -> Option<&str> {
        self.indicator.text()
    }

    pub fn set_entries(&mut self, entries: Vec<PaneEntry>) {
        if self.mounted {
            self.pane.set_entries(entries);
        }
    }

    pub fn layout(&mut self, width: u16, height: u16) {
        if self.mounted {
            self.pane.layout(width, height);
        }
    }

    /// Run stickiness, visibility and the indicator against the committed
    /// layout. `deps` are extra values whose change re-pins the pane while
    /// stuck (the active location key).
    pub fn settle<D: Hash + ?Sized>(&mut self, deps: &D) {
        if !self.mounted {
            return;
        }
        self.sticky.sync(&mut self.pane, deps);

        if self.observed_revision != Some(self.pane.revision()) && self.pane.is_laid_out() {
            self.tracker.observe(&self.pane);
            self.observed_revision = Some(self.pane.revision());
        }

        self.indicator.update(self.pane.len(), self.tracker.seen().len());
    }

    pub fn scroll_by(&mut self, delta: i64) {
        if self.mounted {
            self.pane.scroll_by(delta);
        }
    }

    pub fn page_up(&mut self) {
        if self.mounted {
            self.pane.page_up();
        }
    }

    pub fn page_down(&mut self) {
        if self.mounted {
            self.pane.page_down();
        }
    }

    pub fn scroll_to_top(&mut self) {
        if self.mounted {
            self.pane.scroll_to_top();
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        if self.mounted {
            self.pane.scroll_to_bottom();
        }
    }

    /// Replace the pane with a fresh one for different content. The seen-set
    /// starts empty and the view follows the bottom again. The indicator sink
    /// stays in place and is refreshed on the next settle.
    pub fn remount(&mut self) {
        if !self.mounted {
            return;
        }
        tracing::debug!(seen = self.tracker.seen().len(), "chat view remounted");
        self.sticky.release();
        self.pane = MessagePane::new();
        self.tracker = VisibilityTracker::new();
        self.sticky = StickyScroll::new(self.tolerance);
        self.observed_revision = None;
    }

    /// Detach listeners and restore the indicator. Idempotent.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.sticky.release();
        self.indicator.teardown();
        tracing::debug!(seen = self.tracker.seen().len(), "chat view unmounted");
    }
}

impl Drop for ChatView {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::test_utils::{RecordingSink, SinkLog, pane_entries};

    fn mounted(original: &str) -> (ChatView, Rc<RefCell<SinkLog>>) {
        let (sink, log) = RecordingSink::new(original);
        (ChatView::mount(Box::new(sink), 1), log)
    }

    #[test]
    fn new_messages_are_followed_and_marked_seen() {
        let (mut view, log) = mounted("term");
        view.layout(40, 5);
        view.set_entries(pane_entries(3));
        view.settle("400_-1110");
        assert_eq!(view.unread(), 0);

        view.set_entries(pane_entries(20));
        view.settle("400_-1110");

        assert_eq!(view.pane().scroll_top(), 15);
        assert_eq!(view.stickiness(), Stickiness::Stuck);
        // rows 15..20 are on screen, rows 3..15 arrived off screen
        assert_eq!(view.seen().len(), 8);
        assert_eq!(view.unread(), 12);
        assert_eq!(log.borrow().current, "Unread: 12");
    }

    #[test]
    fn reading_history_pauses_following() {
        let (mut view, _log) = mounted("term");
        view.layout(40, 5);
        view.set_entries(pane_entries(20));
        view.settle(&());
        assert_eq!(view.pane().scroll_top(), 15);

        view.scroll_by(-10);
        view.settle(&());
        assert_eq!(view.stickiness(), Stickiness::Unstuck);

        view.set_entries(pane_entries(25));
        view.settle(&());
        assert_eq!(view.pane().scroll_top(), 5);

        view.scroll_to_bottom();
        view.settle(&());
        assert_eq!(view.stickiness(), Stickiness::Stuck);
        assert_eq!(view.pane().scroll_top(), 20);
    }

    #[test]
    fn scrolling_up_marks_older_messages_seen() {
        let (mut view, log) = mounted("term");
        view.layout(40, 5);
        view.set_entries(pane_entries(10));
        view.settle(&());
        assert_eq!(view.unread(), 5);

        view.scroll_to_top();
        view.settle(&());

        assert_eq!(view.unread(), 0);
        assert_eq!(log.borrow().current, "All read");
    }

    #[test]
    fn dropped_items_never_show_negative_unread() {
        let (mut view, log) = mounted("term");
        view.layout(40, 10);
        view.set_entries(pane_entries(6));
        view.settle(&());

        view.set_entries(pane_entries(2));
        view.settle(&());

        assert_eq!(view.seen().len(), 6);
        assert_eq!(view.unread(), 0);
        assert_eq!(log.borrow().current, "All read");
    }

    #[test]
    fn nothing_is_seen_before_first_layout() {
        let (mut view, _log) = mounted("term");
        view.set_entries(pane_entries(4));
        view.settle(&());

        assert!(view.seen().is_empty());
        assert_eq!(view.unread(), 4);
    }

    #[test]
    fn unmount_restores_title_and_stops_updates() {
        let (mut view, log) = mounted("original title");
        view.layout(40, 3);
        view.set_entries(pane_entries(10));
        view.settle(&());
        assert_eq!(log.borrow().current, "Unread: 7");

        view.unmount();
        view.set_entries(pane_entries(12));
        view.settle(&());
        view.unmount();
        drop(view);

        let log = log.borrow();
        assert_eq!(log.current, "original title");
        assert_eq!(log.restores, 1);
    }

    #[test]
    fn remount_starts_an_empty_seen_set() {
        let (mut view, log) = mounted("term");
        view.layout(40, 5);
        view.set_entries(pane_entries(5));
        view.settle("400_-1110");
        assert_eq!(view.seen().len(), 5);

        view.remount();
        assert!(view.seen().is_empty());
        assert_eq!(view.stickiness(), Stickiness::Stuck);

        let entries: Vec<PaneEntry> = pane_entries(12)
            .into_iter()
            .map(|mut e| {
                e.id = ItemId::new(format!("other-{}", e.id));
                e
            })
            .collect();
        view.layout(40, 5);
        view.set_entries(entries);
        view.settle("100_100");

        assert_eq!(view.pane().scroll_top(), 7);
        assert_eq!(view.unread(), 7);
        assert_eq!(log.borrow().current, "Unread: 7");
        assert_eq!(log.borrow().restores, 0);
    }

    #[test]
    fn unmount_detaches_scroll_listener() {
        let (mut view, _log) = mounted("term");
        view.layout(40, 3);
        view.set_entries(pane_entries(10));
        view.settle(&());
        assert_eq!(view.pane.listener_count(), 1);

        view.unmount();

        assert_eq!(view.pane.listener_count(), 0);
    }
}
