use std::hash::{DefaultHasher, Hash, Hasher};

use super::geometry::{ContainerId, Geometry, ScrollContainer, ScrollListener};

/// Slack below the bottom edge that still counts as "at the bottom".
pub const DEFAULT_TOLERANCE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Stickiness {
    /// Follow new content.
    #[default]
    Stuck,
    /// The user is reading history; leave the offset alone.
    Unstuck,
}

impl Stickiness {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stuck => "following",
            Self::Unstuck => "paused",
        }
    }
}

/// `clientHeight + scrollTop < scrollHeight - tolerance`, without underflow.
pub fn is_scrolled_up(geometry: Geometry, tolerance: u32) -> bool {
    let bottom_edge = i64::from(geometry.client_height) + i64::from(geometry.scroll_top);
    bottom_edge < i64::from(geometry.scroll_height) - i64::from(tolerance)
}

/// Inputs of the last forcing check. The check re-runs when any of them moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FollowKey {
    state: Stickiness,
    scroll_height: u32,
    deps: u64,
}

/// Keeps a scroll container pinned to its bottom edge while the user is there.
#[derive(Debug)]
pub struct StickyScroll {
    state: Stickiness,
    tolerance: u32,
    listener: Option<(ContainerId, ScrollListener)>,
    last_follow: Option<FollowKey>,
}

impl Default for StickyScroll {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl StickyScroll {
    pub fn new(tolerance: u32) -> Self {
        Self {
            state: Stickiness::Stuck,
            tolerance,
            listener: None,
            last_follow: None,
        }
    }

    pub const fn state(&self) -> Stickiness {
        self.state
    }

    pub fn is_stuck(&self) -> bool {
        self.state == Stickiness::Stuck
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// Re-evaluate from a scroll event's geometry. Not a latch: scrolling back
    /// down re-enters `Stuck`.
    pub fn handle_scroll(&mut self, geometry: Geometry) {
        let next = if is_scrolled_up(geometry, self.tolerance) {
            Stickiness::Unstuck
        } else {
            Stickiness::Stuck
        };
        if next != self.state {
            tracing::debug!(
                from = ?self.state,
                to = ?next,
                scroll_top = geometry.scroll_top,
                client_height = geometry.client_height,
                scroll_height = geometry.scroll_height,
                "stickiness changed"
            );
            self.state = next;
        }
    }

    /// Process pending scroll events, then pin to the bottom if content height,
    /// stickiness or `deps` changed while stuck.
    ///
    /// Does nothing until the container reports geometry. Returns true when
    /// the scroll offset was forced.
    pub fn sync<C, D>(&mut self, container: &mut C, deps: &D) -> bool
    where
        C: ScrollContainer + ?Sized,
        D: Hash + ?Sized,
    {
        if container.geometry().is_none() {
            return false;
        }
        self.attach(container);
        if let Some((_, listener)) = self.listener.as_mut() {
            for geometry in listener.drain() {
                self.handle_scroll(geometry);
            }
        }

        let Some(geometry) = container.geometry() else {
            return false;
        };
        let key = FollowKey {
            state: self.state,
            scroll_height: geometry.scroll_height,
            deps: hash_deps(deps),
        };
        if self.last_follow == Some(key) {
            return false;
        }
        self.last_follow = Some(key);

        if self.is_stuck() {
            container.set_scroll_top(geometry.scroll_height);
            // Our own write shows up as a scroll event at the bottom; drop it.
            if let Some((_, listener)) = self.listener.as_mut() {
                for geometry in listener.drain() {
                    self.handle_scroll(geometry);
                }
            }
            true
        } else {
            false
        }
    }

    /// Detach from the container. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some((id, listener)) = self.listener.take() {
            tracing::trace!(?id, "scroll listener released");
            listener.release();
        }
    }

    fn attach<C: ScrollContainer + ?Sized>(&mut self, container: &mut C) {
        let id = container.id();
        if matches!(&self.listener, Some((attached, _)) if *attached == id) {
            return;
        }
        self.release();
        self.listener = Some((id, container.listen()));
        tracing::trace!(?id, "scroll listener attached");
    }
}

impl Drop for StickyScroll {
    fn drop(&mut self) {
        self.release();
    }
}

fn hash_deps<D: Hash + ?Sized>(deps: &D) -> u64 {
    let mut hasher = DefaultHasher::new();
    deps.hash(&mut hasher);
    hasher.finish()
}
