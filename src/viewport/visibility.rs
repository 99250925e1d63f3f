use std::collections::HashSet;

use super::geometry::{ItemId, ScrollContainer, in_view};

/// Identities the viewport has shown at least once. Never shrinks.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    members: HashSet<ItemId>,
    order: Vec<ItemId>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.members.contains(id)
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: ItemId) -> bool {
        if self.members.insert(id.clone()) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    /// Ids in the order they were first seen.
    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.order.iter()
    }
}

/// Accumulates the children of a scroll container that have been in view.
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    seen: SeenSet,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Adds every unseen child currently overlapping the visible window.
    ///
    /// Reads the container only. Children without a laid-out extent, or a
    /// container without geometry, contribute nothing.
    pub fn observe<C: ScrollContainer + ?Sized>(&mut self, container: &C) -> &SeenSet {
        let Some(viewport) = container.geometry() else {
            return &self.seen;
        };

        let newly_visible: Vec<ItemId> = container
            .children()
            .iter()
            .filter(|child| !self.seen.contains(&child.id))
            .filter(|child| child.extent.is_some_and(|extent| in_view(viewport, extent)))
            .map(|child| child.id.clone())
            .collect();

        if !newly_visible.is_empty() {
            tracing::trace!(count = newly_visible.len(), "items came into view");
        }
        for id in newly_visible {
            self.seen.insert(id);
        }
        &self.seen
    }
}
