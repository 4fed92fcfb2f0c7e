//! Preload window around the selected card.
//!
//! The carousel is a ring, so the window wraps around both ends of the card
//! list instead of being clamped.

use std::sync::Arc;

use crate::model::{Card, CardId, CardStore, LoadStatus};

use super::WorkQueue;

/// Card indices within `margin` of `current`, in order from
/// `current - margin` to `current + margin`, wrapping modulo `count`.
///
/// The margin is clamped to `count / 2`, so the window never holds more
/// than `count` entries. When that still wraps onto itself (even counts) the
/// repeated index is kept once, at its first position. An empty store yields
/// an empty window.
pub fn preload_window(current: CardId, count: usize, margin: usize) -> Vec<CardId> {
    if count == 0 {
        return Vec::new();
    }

    let current = current % count;
    let margin = margin.min(count / 2);
    // current + count - margin never underflows since margin <= count
    let first = current + count - margin;

    let mut window = Vec::with_capacity(2 * margin + 1);
    for offset in 0..=2 * margin {
        let index = (first + offset) % count;
        if !window.contains(&index) {
            window.push(index);
        }
    }
    window
}

/// Queues loads for the cards around the selection. Runs on the render thread.
#[derive(Debug, Clone, Copy)]
pub struct PreloadScheduler {
    margin: usize,
}

impl PreloadScheduler {
    /// Create a scheduler preloading `margin` cards on each side.
    pub fn new(margin: usize) -> Self {
        Self { margin }
    }

    /// Number of cards preloaded on each side of the selection.
    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Queue every card in the window around `current` that has not been
    /// requested yet. Returns the number of cards queued.
    ///
    /// The status check races with the loaders: a card may be queued twice
    /// before its first load starts. The loader's claim turns the second
    /// request into a no-op.
    pub fn preload(
        &self,
        current: CardId,
        cards: &CardStore,
        queue: &WorkQueue<Arc<Card>>,
    ) -> usize {
        let mut queued = 0;
        for index in preload_window(current, cards.len(), self.margin) {
            let Some(card) = cards.get(index) else {
                continue;
            };
            if card.status() == LoadStatus::NotRequested {
                queue.enqueue(Arc::clone(card));
                queued += 1;
            }
        }
        if queued > 0 {
            log::debug!("Preload around card {}: queued {} cards", current, queued);
        }
        queued
    }
}
