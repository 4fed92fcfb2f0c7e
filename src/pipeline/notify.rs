//! "Card ready" notifications from loader threads to the render thread.
//!
//! Loader threads must never touch rendering state. They report finished
//! cards by id through a channel that the render loop drains once per frame.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::model::CardId;

/// Receives a card id whenever a loader settles that card.
///
/// Called from loader threads, in completion order, which is not the order
/// the cards were queued in.
pub trait CardReadyListener: Send + Sync {
    /// The card with this id has finished loading (successfully or not).
    fn card_ready(&self, id: CardId);
}

/// Create a connected sender/receiver pair.
pub fn ready_channel() -> (ReadySender, ReadyReceiver) {
    let (tx, rx) = mpsc::channel();
    (ReadySender { tx }, ReadyReceiver { rx })
}

/// Loader-side end of the ready channel.
#[derive(Debug, Clone)]
pub struct ReadySender {
    tx: Sender<CardId>,
}

impl CardReadyListener for ReadySender {
    fn card_ready(&self, id: CardId) {
        if self.tx.send(id).is_err() {
            log::debug!("Ready receiver dropped, card {} notification lost", id);
        }
    }
}

/// Render-side end of the ready channel.
#[derive(Debug)]
pub struct ReadyReceiver {
    rx: Receiver<CardId>,
}

impl ReadyReceiver {
    /// Take every pending notification without blocking.
    pub fn drain(&self) -> Vec<CardId> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for the next notification.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<CardId> {
        match self.rx.recv_timeout(timeout) {
            Ok(id) => Some(id),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::trace!("All ready senders dropped");
                None
            }
        }
    }
}
