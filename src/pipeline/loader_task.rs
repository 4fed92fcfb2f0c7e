//! The work done for one card on a loader thread.

use std::collections::TryReserveError;
use std::sync::Arc;

use web_time::Instant;

use crate::data::{Bitmap, ImageDecoder};
use crate::model::{Card, CardAssets, LoadStatus};

use super::{CardReadyListener, LoadCounters};

/// Everything a loader thread needs besides the card itself.
pub struct LoaderContext {
    /// Decoder shared by all loader threads
    pub decoder: Arc<dyn ImageDecoder>,
    /// Notified once per settled card
    pub listener: Arc<dyn CardReadyListener>,
    /// Diagnostic counters
    pub counters: Arc<LoadCounters>,
    /// Upper bound on animation frames per card
    pub max_frames: usize,
}

/// Load one card.
///
/// Claims the card, decodes its assets without holding the card lock,
/// commits them, records the allocated bytes and notifies the listener.
/// Returns `None` without doing anything if another loader already claimed
/// the card, so queuing the same card repeatedly is harmless.
pub fn run_loader_task(card: &Card, ctx: &LoaderContext) -> Option<LoadStatus> {
    if !card.try_claim() {
        log::trace!(
            "Card {} ({}) already {:?}, skipping",
            card.id,
            card.archive,
            card.status()
        );
        return None;
    }

    let started = Instant::now();
    let assets = load_assets(card, ctx.decoder.as_ref(), ctx.max_frames);
    let bytes = assets.byte_size();
    let has_title = assets.title.is_some();
    let frame_count = assets.frames.len();

    let status = card.commit(assets);
    ctx.counters.add_bytes(bytes);

    log::debug!(
        "Card {} ({}) {:?} in {:?}: title={}, frames={}, {}kB",
        card.id,
        card.archive,
        status,
        started.elapsed(),
        has_title,
        frame_count,
        bytes / 1024
    );

    ctx.listener.card_ready(card.id);
    Some(status)
}

/// Decode a card's title and animation frames.
///
/// A missing or broken title is not fatal; the frames are still probed.
/// Frames are probed from 0 upwards and probing stops at the first frame that
/// is missing or fails to decode, or at `max_frames`. If the frame list
/// cannot grow, everything decoded so far is dropped.
pub fn load_assets(card: &Card, decoder: &dyn ImageDecoder, max_frames: usize) -> CardAssets {
    let title = match decoder.decode(&card.screenshot_path) {
        Ok(bitmap) => Some(bitmap),
        Err(e) => {
            log::warn!("Card {} ({}): no title image: {}", card.id, card.archive, e);
            None
        }
    };

    match probe_frames(card, decoder, max_frames) {
        Ok(frames) => CardAssets { title, frames },
        Err(e) => {
            log::error!(
                "Card {} ({}): out of memory for frame list: {}",
                card.id,
                card.archive,
                e
            );
            CardAssets::default()
        }
    }
}

fn probe_frames(
    card: &Card,
    decoder: &dyn ImageDecoder,
    max_frames: usize,
) -> Result<Vec<Bitmap>, TryReserveError> {
    let mut frames = Vec::new();
    for index in 0..max_frames {
        let path = card.frame_path(index);
        match decoder.decode(&path) {
            Ok(bitmap) => {
                frames.try_reserve(1)?;
                frames.push(bitmap);
            }
            Err(e) if e.is_not_found() => {
                log::debug!("Card {} ({}): {} frames", card.id, card.archive, index);
                break;
            }
            Err(e) => {
                log::warn!(
                    "Card {} ({}): stopping at frame {}: {}",
                    card.id,
                    card.archive,
                    index,
                    e
                );
                break;
            }
        }
    }
    Ok(frames)
}
