//! Card data model: one selectable game and its load state.
//!
//! Each card owns a mutex around its mutable state. Loader threads claim a
//! card under the lock, decode without it, and re-lock only to commit the
//! result. The renderer takes the same lock briefly to read bitmaps.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::constants::FRAME_PLACEHOLDER;
use crate::data::Bitmap;

use super::Emulator;

/// Stable card identifier: the card's index in the sorted store.
pub type CardId = usize;

/// Asset load status of a card.
///
/// Transitions only `NotRequested -> Loading -> {Loaded, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// No loader has claimed the card yet
    #[default]
    NotRequested,
    /// A loader has claimed the card and is decoding
    Loading,
    /// The title image or at least one animation frame decoded
    Loaded,
    /// Nothing decoded; the renderer shows a placeholder
    Error,
}

impl LoadStatus {
    /// Whether the status is final.
    pub fn is_settled(self) -> bool {
        matches!(self, LoadStatus::Loaded | LoadStatus::Error)
    }
}

/// Decoded images belonging to a card.
#[derive(Debug, Default)]
pub struct CardAssets {
    /// Title screenshot, absent if it failed to decode
    pub title: Option<Bitmap>,
    /// Animation frames in playback order
    pub frames: Vec<Bitmap>,
}

impl CardAssets {
    /// Whether no image at all decoded.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.frames.is_empty()
    }

    /// Total size of all pixel buffers in bytes.
    pub fn byte_size(&self) -> usize {
        self.title.as_ref().map_or(0, Bitmap::byte_size)
            + self.frames.iter().map(Bitmap::byte_size).sum::<usize>()
    }
}

/// Mutable part of a card, only reachable through the card's lock.
#[derive(Debug, Default)]
pub struct CardState {
    status: LoadStatus,
    assets: CardAssets,
    /// Current playback frame
    frame: usize,
}

impl CardState {
    /// Current load status.
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// Title screenshot, if loaded.
    pub fn title(&self) -> Option<&Bitmap> {
        self.assets.title.as_ref()
    }

    /// All animation frames.
    pub fn frames(&self) -> &[Bitmap] {
        &self.assets.frames
    }

    /// Number of animation frames.
    pub fn frame_count(&self) -> usize {
        self.assets.frames.len()
    }

    /// Index of the frame currently playing.
    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// Bitmap the renderer should show right now: the current animation
    /// frame if there are any, else the title. `None` means placeholder.
    pub fn display_bitmap(&self) -> Option<&Bitmap> {
        self.assets
            .frames
            .get(self.frame)
            .or(self.assets.title.as_ref())
    }
}

/// One selectable game entry.
#[derive(Debug)]
pub struct Card {
    /// Index in the sorted store
    pub id: CardId,
    /// ROM archive name, also the key persisted as the last selection
    pub archive: String,
    /// Display title
    pub title: String,
    /// Extra launch arguments
    pub args: String,
    /// Title screenshot location
    pub screenshot_path: PathBuf,
    /// Emulator used to launch the card
    pub emulator: Option<Arc<Emulator>>,
    /// Frame path pattern with only the frame placeholder left
    frame_pattern: String,
    state: Mutex<CardState>,
}

impl Card {
    /// Create a card in the `NotRequested` state.
    ///
    /// `frame_pattern` must contain the frame placeholder; it is replaced
    /// with the zero-based frame number when probing for animation frames.
    pub fn new(
        id: CardId,
        archive: impl Into<String>,
        screenshot_path: impl Into<PathBuf>,
        frame_pattern: impl Into<String>,
    ) -> Self {
        let archive = archive.into();
        Self {
            id,
            title: archive.clone(),
            archive,
            args: String::new(),
            screenshot_path: screenshot_path.into(),
            emulator: None,
            frame_pattern: frame_pattern.into(),
            state: Mutex::new(CardState::default()),
        }
    }

    /// Set the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the extra launch arguments.
    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = args.into();
        self
    }

    /// Attach the emulator profile.
    pub fn with_emulator(mut self, emulator: Arc<Emulator>) -> Self {
        self.emulator = Some(emulator);
        self
    }

    /// Location of animation frame `index`.
    pub fn frame_path(&self, index: usize) -> PathBuf {
        PathBuf::from(
            self.frame_pattern
                .replace(FRAME_PLACEHOLDER, &index.to_string()),
        )
    }

    /// Lock the card's state.
    ///
    /// A loader that panicked while holding the lock leaves the state intact
    /// (commits are single assignments), so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, CardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current load status.
    pub fn status(&self) -> LoadStatus {
        self.lock().status
    }

    /// Claim the card for loading.
    ///
    /// Returns `true` only for the single caller that observes
    /// `NotRequested`; every later caller gets `false`.
    pub fn try_claim(&self) -> bool {
        let mut state = self.lock();
        if state.status != LoadStatus::NotRequested {
            return false;
        }
        state.status = LoadStatus::Loading;
        true
    }

    /// Store the decoded assets and settle the status.
    ///
    /// The card ends `Loaded` if anything decoded, `Error` otherwise. A card
    /// that was not claimed keeps its status and the assets are dropped.
    pub fn commit(&self, assets: CardAssets) -> LoadStatus {
        let mut state = self.lock();
        if state.status != LoadStatus::Loading {
            log::warn!(
                "Card {} ({}) committed while {:?}, ignoring",
                self.id,
                self.archive,
                state.status
            );
            return state.status;
        }

        state.status = if assets.is_empty() {
            LoadStatus::Error
        } else {
            LoadStatus::Loaded
        };
        state.assets = assets;
        state.frame = 0;
        state.status
    }

    /// Step the animation to the next frame, wrapping at the end.
    ///
    /// Returns the new frame index, or `None` if the card has no frames.
    pub fn advance_frame(&self) -> Option<usize> {
        let mut state = self.lock();
        let count = state.assets.frames.len();
        if count == 0 {
            return None;
        }
        state.frame = (state.frame + 1) % count;
        Some(state.frame)
    }

    /// Free all decoded bitmaps and return the number of bytes released.
    ///
    /// Blocks until no loader holds the card's lock. The status is left as
    /// is so the card is never loaded again.
    pub fn release(&self) -> usize {
        let mut state = self.lock();
        let bytes = state.assets.byte_size();
        state.assets = CardAssets::default();
        state.frame = 0;
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card::new(0, "sf2", "images/sf2.png", "images/sf2/{frame}.png")
    }

    fn bitmap() -> Bitmap {
        Bitmap::new(1, 1, vec![0; 4])
    }

    #[test]
    fn test_new_card_defaults() {
        let card = card();
        assert_eq!(card.title, "sf2");
        assert_eq!(card.status(), LoadStatus::NotRequested);
        assert!(card.lock().display_bitmap().is_none());
    }

    #[test]
    fn test_frame_path_substitutes_index() {
        assert_eq!(card().frame_path(12), PathBuf::from("images/sf2/12.png"));
    }

    #[test]
    fn test_claim_only_once() {
        let card = card();
        assert!(card.try_claim());
        assert!(!card.try_claim());
        assert_eq!(card.status(), LoadStatus::Loading);
    }

    #[test]
    fn test_commit_title_only_is_loaded() {
        let card = card();
        card.try_claim();
        let status = card.commit(CardAssets {
            title: Some(bitmap()),
            frames: Vec::new(),
        });
        assert_eq!(status, LoadStatus::Loaded);
        assert!(card.lock().title().is_some());
    }

    #[test]
    fn test_commit_nothing_is_error() {
        let card = card();
        card.try_claim();
        assert_eq!(card.commit(CardAssets::default()), LoadStatus::Error);
        // Settled cards cannot be claimed again
        assert!(!card.try_claim());
    }

    #[test]
    fn test_commit_without_claim_is_ignored() {
        let card = card();
        let status = card.commit(CardAssets {
            title: Some(bitmap()),
            frames: Vec::new(),
        });
        assert_eq!(status, LoadStatus::NotRequested);
        assert!(card.lock().title().is_none());
    }

    #[test]
    fn test_status_never_regresses_after_settle() {
        let card = card();
        card.try_claim();
        card.commit(CardAssets::default());
        card.commit(CardAssets {
            title: Some(bitmap()),
            frames: Vec::new(),
        });
        assert_eq!(card.status(), LoadStatus::Error);
    }

    #[test]
    fn test_advance_frame_wraps() {
        let card = card();
        assert_eq!(card.advance_frame(), None);

        card.try_claim();
        card.commit(CardAssets {
            title: None,
            frames: vec![bitmap(), bitmap(), bitmap()],
        });
        assert_eq!(card.advance_frame(), Some(1));
        assert_eq!(card.advance_frame(), Some(2));
        assert_eq!(card.advance_frame(), Some(0));
    }

    #[test]
    fn test_display_bitmap_prefers_frames() {
        let card = card();
        card.try_claim();
        card.commit(CardAssets {
            title: Some(Bitmap::new(2, 1, vec![0; 8])),
            frames: vec![bitmap()],
        });
        assert_eq!(card.lock().display_bitmap().unwrap().width, 1);
    }

    #[test]
    fn test_release_frees_assets() {
        let card = card();
        card.try_claim();
        card.commit(CardAssets {
            title: Some(bitmap()),
            frames: vec![bitmap(), bitmap()],
        });
        assert_eq!(card.release(), 12);
        assert_eq!(card.lock().frame_count(), 0);
        assert_eq!(card.status(), LoadStatus::Loaded);
    }
}
