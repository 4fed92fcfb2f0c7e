//! Launcher application context.
//!
//! Owns everything the render thread works with:
//! - the card store and the current selection
//! - the loader pipeline and the receiving end of its ready notifications
//! - the quit flag shared with the dispatcher thread
//! - the two on-screen slots (outgoing and incoming card)
//!
//! The renderer itself is external. It feeds input through
//! [`Launcher::handle_input`], calls [`Launcher::poll_ready`] and
//! [`Launcher::advance_animation`] once per frame, and re-binds the textures
//! of the card ids those return.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{AppConfig, ConfigError};
use crate::constants::VISIBLE_SLOTS;
use crate::controls::{Control, ControlBindings, InputEvent};
use crate::data::ImageDecoder;
use crate::launch::LaunchCommand;
use crate::model::{Card, CardId, CardStore, LoadStatus};
use crate::pipeline::{
    LoaderPipeline, LoaderSettings, PipelineError, PreloadScheduler, ReadyReceiver, ready_channel,
};
use crate::session::SessionError;

// ============================================================================
// Errors
// ============================================================================

/// Errors that stop the launcher.
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("No game sets configured")]
    NoCards,
}

// ============================================================================
// Launcher
// ============================================================================

/// The launcher's state, owned by the render thread.
pub struct Launcher {
    cards: CardStore,
    selected: CardId,
    previous: CardId,
    quit: Arc<AtomicBool>,
    pipeline: LoaderPipeline,
    ready: ReadyReceiver,
    scheduler: PreloadScheduler,
    bindings: ControlBindings,
    /// Outgoing and incoming card on screen
    slots: [Option<CardId>; VISIBLE_SLOTS],
}

impl Launcher {
    /// Build the card store from `config` and start the loader pipeline.
    ///
    /// Asset paths are resolved against `base_dir`. The selection starts at
    /// the card whose archive is `last_selected`, or at the first card.
    pub fn new(
        config: &AppConfig,
        base_dir: &Path,
        decoder: Arc<dyn ImageDecoder>,
        last_selected: Option<&str>,
    ) -> Result<Self, LauncherError> {
        let cards = CardStore::from_config(config, base_dir)?;
        Self::with_store(
            cards,
            LoaderSettings::from(&config.preferences),
            PreloadScheduler::new(config.preferences.preload_margin),
            config.controls.to_bindings(),
            decoder,
            last_selected,
        )
    }

    /// Start the launcher over an already-built card store.
    pub fn with_store(
        cards: CardStore,
        settings: LoaderSettings,
        scheduler: PreloadScheduler,
        bindings: ControlBindings,
        decoder: Arc<dyn ImageDecoder>,
        last_selected: Option<&str>,
    ) -> Result<Self, LauncherError> {
        if cards.is_empty() {
            return Err(LauncherError::NoCards);
        }

        let selected = match last_selected {
            Some(archive) => cards.position_of_archive(archive).unwrap_or_else(|| {
                log::info!("Last selected {:?} is no longer configured", archive);
                0
            }),
            None => 0,
        };

        let quit = Arc::new(AtomicBool::new(false));
        let (tx, ready) = ready_channel();
        let pipeline = LoaderPipeline::start(settings, decoder, Arc::new(tx), Arc::clone(&quit))?;

        let mut slots = [None; VISIBLE_SLOTS];
        slots[VISIBLE_SLOTS - 1] = Some(selected);

        Ok(Self {
            cards,
            selected,
            previous: selected,
            quit,
            pipeline,
            ready,
            scheduler,
            bindings,
            slots,
        })
    }

    /// Queue the initial preload around the starting selection.
    pub fn start(&self) {
        log::info!(
            "Starting at card {} of {} ({})",
            self.selected,
            self.cards.len(),
            self.selected_card().archive
        );
        self.preload();
    }

    /// The card store.
    pub fn cards(&self) -> &CardStore {
        &self.cards
    }

    /// Index of the selected card.
    pub fn selected(&self) -> CardId {
        self.selected
    }

    /// Index of the card selected before the last move.
    pub fn previous(&self) -> CardId {
        self.previous
    }

    /// The selected card.
    pub fn selected_card(&self) -> &Arc<Card> {
        &self.cards[self.selected]
    }

    /// Card ids currently on screen, outgoing first.
    pub fn slots(&self) -> [Option<CardId>; VISIBLE_SLOTS] {
        self.slots
    }

    /// Shared quit flag. Set by the launcher on quit or launch, and by the
    /// dispatcher if the pipeline fails.
    pub fn quit_flag(&self) -> &Arc<AtomicBool> {
        &self.quit
    }

    /// Whether the render loop should stop.
    pub fn should_quit(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }

    /// Ask the render loop to stop.
    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::Release);
    }

    /// Move the selection one card right, wrapping at the end.
    pub fn go_next(&mut self) {
        let next = (self.selected + 1) % self.cards.len();
        self.select(next);
    }

    /// Move the selection one card left, wrapping at the start.
    pub fn go_previous(&mut self) {
        let count = self.cards.len();
        let previous = (self.selected + count - 1) % count;
        self.select(previous);
    }

    fn select(&mut self, id: CardId) {
        self.previous = self.selected;
        self.selected = id;
        self.slots = [Some(self.previous), Some(self.selected)];
        log::debug!("Selected card {} ({})", id, self.selected_card().title);
        self.preload();
    }

    fn preload(&self) {
        self.scheduler
            .preload(self.selected, &self.cards, self.pipeline.queue());
    }

    /// Apply one input event.
    ///
    /// Returns the command to run if the event launched a card.
    pub fn handle_input(&mut self, event: &InputEvent) -> Option<LaunchCommand> {
        let control = self.bindings.control_for(event)?;
        log::trace!("{:?} -> {:?}", event, control);

        match control {
            Control::Previous => self.go_previous(),
            Control::Next => self.go_next(),
            Control::Launch => return self.launch_selected(),
            Control::Quit => {
                log::info!("Quit requested");
                self.request_quit();
            }
        }
        None
    }

    /// Build the command for the selected card and request quit so the
    /// launcher shuts down before the emulator runs.
    ///
    /// Returns `None` and keeps running if the card has no emulator.
    pub fn launch_selected(&self) -> Option<LaunchCommand> {
        let card = self.selected_card();
        match LaunchCommand::for_card(card) {
            Some(command) => {
                log::info!("Launching {} with {:?}", card.archive, command.program);
                self.request_quit();
                Some(command)
            }
            None => {
                log::warn!("Card {} has no emulator, cannot launch", card.archive);
                None
            }
        }
    }

    /// Take pending ready notifications.
    ///
    /// Returns the ids of settled cards that are on screen, once each; their
    /// textures must be re-bound. Notifications for other cards are dropped,
    /// their assets are picked up when they scroll into view.
    pub fn poll_ready(&self) -> Vec<CardId> {
        let mut rebind = Vec::new();
        for id in self.ready.drain() {
            if self.is_visible(id) && !rebind.contains(&id) {
                rebind.push(id);
            } else {
                log::trace!("Card {} ready off screen", id);
            }
        }
        rebind
    }

    fn is_visible(&self, id: CardId) -> bool {
        self.slots.contains(&Some(id))
    }

    /// Step the animation of every visible card that has frames.
    ///
    /// Returns the ids whose displayed frame changed.
    pub fn advance_animation(&self) -> Vec<CardId> {
        let mut changed = Vec::new();
        for id in self.slots.iter().flatten() {
            if changed.contains(id) {
                continue;
            }
            let Some(card) = self.cards.get(*id) else {
                continue;
            };
            if card.status() == LoadStatus::Loaded && card.advance_frame().is_some() {
                changed.push(*id);
            }
        }
        changed
    }

    /// Stop the pipeline, wait for every loader, free all cards.
    ///
    /// Returns the archive of the selected card for the session state.
    pub fn shutdown(self) -> Result<String, LauncherError> {
        let Self {
            cards,
            selected,
            mut pipeline,
            ..
        } = self;

        let archive = cards
            .get(selected)
            .map(|card| card.archive.clone())
            .unwrap_or_default();

        pipeline.shutdown()?;
        let counters = Arc::clone(pipeline.counters());
        // Releases the queued requests still holding card references
        drop(pipeline);

        let freed = cards.destroy();
        counters.release_bytes(freed);
        log::info!("Launcher shut down, last selected {}", archive);
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Emulator;
    use crate::pipeline::test_support::{MockDecoder, frame_path, title_path};
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn card(id: CardId, archive: &str) -> Card {
        Card::new(
            id,
            archive,
            format!("{}.png", archive),
            format!("{}/{{frame}}.png", archive),
        )
    }

    fn launcher(count: usize, margin: usize, decoder: MockDecoder) -> Launcher {
        let cards = CardStore::new((0..count).map(|id| card(id, &format!("g{}", id))).collect());
        launcher_with(cards, margin, decoder, None)
    }

    fn launcher_with(
        cards: CardStore,
        margin: usize,
        decoder: MockDecoder,
        last_selected: Option<&str>,
    ) -> Launcher {
        Launcher::with_store(
            cards,
            LoaderSettings {
                worker_count: 2,
                max_frames: 10,
            },
            PreloadScheduler::new(margin),
            ControlBindings::default(),
            Arc::new(decoder),
            last_selected,
        )
        .unwrap()
    }

    fn titles(count: usize) -> MockDecoder {
        let mut decoder = MockDecoder::new();
        for id in 0..count {
            decoder = decoder.with_image(title_path(&format!("g{}", id)));
        }
        decoder
    }

    /// Poll until `id` is reported or the timeout passes; returns every id seen.
    fn poll_until(launcher: &Launcher, id: CardId) -> Vec<CardId> {
        let deadline = Instant::now() + TIMEOUT;
        let mut seen = Vec::new();
        while Instant::now() < deadline && !seen.contains(&id) {
            seen.extend(launcher.poll_ready());
            std::thread::sleep(Duration::from_millis(5));
        }
        seen
    }

    fn key(name: &str) -> InputEvent {
        InputEvent::Key(name.to_string())
    }

    #[test]
    fn test_empty_store_rejected() {
        let result = Launcher::with_store(
            CardStore::default(),
            LoaderSettings {
                worker_count: 1,
                max_frames: 1,
            },
            PreloadScheduler::new(2),
            ControlBindings::default(),
            Arc::new(MockDecoder::new()),
            None,
        );
        assert!(matches!(result, Err(LauncherError::NoCards)));
    }

    #[test]
    fn test_navigation_wraps() {
        let mut launcher = launcher(5, 0, MockDecoder::new());
        assert_eq!(launcher.selected(), 0);
        assert_eq!(launcher.slots(), [None, Some(0)]);

        launcher.go_previous();
        assert_eq!(launcher.selected(), 4);
        assert_eq!(launcher.previous(), 0);
        assert_eq!(launcher.slots(), [Some(0), Some(4)]);

        launcher.go_next();
        launcher.go_next();
        assert_eq!(launcher.selected(), 1);
        assert_eq!(launcher.slots(), [Some(0), Some(1)]);
        launcher.shutdown().unwrap();
    }

    #[test]
    fn test_start_preloads_window() {
        let launcher = launcher(10, 2, titles(10));
        let cards: Vec<_> = launcher.cards().iter().cloned().collect();
        launcher.start();

        // Shutdown finishes every request queued before it
        let archive = launcher.shutdown().unwrap();
        assert_eq!(archive, "g0");

        for id in [8, 9, 0, 1, 2] {
            assert_eq!(cards[id].status(), LoadStatus::Loaded, "card {}", id);
        }
        for id in 3..8 {
            assert_eq!(cards[id].status(), LoadStatus::NotRequested, "card {}", id);
        }
    }

    #[test]
    fn test_preload_window_cards_settle() {
        let decoder = titles(10);
        let mut launcher = launcher(10, 1, decoder);
        launcher.start();
        launcher.go_next();
        poll_until(&launcher, 1);

        for id in [9, 0, 1, 2] {
            let deadline = Instant::now() + TIMEOUT;
            while launcher.cards().get(id).unwrap().status() != LoadStatus::Loaded
                && Instant::now() < deadline
            {
                std::thread::sleep(Duration::from_millis(5));
            }
            assert_eq!(launcher.cards().get(id).unwrap().status(), LoadStatus::Loaded);
        }
        for id in 3..9 {
            assert_eq!(
                launcher.cards().get(id).unwrap().status(),
                LoadStatus::NotRequested
            );
        }
        launcher.shutdown().unwrap();
    }

    #[test]
    fn test_poll_ready_reports_only_visible_cards() {
        let launcher = launcher(10, 2, titles(10));
        launcher.start();

        let seen = poll_until(&launcher, 0);
        assert_eq!(seen, vec![0]);
        launcher.shutdown().unwrap();
    }

    #[test]
    fn test_advance_animation_steps_visible_frames() {
        let decoder = MockDecoder::new()
            .with_image(frame_path("g0", 0))
            .with_image(frame_path("g0", 1))
            .with_image(frame_path("g0", 2))
            .with_image(title_path("g1"));
        let launcher = launcher(2, 0, decoder);
        launcher.start();
        poll_until(&launcher, 0);

        assert_eq!(launcher.advance_animation(), vec![0]);
        assert_eq!(launcher.selected_card().lock().frame_index(), 1);
        launcher.advance_animation();
        launcher.advance_animation();
        assert_eq!(launcher.selected_card().lock().frame_index(), 0);
        launcher.shutdown().unwrap();
    }

    #[test]
    fn test_advance_animation_skips_title_only_cards() {
        let launcher = launcher(1, 0, titles(1));
        launcher.start();
        poll_until(&launcher, 0);
        assert!(launcher.advance_animation().is_empty());
        launcher.shutdown().unwrap();
    }

    #[test]
    fn test_last_selected_restored() {
        let cards = CardStore::new(vec![card(0, "a"), card(1, "b"), card(2, "c")]);
        let launcher = launcher_with(cards, 0, MockDecoder::new(), Some("c"));
        assert_eq!(launcher.selected(), 2);
        launcher.shutdown().unwrap();

        let cards = CardStore::new(vec![card(0, "a"), card(1, "b")]);
        let launcher = launcher_with(cards, 0, MockDecoder::new(), Some("gone"));
        assert_eq!(launcher.selected(), 0);
        launcher.shutdown().unwrap();
    }

    #[test]
    fn test_input_moves_and_quits() {
        let mut launcher = launcher(3, 0, MockDecoder::new());
        assert!(launcher.handle_input(&key("Right")).is_none());
        assert_eq!(launcher.selected(), 1);
        launcher.handle_input(&InputEvent::Axis {
            axis: 0,
            value: -0x7fff,
        });
        assert_eq!(launcher.selected(), 0);
        assert!(!launcher.should_quit());

        launcher.handle_input(&key("Escape"));
        assert!(launcher.should_quit());
        launcher.shutdown().unwrap();
    }

    #[test]
    fn test_launch_without_emulator_keeps_running() {
        let mut launcher = launcher(2, 0, MockDecoder::new());
        assert!(launcher.handle_input(&key("Space")).is_none());
        assert!(!launcher.should_quit());
        launcher.shutdown().unwrap();
    }

    #[test]
    fn test_launch_sets_quit() {
        let emulator = Arc::new(Emulator {
            name: "fba".to_string(),
            path: PathBuf::from("/opt/fba"),
            exe: "fba2x".to_string(),
            args: String::new(),
        });
        let cards = CardStore::new(vec![
            card(0, "sf2").with_emulator(emulator.clone()),
            card(1, "mslug").with_emulator(emulator),
        ]);
        let mut launcher = launcher_with(cards, 0, MockDecoder::new(), Some("mslug"));

        let command = launcher.handle_input(&InputEvent::Button(0)).unwrap();
        assert_eq!(command.args, vec!["mslug"]);
        assert!(launcher.should_quit());
        assert_eq!(launcher.shutdown().unwrap(), "mslug");
    }

    #[test]
    fn test_shutdown_frees_cards() {
        let decoder = MockDecoder::new()
            .with_slow_image(title_path("g0"), Duration::from_millis(100))
            .with_image(title_path("g1"));
        let launcher = launcher(2, 1, decoder);
        launcher.start();
        let card = Arc::clone(launcher.selected_card());

        launcher.shutdown().unwrap();
        assert_eq!(card.status(), LoadStatus::Loaded);
        assert!(card.lock().title().is_none());
    }
}
