//! The card store: every card, built once at startup.

use std::ops::Index;
use std::path::Path;
use std::sync::Arc;

use crate::config::{AppConfig, ConfigError};
use crate::constants::{ARCHIVE_PLACEHOLDER, FRAME_PLACEHOLDER};

use super::{Card, CardId, EmulatorStore};

/// Substitute the archive placeholder in a path template.
pub fn expand_template(template: &str, archive: &str) -> String {
    template.replace(ARCHIVE_PLACEHOLDER, archive)
}

/// Owns every card for the lifetime of the launcher.
///
/// Cards are handed to loader threads as `Arc` clones; the store is the only
/// long-lived owner and is destroyed after the loader pipeline has shut down.
#[derive(Debug, Default)]
pub struct CardStore {
    cards: Vec<Arc<Card>>,
}

impl CardStore {
    /// Build a store from already-constructed cards.
    ///
    /// Card ids must equal their position.
    pub fn new(cards: Vec<Card>) -> Self {
        debug_assert!(cards.iter().enumerate().all(|(i, c)| c.id == i));
        Self {
            cards: cards.into_iter().map(Arc::new).collect(),
        }
    }

    /// Build the store from the configured sets.
    ///
    /// Sets are sorted by title (case-insensitive) and numbered in that
    /// order. Asset paths are resolved relative to `base_dir`.
    pub fn from_config(config: &AppConfig, base_dir: &Path) -> Result<Self, ConfigError> {
        let prefs = &config.preferences;
        if !prefs.frame_template.contains(FRAME_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "frame_template {:?} has no {} placeholder",
                prefs.frame_template, FRAME_PLACEHOLDER
            )));
        }

        let emulators: EmulatorStore = config.emulator_store();

        let mut sets: Vec<_> = config.sets.iter().collect();
        sets.sort_by_cached_key(|set| set.display_title().to_lowercase());

        let mut cards = Vec::with_capacity(sets.len());
        for (id, set) in sets.into_iter().enumerate() {
            let screenshot =
                base_dir.join(expand_template(&prefs.screenshot_template, &set.archive));
            let frames = base_dir.join(expand_template(&prefs.frame_template, &set.archive));

            let mut card = Card::new(id, &set.archive, screenshot, frames.to_string_lossy())
                .with_title(set.display_title())
                .with_args(&set.args);

            if let Some(name) = &set.emulator {
                let emulator = emulators
                    .get(name)
                    .ok_or_else(|| ConfigError::UnknownEmulator {
                        archive: set.archive.clone(),
                        emulator: name.clone(),
                    })?;
                card = card.with_emulator(emulator);
            }

            cards.push(card);
        }

        log::info!(
            "Built card store: {} cards, {} emulators",
            cards.len(),
            emulators.len()
        );
        Ok(Self::new(cards))
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the store has no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Get a card by id.
    pub fn get(&self, id: CardId) -> Option<&Arc<Card>> {
        self.cards.get(id)
    }

    /// Iterate over all cards in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Card>> {
        self.cards.iter()
    }

    /// Find the card with the given archive name.
    pub fn position_of_archive(&self, archive: &str) -> Option<CardId> {
        self.cards.iter().position(|card| card.archive == archive)
    }

    /// Free every card's bitmaps and drop the store.
    ///
    /// Must run after the loader pipeline has shut down. Each card is locked
    /// in turn, so a loader still committing would be waited for.
    pub fn destroy(self) -> usize {
        let mut freed = 0;
        for card in &self.cards {
            if Arc::strong_count(card) > 1 {
                log::warn!(
                    "Card {} ({}) still referenced during destroy",
                    card.id,
                    card.archive
                );
            }
            freed += card.release();
        }
        log::debug!(
            "Destroyed {} cards, freed {} kB",
            self.cards.len(),
            freed / 1024
        );
        freed
    }
}

impl Index<CardId> for CardStore {
    type Output = Arc<Card>;

    fn index(&self, id: CardId) -> &Self::Output {
        &self.cards[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmulatorConfig, SetConfig};
    use crate::model::LoadStatus;
    use std::path::PathBuf;

    fn set(archive: &str, title: Option<&str>, emulator: Option<&str>) -> SetConfig {
        SetConfig {
            archive: archive.to_string(),
            title: title.map(str::to_string),
            emulator: emulator.map(str::to_string),
            args: String::new(),
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::new();
        config.emulators.insert(
            "fba".to_string(),
            EmulatorConfig {
                path: "../fba-pi".to_string(),
                exe: "fbapi".to_string(),
                args: String::new(),
            },
        );
        config.sets = vec![
            set("sf2", Some("Street Fighter II"), Some("fba")),
            set("1942", None, Some("fba")),
            set("mslug", Some("metal slug"), None),
        ];
        config
    }

    #[test]
    fn test_expand_template() {
        assert_eq!(
            expand_template("images/{archive}.png", "sf2"),
            "images/sf2.png"
        );
        assert_eq!(expand_template("static.png", "sf2"), "static.png");
    }

    #[test]
    fn test_from_config_sorts_and_numbers() {
        let store = CardStore::from_config(&config(), Path::new("/opt/pimenu")).unwrap();
        assert_eq!(store.len(), 3);

        let archives: Vec<_> = store.iter().map(|c| c.archive.as_str()).collect();
        assert_eq!(archives, vec!["1942", "mslug", "sf2"]);
        for (i, card) in store.iter().enumerate() {
            assert_eq!(card.id, i);
            assert_eq!(card.status(), LoadStatus::NotRequested);
        }
    }

    #[test]
    fn test_from_config_resolves_paths() {
        let store = CardStore::from_config(&config(), Path::new("/opt/pimenu")).unwrap();
        let sf2 = store.get(store.position_of_archive("sf2").unwrap()).unwrap();

        assert_eq!(sf2.screenshot_path, PathBuf::from("/opt/pimenu/images/sf2.png"));
        assert_eq!(sf2.frame_path(3), PathBuf::from("/opt/pimenu/images/sf2/3.png"));
        assert_eq!(sf2.emulator.as_ref().unwrap().exe, "fbapi");
    }

    #[test]
    fn test_from_config_shares_emulator() {
        let store = CardStore::from_config(&config(), Path::new(".")).unwrap();
        let a = store.get(0).unwrap().emulator.clone().unwrap();
        let b = store.get(2).unwrap().emulator.clone().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(store.get(1).unwrap().emulator.is_none());
    }

    #[test]
    fn test_unknown_emulator_is_error() {
        let mut config = config();
        config.sets.push(set("kof98", None, Some("mame")));
        let err = CardStore::from_config(&config, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEmulator { .. }));
    }

    #[test]
    fn test_frame_template_needs_placeholder() {
        let mut config = config();
        config.preferences.frame_template = "images/{archive}.gif".to_string();
        let err = CardStore::from_config(&config, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_position_of_archive() {
        let store = CardStore::from_config(&config(), Path::new(".")).unwrap();
        assert_eq!(store.position_of_archive("mslug"), Some(1));
        assert_eq!(store.position_of_archive("nope"), None);
    }

    #[test]
    fn test_destroy_empty_store() {
        assert_eq!(CardStore::default().destroy(), 0);
    }
}
