//! Data models for the launcher: cards, their load state and emulators.

mod card;
mod card_store;
mod emulator;

pub use card::{Card, CardAssets, CardId, CardState, LoadStatus};
pub use card_store::{CardStore, expand_template};
pub use emulator::{Emulator, EmulatorStore};
