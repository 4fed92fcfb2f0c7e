//! Emulator profiles shared by the cards that launch with them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// An emulator a card can be launched with. Read-only after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emulator {
    /// Name the configuration refers to this profile by
    pub name: String,
    /// Directory containing the executable; also the working directory
    pub path: PathBuf,
    /// Executable file name, relative to `path`
    pub exe: String,
    /// Default arguments passed before the card's own
    pub args: String,
}

impl Emulator {
    /// Full path to the executable.
    pub fn executable(&self) -> PathBuf {
        self.path.join(&self.exe)
    }
}

/// Name-keyed store of emulator profiles.
///
/// Cards keep a clone of the `Arc`; profiles are never mutated after the
/// store is built.
#[derive(Debug, Default)]
pub struct EmulatorStore {
    emulators: HashMap<String, Arc<Emulator>>,
}

impl EmulatorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile, replacing any profile with the same name.
    pub fn insert(&mut self, emulator: Emulator) {
        self.emulators
            .insert(emulator.name.clone(), Arc::new(emulator));
    }

    /// Look up a profile by name.
    pub fn get(&self, name: &str) -> Option<Arc<Emulator>> {
        self.emulators.get(name).cloned()
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.emulators.len()
    }

    /// Check if no profiles are defined.
    pub fn is_empty(&self) -> bool {
        self.emulators.is_empty()
    }
}
