//! Building the emulator command line for a card.

use std::path::PathBuf;
use std::process::Command;

use crate::model::Card;

/// A resolved emulator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Emulator executable
    pub program: PathBuf,
    /// Directory the emulator runs in
    pub working_dir: PathBuf,
    /// Emulator defaults, then the card's extra arguments, then the archive
    pub args: Vec<String>,
}

impl LaunchCommand {
    /// Command line for launching `card`, or `None` if it has no emulator.
    pub fn for_card(card: &Card) -> Option<Self> {
        let emulator = card.emulator.as_ref()?;

        let args = emulator
            .args
            .split_whitespace()
            .chain(card.args.split_whitespace())
            .map(str::to_string)
            .chain(std::iter::once(card.archive.clone()))
            .collect();

        Some(Self {
            program: emulator.executable(),
            working_dir: emulator.path.clone(),
            args,
        })
    }

    /// Build a process command. Nothing is spawned.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.current_dir(&self.working_dir).args(&self.args);
        command
    }
}
