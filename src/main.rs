//! Headless driver for the pimenu launcher.
//!
//! Stands in for the renderer: each line on stdin is a key name fed through
//! the configured bindings, and a fixed-rate loop drains ready notifications
//! and steps the preview animations. After an orderly shutdown the selected
//! emulator is started.
//!
//! Usage: `pimenu [config.json]`

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use pimenu::constants::{ANIMATION_TICK_DIVISOR, FRAME_INTERVAL_MS};
use pimenu::{
    AppConfig, ImageFileDecoder, InputEvent, LaunchCommand, Launcher, LauncherError, SessionState,
};

fn main() {
    match run() {
        Ok(Some(command)) => {
            log::info!("Running {:?} in {:?}", command.program, command.working_dir);
            match command.to_command().status() {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    eprintln!("Emulator exited with {}", status);
                    std::process::exit(status.code().unwrap_or(1));
                }
                Err(e) => {
                    eprintln!("Failed to start {:?}: {}", command.program, e);
                    std::process::exit(1);
                }
            }
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("pimenu: {}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<Option<LaunchCommand>, LauncherError> {
    let config_path = AppConfig::resolve_path(std::env::args_os().nth(1).map(PathBuf::from))?;
    let config = AppConfig::load(&config_path)?;

    // Config sets the default level, RUST_LOG overrides it
    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let state_path = SessionState::path_for_config(&config_path);
    let session = SessionState::load(&state_path);

    let decoder = Arc::new(ImageFileDecoder::new(config.preferences.flip_vertical));
    let mut launcher = Launcher::new(
        &config,
        &base_dir,
        decoder,
        session.last_selected.as_deref(),
    )?;
    launcher.start();

    let input = spawn_input_reader();
    let command = render_loop(&mut launcher, &input);

    let last_selected = launcher.shutdown()?;
    let session = SessionState {
        last_selected: Some(last_selected),
    };
    if let Err(e) = session.save(&state_path) {
        log::warn!("Failed to save session state: {}", e);
    }

    Ok(command)
}

/// Read key names from stdin until EOF.
///
/// EOF drops the sender; the render loop quits once it has applied every key
/// read before it. The thread is detached; it blocks on stdin and dies with
/// the process.
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("stdin-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let key = line.trim();
                if !key.is_empty() && tx.send(key.to_string()).is_err() {
                    return;
                }
            }
            log::debug!("Input closed");
        });
    if let Err(e) = spawned {
        log::error!("Failed to start input thread: {}", e);
    }
    rx
}

/// Run until quit is requested. Returns the launch command, if any.
fn render_loop(launcher: &mut Launcher, input: &Receiver<String>) -> Option<LaunchCommand> {
    let interval = Duration::from_millis(FRAME_INTERVAL_MS);
    let mut tick: u32 = 0;
    let mut command = None;

    while !launcher.should_quit() {
        if let Some(launch) = drain_input(launcher, input) {
            command = Some(launch);
        }

        for id in launcher.poll_ready() {
            if let Some(card) = launcher.cards().get(id) {
                log::info!(
                    "Re-binding texture for card {} ({}): {:?}",
                    id,
                    card.title,
                    card.status()
                );
            }
        }

        tick = tick.wrapping_add(1);
        if tick % ANIMATION_TICK_DIVISOR == 0 {
            for id in launcher.advance_animation() {
                log::trace!("Card {} next frame", id);
            }
        }

        thread::sleep(interval);
    }

    command
}

/// Apply every pending key.
///
/// Stops at the first key that launches a card; later keys stay unread. A
/// closed input requests quit.
fn drain_input(launcher: &mut Launcher, input: &Receiver<String>) -> Option<LaunchCommand> {
    loop {
        match input.try_recv() {
            Ok(key) => {
                if let Some(launch) = launcher.handle_input(&InputEvent::Key(key)) {
                    return Some(launch);
                }
            }
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                log::debug!("Input closed, quitting");
                launcher.request_quit();
                return None;
            }
        }
    }
}
