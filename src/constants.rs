//! Global constants for the pimenu launcher

/// Number of cards to preload on each side of the selection
pub const DEFAULT_PRELOAD_MARGIN: usize = 2;

/// Upper bound on concurrently running loader threads
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Upper bound on the number of animation frames probed per card
pub const DEFAULT_MAX_FRAMES: usize = 150;

/// Joystick axis values within +/- this range are ignored
pub const DEFAULT_AXIS_DEADZONE: i32 = 0x4000;

/// Default location of a card's title screenshot, relative to the config file
pub const DEFAULT_SCREENSHOT_TEMPLATE: &str = "images/{archive}.png";

/// Default location of a card's animation frames, relative to the config file
pub const DEFAULT_FRAME_TEMPLATE: &str = "images/{archive}/{frame}.png";

/// Placeholder substituted with the card's archive name
pub const ARCHIVE_PLACEHOLDER: &str = "{archive}";

/// Placeholder substituted with the zero-based frame number
pub const FRAME_PLACEHOLDER: &str = "{frame}";

/// Configuration file name looked up in the working directory
pub const CONFIG_FILE: &str = "config.json";

/// Session state file name, stored next to the configuration file
pub const STATE_FILE: &str = "state.json";

/// Number of on-screen card slots (outgoing and incoming)
pub const VISIBLE_SLOTS: usize = 2;

/// Render loop tick used by the headless driver (milliseconds)
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Animation frames advance once every this many render ticks
pub const ANIMATION_TICK_DIVISOR: u32 = 2;
