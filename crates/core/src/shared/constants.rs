/// Max centroid distance (pixels) for a detection to continue an identity.
pub const MATCH_DISTANCE: f64 = 100.0;

/// Frames an identity may go unseen before it is evicted (~1 second at 30 fps).
pub const STALE_FRAMES: u64 = 30;

pub const SPEED_WINDOW: usize = 10;
pub const SPEED_WINDOW_RANGE: std::ops::RangeInclusive<usize> = 5..=30;

/// Samples needed before a speed estimate is reported.
pub const MIN_SPEED_SAMPLES: usize = 5;

/// Frame rate assumed when converting per-frame speed to per-second speed.
/// Not measured: the real cadence follows the display refresh.
pub const ASSUMED_FPS: f64 = 30.0;

/// Speeds below this (px/s) are "lo".
pub const SPEED_LO_BELOW: f64 = 300.0;
/// Speeds above this (px/s) are "hi"; the bound itself is still "med".
pub const SPEED_HI_ABOVE: f64 = 1000.0;

pub const SELECTION_HISTORY: usize = 5;

pub const LOCAL_PHRASES_PER_CYCLE: usize = 3;

pub const INTER_MESSAGE_DELAY_MS: u64 = 500;

pub const REMOTE_TIMEOUT_MS: u64 = 15_000;

/// Longest remote batch kept; extra phrases are dropped.
pub const MAX_REMOTE_PHRASES: usize = 32;

/// Simulated speech duration per word for the timed audio player.
pub const SPEECH_MS_PER_WORD: u64 = 350;

pub const CATALOG_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];
