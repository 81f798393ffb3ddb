//! The player session state machine and its periodic progress sync.

mod session;
mod ticker;

use std::time::Duration;

use serde::Serialize;

pub use session::PlayerSession;

/// How often the ticker flushes the current position while playing.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
}

/// What the session tells its presentation shell. The shell owns the actual
/// video element; the session only decides what should happen to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// Point the viewer at a resolved stream.
    MediaSelected {
        index: usize,
        video_id: String,
        url: String,
    },
    /// Seek before playback starts (resume point).
    SeekTo { position_secs: f64 },
    StateChanged { state: PlayerState },
    /// Autoplay moved on to the next playlist entry.
    PlaylistAdvanced { index: usize },
    /// Non-fatal: the item could not be played; the session is back at Idle.
    PlaybackFailed { video_id: String, message: String },
}
