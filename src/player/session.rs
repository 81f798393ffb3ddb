use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use super::ticker::SyncTicker;
use super::{PlayerEvent, PlayerState};
use crate::errors::AppError;
use crate::models::PlaylistEntry;
use crate::playlist::Playlist;
use crate::progress::ProgressStore;
use crate::resume;
use crate::services::StreamService;

/// One playback attempt: owns the playlist and cursor, walks the
/// Idle → Loading → Playing ↔ Paused / Ended lifecycle, and writes progress
/// at exactly three trigger points — the periodic tick while playing, on
/// ended, and on explicit close.
///
/// The shell drives it with `load`/`metadata_ready`/`report_position`/
/// `pause`/`resume`/`ended`/`close` and reacts to [`PlayerEvent`]s; the
/// session itself has no presentation dependency.
pub struct PlayerSession {
    store: Arc<ProgressStore>,
    streams: Arc<dyn StreamService>,
    state: RwLock<PlayerState>,
    playlist: RwLock<Playlist>,
    /// f64 bits, lock-free reads from the ticker.
    position_bits: AtomicU64,
    duration: Mutex<Option<f64>>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    ticker: Mutex<Option<SyncTicker>>,
    sync_interval: Duration,
}

impl PlayerSession {
    pub fn new(
        store: Arc<ProgressStore>,
        streams: Arc<dyn StreamService>,
        sync_interval: Duration,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            store,
            streams,
            state: RwLock::new(PlayerState::Idle),
            playlist: RwLock::new(Playlist::default()),
            position_bits: AtomicU64::new(0f64.to_bits()),
            duration: Mutex::new(None),
            events,
            ticker: Mutex::new(None),
            sync_interval,
        });
        (session, receiver)
    }

    pub fn state(&self) -> PlayerState {
        *self.state.read()
    }

    /// Id of the entry the session is on, while not Idle.
    pub fn active_video_id(&self) -> Option<String> {
        if self.state() == PlayerState::Idle {
            return None;
        }
        self.playlist.read().current().map(|e| e.id.clone())
    }

    pub fn playlist_index(&self) -> usize {
        self.playlist.read().index()
    }

    pub fn position_secs(&self) -> f64 {
        f64::from_bits(self.position_bits.load(Ordering::Relaxed))
    }

    /// Called by the shell as playback time moves (timeupdate). Keeps the
    /// value the tick/close/ended saves will flush.
    pub fn report_position(&self, position_secs: f64) {
        if !position_secs.is_finite() || position_secs < 0.0 {
            return;
        }
        self.position_bits
            .store(position_secs.to_bits(), Ordering::Relaxed);
    }

    /// Start a playback attempt over `entries` at `start_index`.
    pub async fn load(
        self: &Arc<Self>,
        entries: Vec<PlaylistEntry>,
        start_index: usize,
    ) -> Result<(), AppError> {
        if entries.is_empty() {
            return Err(AppError::Internal("Cannot load an empty playlist".into()));
        }
        self.stop_ticker();
        *self.playlist.write() = Playlist::new(entries, start_index);
        self.load_current().await;
        Ok(())
    }

    /// The shell reports that media metadata arrived. Applies the resume
    /// decision and starts playback.
    pub fn metadata_ready(self: &Arc<Self>, duration: Option<f64>) {
        if self.state() != PlayerState::Loading {
            log::debug!("[PlayerSession] Ignoring metadata outside Loading");
            return;
        }
        *self.duration.lock() = duration;

        let Some(video_id) = self.playlist.read().current().map(|e| e.id.clone()) else {
            return;
        };
        let record = self.store.get(&video_id);
        if let Some(target) = resume::decide(record.as_ref(), duration) {
            log::info!("[PlayerSession] Resuming {} at {:.1}s", video_id, target);
            self.report_position(target);
            self.emit(PlayerEvent::SeekTo {
                position_secs: target,
            });
        }

        self.set_state(PlayerState::Playing);
        self.start_ticker();
    }

    pub fn pause(&self) {
        if self.state() != PlayerState::Playing {
            return;
        }
        self.stop_ticker();
        self.set_state(PlayerState::Paused);
    }

    pub fn resume(self: &Arc<Self>) {
        if self.state() != PlayerState::Paused {
            return;
        }
        self.set_state(PlayerState::Playing);
        self.start_ticker();
    }

    /// The current entry played to its end. Saves the final position, then
    /// either autoplays the next entry or goes back to Idle.
    pub async fn ended(self: &Arc<Self>) {
        if self.state() != PlayerState::Playing {
            log::debug!("[PlayerSession] Ignoring ended outside Playing");
            return;
        }
        self.stop_ticker();
        self.flush_progress();
        self.set_state(PlayerState::Ended);

        let advanced = self.playlist.write().advance().is_some();
        if advanced {
            let index = self.playlist.read().index();
            log::info!("[PlayerSession] Autoplay advancing to entry {}", index);
            self.emit(PlayerEvent::PlaylistAdvanced { index });
            self.load_current().await;
        } else {
            self.set_state(PlayerState::Idle);
        }
    }

    /// The viewer was closed. The final flush is the one write that must be
    /// allowed to attempt completion during teardown: its local half runs
    /// before this returns, its remote half is a detached task.
    pub fn close(&self) {
        match self.state() {
            PlayerState::Idle => return,
            PlayerState::Playing | PlayerState::Paused => {
                self.stop_ticker();
                self.flush_progress();
            }
            // Never started decoding, or already flushed by ended().
            PlayerState::Loading | PlayerState::Ended => {
                self.stop_ticker();
            }
        }
        self.set_state(PlayerState::Idle);
    }

    /// Shell-reported playback failure after load (decoder died, stream went
    /// away). Non-fatal; no progress write for the attempt.
    pub fn playback_failed(&self, message: &str) {
        if self.state() == PlayerState::Idle {
            return;
        }
        let video_id = self.active_video_id().unwrap_or_default();
        log::warn!("[PlayerSession] Playback failed for {}: {}", video_id, message);
        self.stop_ticker();
        self.emit(PlayerEvent::PlaybackFailed {
            video_id,
            message: message.to_string(),
        });
        self.set_state(PlayerState::Idle);
    }

    async fn load_current(self: &Arc<Self>) {
        let Some(entry) = self.playlist.read().current().cloned() else {
            self.set_state(PlayerState::Idle);
            return;
        };

        self.position_bits.store(0f64.to_bits(), Ordering::Relaxed);
        *self.duration.lock() = None;
        self.set_state(PlayerState::Loading);

        match self.streams.resolve(&entry.id).await {
            Ok(info) => {
                let index = self.playlist.read().index();
                log::info!("[PlayerSession] Loading {} -> {}", entry.id, info.url);
                self.emit(PlayerEvent::MediaSelected {
                    index,
                    video_id: entry.id,
                    url: info.url,
                });
            }
            Err(e) => {
                log::warn!(
                    "[PlayerSession] Stream resolution failed for {}: {}",
                    entry.id,
                    e
                );
                self.emit(PlayerEvent::PlaybackFailed {
                    video_id: entry.id,
                    message: e.to_string(),
                });
                self.set_state(PlayerState::Idle);
            }
        }
    }

    /// One periodic tick: flush the active position and give stranded
    /// pending writes another chance.
    pub(crate) fn periodic_sync(&self) {
        self.flush_progress();
        self.store.retry_pending();
    }

    fn flush_progress(&self) {
        let Some(video_id) = self.active_video_id() else {
            return;
        };
        let thumbnail = self
            .playlist
            .read()
            .current()
            .and_then(|e| e.thumbnail.clone());
        let position = self.position_secs();
        log::info!(
            "[PlayerSession] Saving position {:.1}s for {}",
            position,
            video_id
        );
        self.store.save(&video_id, position, thumbnail);
    }

    fn start_ticker(self: &Arc<Self>) {
        let Some(video_id) = self.active_video_id() else {
            return;
        };
        let ticker = SyncTicker::spawn(Arc::downgrade(self), video_id, self.sync_interval);
        *self.ticker.lock() = Some(ticker);
    }

    fn stop_ticker(&self) {
        // Dropping the ticker aborts its task.
        self.ticker.lock().take();
    }

    fn set_state(&self, next: PlayerState) {
        let changed = {
            let mut state = self.state.write();
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        };
        if changed {
            log::debug!("[PlayerSession] -> {:?}", next);
            self.emit(PlayerEvent::StateChanged { state: next });
        }
    }

    fn emit(&self, event: PlayerEvent) {
        // The shell may have hung up; that is its business.
        let _ = self.events.send(event);
    }
}
