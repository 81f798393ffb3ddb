use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::session::PlayerSession;
use super::PlayerState;

/// The periodic sync task. Spawned on entering `Playing`, aborted on leaving
/// it; holds only a weak session handle so a dropped session silently ends
/// the task instead of being kept alive by it.
pub(crate) struct SyncTicker {
    handle: JoinHandle<()>,
}

impl SyncTicker {
    pub(crate) fn spawn(session: Weak<PlayerSession>, video_id: String, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; entering Playing is not
            // a save trigger.
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(session) = session.upgrade() else {
                    break;
                };
                // Transitions abort this task, but a tick that was already
                // scheduled while the session moved on must still not write:
                // re-check the state and that the id is the one this ticker
                // was started for.
                if session.state() != PlayerState::Playing {
                    break;
                }
                if session.active_video_id().as_deref() != Some(video_id.as_str()) {
                    log::warn!(
                        "[SyncTicker] Active video changed under a live ticker for {}",
                        video_id
                    );
                    break;
                }
                session.periodic_sync();
            }
        });
        Self { handle }
    }
}

impl Drop for SyncTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
