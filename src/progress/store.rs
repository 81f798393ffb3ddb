use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::errors::AppError;
use crate::models::ProgressRecord;
use crate::progress::ProgressCache;
use crate::services::ProgressService;

struct Entry {
    record: ProgressRecord,
    /// Stamp of the save that produced this value. Guards remote completions
    /// (a stale one must not mark a newer value as synced) and doubles as
    /// the recency order the projector renders in.
    seq: u64,
    /// Value not yet confirmed by the remote; retried on the next tick or
    /// save.
    pending: bool,
    /// A sync task for this id is currently running.
    in_flight: bool,
}

/// Merged view of per-video playback positions.
///
/// Reads never block on the network: `get` and the snapshot accessors serve
/// whatever is currently known. `save` updates the in-memory snapshot
/// synchronously before its remote half is even dispatched, so a position is
/// visible locally the moment it is reported, survives a transient remote
/// failure, and never regresses.
///
/// Merge policy is last-write-wins by call order; there are no timestamps or
/// vector clocks. Within one session a single player is the only writer for
/// a given video, which makes that sufficient. Multi-device reconciliation
/// is a known gap, left as observed.
pub struct ProgressStore {
    entries: RwLock<HashMap<String, Entry>>,
    next_seq: AtomicU64,
    remote: Arc<dyn ProgressService>,
    cache: Option<Arc<ProgressCache>>,
    revision: watch::Sender<u64>,
}

impl ProgressStore {
    pub fn new(remote: Arc<dyn ProgressService>, cache: Option<Arc<ProgressCache>>) -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
            remote,
            cache,
            revision,
        })
    }

    /// Revision channel bumped after every successful mutation and after a
    /// remote snapshot merge. The projector re-renders on it instead of
    /// polling.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Last known merged value for one video. Never touches the network.
    pub fn get(&self, video_id: &str) -> Option<ProgressRecord> {
        self.entries.read().get(video_id).map(|e| e.record.clone())
    }

    /// True while the entry's latest value has not been confirmed remotely.
    pub fn is_pending(&self, video_id: &str) -> bool {
        self.entries
            .read()
            .get(video_id)
            .map(|e| e.pending)
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> HashMap<String, ProgressRecord> {
        self.entries
            .read()
            .iter()
            .map(|(id, e)| (id.clone(), e.record.clone()))
            .collect()
    }

    /// All records, most recently written first.
    pub fn records_by_recency(&self) -> Vec<ProgressRecord> {
        let entries = self.entries.read();
        let mut ordered: Vec<(u64, ProgressRecord)> = entries
            .values()
            .map(|e| (e.seq, e.record.clone()))
            .collect();
        ordered.sort_by(|a, b| b.0.cmp(&a.0));
        ordered.into_iter().map(|(_, record)| record).collect()
    }

    /// Seed the snapshot from the sqlite mirror. Rows that never reached the
    /// remote come back pending and get retried on the next opportunity.
    pub async fn load_cached(self: &Arc<Self>) -> Result<(), AppError> {
        let Some(cache) = self.cache.as_ref() else {
            return Ok(());
        };
        let rows = cache.load_all().await?;
        if rows.is_empty() {
            return Ok(());
        }

        {
            let mut entries = self.entries.write();
            for row in rows {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entries.insert(
                    row.record.video_id.clone(),
                    Entry {
                        record: row.record,
                        seq,
                        pending: row.pending,
                        in_flight: false,
                    },
                );
            }
        }
        self.touch();
        Ok(())
    }

    /// Record a playback position. The in-memory snapshot is updated before
    /// this returns; the remote write runs as a detached task and is
    /// best-effort. A remote failure keeps the value pending for a later
    /// retry and is not an error for the caller.
    pub fn save(self: &Arc<Self>, video_id: &str, position_secs: f64, thumbnail: Option<String>) {
        let position_secs = if position_secs.is_finite() {
            position_secs.max(0.0)
        } else {
            log::warn!("[ProgressStore] Discarding malformed position for {}", video_id);
            0.0
        };

        let record = ProgressRecord::new(video_id, position_secs, thumbnail);
        {
            let mut entries = self.entries.write();
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            match entries.get_mut(video_id) {
                Some(entry) => {
                    entry.record = record.clone();
                    entry.seq = seq;
                    entry.pending = true;
                }
                None => {
                    entries.insert(
                        video_id.to_string(),
                        Entry {
                            record: record.clone(),
                            seq,
                            pending: true,
                            in_flight: false,
                        },
                    );
                }
            }
        }
        self.touch();
        self.mirror(record, true);

        if self.begin_sync(video_id) {
            self.spawn_sync(video_id.to_string());
        }
    }

    /// Remove the record locally and remotely. The local view clears even if
    /// the remote delete fails (optimistic, as the source behaves).
    pub fn delete(self: &Arc<Self>, video_id: &str) {
        let existed = self.entries.write().remove(video_id).is_some();
        if existed {
            self.touch();
        }

        if let Some(cache) = self.cache.clone() {
            let id = video_id.to_string();
            tokio::spawn(async move {
                if let Err(e) = cache.remove(&id).await {
                    log::warn!("[ProgressStore] Cache delete failed for {}: {}", id, e);
                }
            });
        }

        let store = Arc::clone(self);
        let id = video_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.remote.remove(&id).await {
                log::warn!(
                    "[ProgressStore] Remote delete failed for {}: {} (local view already cleared)",
                    id,
                    e
                );
            }
        });
    }

    /// Fetch the full remote snapshot and merge it in. Remote values win for
    /// every entry except those with an unsynced local write, where a remote
    /// overwrite would regress a position the user already reached. On
    /// failure the snapshot stays as it was; continue-watching is merely
    /// stale, not broken.
    pub async fn load_remote(self: &Arc<Self>) -> Result<(), AppError> {
        let fetched = match self.remote.fetch_all().await {
            Ok(fetched) => fetched,
            Err(e) => {
                log::warn!("[ProgressStore] Remote snapshot fetch failed: {}", e);
                return Err(AppError::Network(e.to_string()));
            }
        };

        let mut merged: Vec<ProgressRecord> = Vec::new();
        {
            let mut entries = self.entries.write();
            for (video_id, record) in fetched {
                match entries.get_mut(&video_id) {
                    Some(entry) if entry.pending => {
                        // Local value not yet synced; keep it.
                    }
                    Some(entry) => {
                        entry.record = record.clone();
                        merged.push(record);
                    }
                    None => {
                        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                        entries.insert(
                            video_id.clone(),
                            Entry {
                                record: record.clone(),
                                seq,
                                pending: false,
                                in_flight: false,
                            },
                        );
                        merged.push(record);
                    }
                }
            }
        }
        self.touch();

        for record in merged {
            self.mirror(record, false);
        }
        Ok(())
    }

    /// Re-dispatch every pending entry that has no sync task running.
    /// Invoked from the periodic tick, so a position stranded by a transient
    /// failure gets another chance without any user action.
    pub fn retry_pending(self: &Arc<Self>) {
        let ids: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, e)| e.pending && !e.in_flight)
            .map(|(id, _)| id.clone())
            .collect();
        for id in ids {
            if self.begin_sync(&id) {
                self.spawn_sync(id);
            }
        }
    }

    fn begin_sync(&self, video_id: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(video_id) {
            Some(e) if e.pending && !e.in_flight => {
                e.in_flight = true;
                true
            }
            _ => false,
        }
    }

    fn spawn_sync(self: &Arc<Self>, video_id: String) {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            store.sync_entry(&video_id).await;
        });
    }

    /// Single writer for one id: keeps sending the current value until the
    /// remote confirms the latest one. A completion whose seq no longer
    /// matches lost a race with a newer save and loops to send that instead,
    /// so in-memory state is only ever marked synced for the value it holds.
    async fn sync_entry(self: Arc<Self>, video_id: &str) {
        loop {
            let (record, seq) = {
                let mut entries = self.entries.write();
                match entries.get_mut(video_id) {
                    Some(e) if e.pending => (e.record.clone(), e.seq),
                    Some(e) => {
                        e.in_flight = false;
                        return;
                    }
                    // Deleted while the write was queued.
                    None => return,
                }
            };

            match self
                .remote
                .upsert(&record.video_id, record.position_secs, record.thumbnail.as_deref())
                .await
            {
                Ok(()) => {
                    let synced = {
                        let mut entries = self.entries.write();
                        match entries.get_mut(video_id) {
                            Some(e) if e.seq == seq => {
                                e.pending = false;
                                e.in_flight = false;
                                true
                            }
                            Some(_) => false,
                            None => return,
                        }
                    };
                    if synced {
                        self.mirror(record, false);
                        self.touch();
                        return;
                    }
                }
                Err(e) => {
                    log::warn!(
                        "[ProgressStore] Remote save failed for {}: {} (kept locally for retry)",
                        video_id,
                        e
                    );
                    if let Some(entry) = self.entries.write().get_mut(video_id) {
                        entry.in_flight = false;
                    }
                    return;
                }
            }
        }
    }

    fn mirror(&self, record: ProgressRecord, pending: bool) {
        if let Some(cache) = self.cache.clone() {
            tokio::spawn(async move {
                if let Err(e) = cache.upsert(&record, pending).await {
                    log::warn!(
                        "[ProgressStore] Cache write failed for {}: {}",
                        record.video_id,
                        e
                    );
                }
            });
        }
    }

    fn touch(&self) {
        self.revision.send_modify(|v| *v += 1);
    }
}
