//! Hand-rolled service mocks shared by the store and session tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::catalog;
use crate::errors::AppError;
use crate::models::{CatalogKind, ProgressRecord, StreamInfo, VideoRef};
use crate::services::{CatalogService, ProgressService, StreamService};

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Let detached store/session tasks run to completion on the current-thread
/// test runtime.
pub async fn drain() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

/// A progress service that records every call and can be told to park, fail
/// or pre-seed its remote state.
pub struct RecordingProgressService {
    remote: Mutex<HashMap<String, ProgressRecord>>,
    upserts: Mutex<Vec<(String, f64)>>,
    removes: Mutex<Vec<String>>,
    hold: AtomicBool,
    release: Notify,
    fail_upserts: AtomicBool,
    fail_removes: AtomicBool,
    fail_fetch: AtomicBool,
}

impl RecordingProgressService {
    pub fn new() -> Self {
        Self {
            remote: Mutex::new(HashMap::new()),
            upserts: Mutex::new(Vec::new()),
            removes: Mutex::new(Vec::new()),
            hold: AtomicBool::new(false),
            release: Notify::new(),
            fail_upserts: AtomicBool::new(false),
            fail_removes: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
        }
    }

    pub fn seed(&self, video_id: &str, position_secs: f64) {
        self.remote.lock().insert(
            video_id.to_string(),
            ProgressRecord::new(video_id, position_secs, None),
        );
    }

    pub fn upserts(&self) -> Vec<(String, f64)> {
        self.upserts.lock().clone()
    }

    pub fn removes(&self) -> Vec<String> {
        self.removes.lock().clone()
    }

    pub fn hold_upserts(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release_upserts(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProgressService for RecordingProgressService {
    async fn fetch_all(&self) -> Result<HashMap<String, ProgressRecord>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            bail!("fetch_all unavailable");
        }
        Ok(self.remote.lock().clone())
    }

    async fn upsert(
        &self,
        video_id: &str,
        position_secs: f64,
        thumbnail: Option<&str>,
    ) -> Result<()> {
        while self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_upserts.load(Ordering::SeqCst) {
            bail!("upsert unavailable");
        }
        self.upserts
            .lock()
            .push((video_id.to_string(), position_secs));
        self.remote.lock().insert(
            video_id.to_string(),
            ProgressRecord::new(video_id, position_secs, thumbnail.map(str::to_string)),
        );
        Ok(())
    }

    async fn remove(&self, video_id: &str) -> Result<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            bail!("remove unavailable");
        }
        self.removes.lock().push(video_id.to_string());
        self.remote.lock().remove(video_id);
        Ok(())
    }
}

/// Catalog serving a fixed two-movie listing, or 401 when told to deny.
pub struct MockCatalogService {
    deny_with_login: Mutex<Option<String>>,
}

impl MockCatalogService {
    pub fn new() -> Self {
        Self {
            deny_with_login: Mutex::new(None),
        }
    }

    pub fn deny(&self, login_url: &str) {
        *self.deny_with_login.lock() = Some(login_url.to_string());
    }
}

#[async_trait]
impl CatalogService for MockCatalogService {
    async fn list_items(&self, _kind: CatalogKind) -> Result<Vec<VideoRef>> {
        if let Some(login_url) = self.deny_with_login.lock().clone() {
            bail!(AppError::Unauthenticated { login_url });
        }
        Ok(vec![
            catalog::video_ref("movies/Akció/Die_Hard.mp4".into(), None),
            catalog::video_ref("movies/Dráma/Quiet_Days.mp4".into(), None),
        ])
    }
}

/// Stream service resolving every id to a mock URL unless told to fail it.
pub struct MockStreamService {
    failing: Mutex<HashSet<String>>,
    resolved: Mutex<Vec<String>>,
}

impl MockStreamService {
    pub fn new() -> Self {
        Self {
            failing: Mutex::new(HashSet::new()),
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_for(&self, video_id: &str) {
        self.failing.lock().insert(video_id.to_string());
    }

    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().clone()
    }
}

#[async_trait]
impl StreamService for MockStreamService {
    async fn resolve(&self, video_id: &str) -> Result<StreamInfo> {
        if self.failing.lock().contains(video_id) {
            bail!("no stream for {}", video_id);
        }
        self.resolved.lock().push(video_id.to_string());
        Ok(StreamInfo {
            url: format!("http://mock/stream/{}", video_id),
        })
    }
}
