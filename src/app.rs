use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::catalog;
use crate::config::Config;
use crate::continue_watching::{self, ContinueEntry};
use crate::errors::AppError;
use crate::models::{CatalogKind, PlaylistEntry, VideoRef};
use crate::player::{PlayerEvent, PlayerSession, PlayerState, DEFAULT_SYNC_INTERVAL};
use crate::progress::{ProgressCache, ProgressStore};
use crate::remote::LibraryClient;
use crate::services::{CatalogService, ProgressService, StreamService};

/// Application root: owns the progress store and the player session and
/// exposes the imperative surface the presentation shell drives. Constructed
/// once at startup, torn down never; everything downstream gets its
/// collaborators injected from here instead of reaching for globals.
pub struct App {
    store: Arc<ProgressStore>,
    catalog: Arc<dyn CatalogService>,
    session: Arc<PlayerSession>,
    events: Mutex<Option<mpsc::UnboundedReceiver<PlayerEvent>>>,
}

impl App {
    /// Wire the real stack: one HTTP client serving all three service
    /// contracts, plus the sqlite progress cache. A cache that fails to open
    /// degrades to memory-only operation rather than failing startup.
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let client = Arc::new(LibraryClient::new(&config));
        let cache = match ProgressCache::open(&config.cache_path()).await {
            Ok(cache) => Some(Arc::new(cache)),
            Err(e) => {
                log::warn!("[App] Progress cache unavailable, running in-memory only: {}", e);
                None
            }
        };
        Self::with_services(client.clone(), client.clone(), client, cache).await
    }

    /// Same wiring with every collaborator injected. What the tests use.
    pub async fn with_services(
        catalog: Arc<dyn CatalogService>,
        progress: Arc<dyn ProgressService>,
        streams: Arc<dyn StreamService>,
        cache: Option<Arc<ProgressCache>>,
    ) -> Result<Self, AppError> {
        let store = ProgressStore::new(progress, cache);
        if let Err(e) = store.load_cached().await {
            log::warn!("[App] Could not seed progress from cache: {}", e);
        }

        let (session, events) = PlayerSession::new(store.clone(), streams, DEFAULT_SYNC_INTERVAL);

        Ok(Self {
            store,
            catalog,
            session,
            events: Mutex::new(Some(events)),
        })
    }

    /// The player event stream. The shell takes it once and reacts to it.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<PlayerEvent>> {
        self.events.lock().take()
    }

    pub fn session(&self) -> &Arc<PlayerSession> {
        &self.session
    }

    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    pub fn player_state(&self) -> PlayerState {
        self.session.state()
    }

    /// Flat listing for one catalog kind.
    pub async fn list_items(&self, kind: CatalogKind) -> Result<Vec<VideoRef>, AppError> {
        self.catalog
            .list_items(kind)
            .await
            .map_err(service_error)
    }

    /// Listing grouped into labelled rows, the shape the main view renders.
    pub async fn list_grouped(
        &self,
        kind: CatalogKind,
    ) -> Result<Vec<(String, Vec<VideoRef>)>, AppError> {
        let items = self.list_items(kind).await?;
        Ok(catalog::group_items(&items, kind))
    }

    /// Pull the remote progress snapshot into the store. Failures only mean
    /// a stale continue-watching rail, so they are logged and swallowed.
    pub async fn refresh_progress(&self) {
        let _ = self.store.load_remote().await;
    }

    pub fn continue_watching(&self) -> Vec<ContinueEntry> {
        continue_watching::project(&self.store)
    }

    /// Revision channel for the continue-watching rail; bumped after every
    /// store mutation and remote merge.
    pub fn watch_progress(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    pub async fn load(
        &self,
        entries: Vec<PlaylistEntry>,
        start_index: usize,
    ) -> Result<(), AppError> {
        self.session.load(entries, start_index).await
    }

    pub fn pause(&self) {
        self.session.pause();
    }

    pub fn resume(&self) {
        self.session.resume();
    }

    pub fn close(&self) {
        self.session.close();
    }

    pub fn delete_progress(&self, video_id: &str) {
        self.store.delete(video_id);
    }
}

/// Service traits fail with `anyhow`; the facade narrows that back to the
/// app taxonomy, keeping typed variants (notably `Unauthenticated`) intact.
fn service_error(e: anyhow::Error) -> AppError {
    match e.downcast::<AppError>() {
        Ok(app) => app,
        Err(e) => AppError::Network(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{drain, MockCatalogService, MockStreamService, RecordingProgressService};

    async fn app() -> (App, Arc<RecordingProgressService>) {
        crate::testing::init_logs();
        let remote = Arc::new(RecordingProgressService::new());
        let app = App::with_services(
            Arc::new(MockCatalogService::new()),
            remote.clone(),
            Arc::new(MockStreamService::new()),
            None,
        )
        .await
        .unwrap();
        (app, remote)
    }

    #[tokio::test]
    async fn a_watched_video_shows_up_in_continue_watching() {
        let (app, remote) = app().await;

        let entry = PlaylistEntry::new("movies/Dráma/Film.mp4", "Film");
        app.load(vec![entry], 0).await.unwrap();
        app.session().metadata_ready(Some(100.0));
        app.session().report_position(17.0);
        app.close();
        drain().await;

        let rail = app.continue_watching();
        assert_eq!(rail.len(), 1);
        assert_eq!(rail[0].video_id, "movies/Dráma/Film.mp4");
        assert_eq!(rail[0].position_secs, 17.0);
        assert_eq!(remote.upserts().len(), 1);

        app.delete_progress("movies/Dráma/Film.mp4");
        drain().await;
        assert!(app.continue_watching().is_empty());
    }

    #[tokio::test]
    async fn unauthenticated_catalog_surfaces_the_typed_error() {
        let catalog = Arc::new(MockCatalogService::new());
        catalog.deny("https://media.example.org/login");
        let app = App::with_services(
            catalog,
            Arc::new(RecordingProgressService::new()),
            Arc::new(MockStreamService::new()),
            None,
        )
        .await
        .unwrap();

        match app.list_items(CatalogKind::Movies).await {
            Err(AppError::Unauthenticated { login_url }) => {
                assert_eq!(login_url, "https://media.example.org/login");
            }
            other => panic!("expected Unauthenticated, got {:?}", other.map(|v| v.len())),
        }
    }

    #[tokio::test]
    async fn grouped_listing_buckets_by_category() {
        let (app, _remote) = app().await;
        let groups = app.list_grouped(CatalogKind::Movies).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Akció");
        assert_eq!(groups[1].0, "Dráma");
    }
}
