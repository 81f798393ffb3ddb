use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CatalogKind, ProgressRecord, StreamInfo, VideoRef};

/// Lists what the library has to offer.
///
/// An unauthenticated session surfaces as [`crate::AppError::Unauthenticated`]
/// inside the error chain; the shell turns that into a login redirect, the
/// core just treats it as "no data".
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_items(&self, kind: CatalogKind) -> Result<Vec<VideoRef>>;
}

/// Remote authority for playback positions, one record per video id.
#[async_trait]
pub trait ProgressService: Send + Sync {
    async fn fetch_all(&self) -> Result<HashMap<String, ProgressRecord>>;

    async fn upsert(
        &self,
        video_id: &str,
        position_secs: f64,
        thumbnail: Option<&str>,
    ) -> Result<()>;

    async fn remove(&self, video_id: &str) -> Result<()>;
}

/// Resolves a video id to a playable endpoint.
#[async_trait]
pub trait StreamService: Send + Sync {
    async fn resolve(&self, video_id: &str) -> Result<StreamInfo>;
}
