use serde::Serialize;

use crate::catalog;
use crate::models::ProgressRecord;
use crate::progress::ProgressStore;

/// One row of the "continue watching" rail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinueEntry {
    pub video_id: String,
    pub position_secs: f64,
    pub thumbnail: Option<String>,
    pub title: String,
}

/// Project the store's current snapshot into the continue-watching list:
/// one entry per video, most recently watched first, thumbnails falling back
/// to the guessed public path when the record carries none.
///
/// Re-run this on the store's revision channel; it never polls.
pub fn project(store: &ProgressStore) -> Vec<ContinueEntry> {
    project_records(store.records_by_recency())
}

/// Same projection over any record sequence. When the input was concatenated
/// from partially-overlapping sources, the first occurrence of an id wins.
pub fn project_records(records: impl IntoIterator<Item = ProgressRecord>) -> Vec<ContinueEntry> {
    let mut out: Vec<ContinueEntry> = Vec::new();
    for record in records {
        if out.iter().any(|e| e.video_id == record.video_id) {
            continue;
        }
        let thumbnail = record
            .thumbnail
            .clone()
            .or_else(|| catalog::guess_thumb(&record.video_id));
        out.push(ContinueEntry {
            title: catalog::pretty_name(&record.video_id),
            video_id: record.video_id,
            position_secs: record.position_secs,
            thumbnail,
        });
    }
    out
}
