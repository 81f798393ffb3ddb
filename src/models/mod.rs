use serde::{Deserialize, Serialize};

/// Which listing the library server should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Movies,
    Series,
}

impl CatalogKind {
    pub fn as_str(&self) -> &str {
        match self {
            CatalogKind::Movies => "movies",
            CatalogKind::Series => "series",
        }
    }
}

impl std::str::FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movies" => Ok(CatalogKind::Movies),
            "series" => Ok(CatalogKind::Series),
            _ => Err(format!("Invalid catalog kind: {}", s)),
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One playable unit as listed by the catalog.
///
/// `id` is a stable path-like key ("movies/Category/File.mp4"), unique within
/// the catalog. The player treats it as opaque; only the progress store and
/// the stream service interpret its structure. `category` and `title` are
/// display-derived, never stored authoritatively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRef {
    pub id: String,
    pub category: Option<String>,
    pub title: String,
    pub thumb: Option<String>,
}

/// A saved playback position for one [`VideoRef`]. At most one record per id;
/// updated in place on every save, no history kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub video_id: String,
    pub position_secs: f64,
    pub thumbnail: Option<String>,
}

impl ProgressRecord {
    pub fn new(video_id: impl Into<String>, position_secs: f64, thumbnail: Option<String>) -> Self {
        Self {
            video_id: video_id.into(),
            position_secs,
            thumbnail,
        }
    }
}

/// One slot of the playlist a player session works through: a single entry
/// for a standalone item, one per episode for a season autoplay run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
}

impl PlaylistEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail: None,
        }
    }
}

impl From<&VideoRef> for PlaylistEntry {
    fn from(video: &VideoRef) -> Self {
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            thumbnail: video.thumb.clone(),
        }
    }
}

/// A resolved playback endpoint for one video id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub url: String,
}
