//! Catalog glue: display names, category grouping, thumbnail guessing and
//! search filtering over the flat item lists the library server returns.
//! Pure data helpers, nothing here touches the network or a view.

use crate::models::{CatalogKind, VideoRef};

/// Fallback bucket for movies whose id does not carry a category segment.
pub const UNCATEGORIZED: &str = "Egyéb";

/// The single bucket all series land in until per-show grouping exists.
pub const SERIES_GROUP: &str = "Sorozatok";

/// Display name for a video id: last path segment, extension stripped,
/// underscore/dash runs collapsed to spaces.
pub fn pretty_name(id: &str) -> String {
    let file = id.rsplit('/').next().unwrap_or(id);
    let no_ext = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    let mut out = String::with_capacity(no_ext.len());
    let mut last_was_space = true;
    for ch in no_ext.chars() {
        if ch == '_' || ch == '-' {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = ch == ' ';
        }
    }
    out.trim().to_string()
}

/// Category for ids shaped "movies/<cat>/<file>"; anything else has none.
pub fn category_from_id(id: &str) -> Option<String> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.first() == Some(&"movies") && parts.len() >= 3 {
        return Some(parts[1].to_string());
    }
    None
}

/// Build a [`VideoRef`] from a raw catalog entry.
pub fn video_ref(id: String, thumb: Option<String>) -> VideoRef {
    let category = category_from_id(&id);
    let title = pretty_name(&id);
    VideoRef {
        id,
        category,
        title,
        thumb,
    }
}

/// Public thumbnail URL guessed from a movie id, used when a progress record
/// carries no thumbnail of its own.
///
/// "movies/Vígjáték/A_Grand_Budapest_Hotel.mp4" becomes
/// "/videos/movies/V%C3%ADgj%C3%A1t%C3%A9k/A_Grand_Budapest_Hotel.jpg".
/// Each segment is encoded separately so accented categories survive.
pub fn guess_thumb(id: &str) -> Option<String> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.first() != Some(&"movies") || parts.len() < 3 {
        // Per-show covers for series do not exist yet.
        return None;
    }

    let category = parts[1];
    let file = parts[2..].join("/");
    let file_no_ext = file
        .strip_suffix(".mp4")
        .or_else(|| file.strip_suffix(".MP4"))
        .unwrap_or(&file);

    Some(format!(
        "/videos/movies/{}/{}.jpg",
        urlencoding::encode(category),
        urlencoding::encode(file_no_ext)
    ))
}

/// Group a flat listing into labelled rows, preserving first-seen label
/// order. Movies group per category with an "Egyéb" fallback; series all
/// share one row.
pub fn group_items(items: &[VideoRef], kind: CatalogKind) -> Vec<(String, Vec<VideoRef>)> {
    let mut groups: Vec<(String, Vec<VideoRef>)> = Vec::new();

    for item in items {
        let label = match kind {
            CatalogKind::Movies => item
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            CatalogKind::Series => SERIES_GROUP.to_string(),
        };

        match groups.iter_mut().find(|(name, _)| *name == label) {
            Some((_, bucket)) => bucket.push(item.clone()),
            None => groups.push((label, vec![item.clone()])),
        }
    }

    groups
}

/// Case-insensitive substring search over pretty names. An empty or
/// whitespace-only query matches everything.
pub fn search<'a>(items: &'a [VideoRef], query: &str) -> Vec<&'a VideoRef> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .collect()
}
