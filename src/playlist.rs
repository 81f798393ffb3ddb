use serde::{Deserialize, Serialize};

use crate::models::PlaylistEntry;

/// The ordered sequence one player session works through, plus the cursor
/// into it. Owned exclusively by the session; nothing else mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
    index: usize,
}

impl Playlist {
    pub fn new(entries: Vec<PlaylistEntry>, start_index: usize) -> Self {
        let index = if entries.is_empty() {
            0
        } else {
            start_index.min(entries.len() - 1)
        };
        Self { entries, index }
    }

    pub fn single(entry: PlaylistEntry) -> Self {
        Self::new(vec![entry], 0)
    }

    pub fn current(&self) -> Option<&PlaylistEntry> {
        self.entries.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Peek at the entry that would play next without moving the cursor.
    pub fn peek_next(&self) -> Option<&PlaylistEntry> {
        self.entries.get(self.index + 1)
    }

    /// Move the cursor forward and return the new current entry.
    pub fn advance(&mut self) -> Option<&PlaylistEntry> {
        if !self.has_next() {
            return None;
        }
        self.index += 1;
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<PlaylistEntry> {
        (0..n)
            .map(|i| PlaylistEntry::new(format!("series/Show/S01/E{:02}.mp4", i + 1), format!("E{:02}", i + 1)))
            .collect()
    }

    #[test]
    fn start_index_is_clamped() {
        let playlist = Playlist::new(entries(3), 9);
        assert_eq!(playlist.index(), 2);
    }

    #[test]
    fn advance_walks_in_order_and_stops_at_the_end() {
        let mut playlist = Playlist::new(entries(3), 0);
        assert_eq!(playlist.current().unwrap().title, "E01");
        assert!(playlist.has_next());

        assert_eq!(playlist.advance().unwrap().title, "E02");
        assert_eq!(playlist.advance().unwrap().title, "E03");
        assert!(!playlist.has_next());
        assert!(playlist.advance().is_none());
        assert_eq!(playlist.index(), 2);
    }

    #[test]
    fn peek_does_not_move_the_cursor() {
        let playlist = Playlist::new(entries(2), 0);
        assert_eq!(playlist.peek_next().unwrap().title, "E02");
        assert_eq!(playlist.index(), 0);
    }

    #[test]
    fn empty_playlist_has_no_current() {
        let playlist = Playlist::new(Vec::new(), 0);
        assert!(playlist.current().is_none());
        assert!(playlist.is_empty());
    }
}
