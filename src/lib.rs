//! Playback progress and continue-watching core for a personal media
//! library front end.
//!
//! The crate is the headless half of the viewer: the [`PlayerSession`]
//! state machine drives one playback attempt (including episode autoplay),
//! the [`ProgressStore`] keeps "where did the user leave off" merged across
//! an in-memory snapshot, an sqlite mirror and the remote library server,
//! and the continue-watching projection turns that snapshot into the rail
//! the shell renders. Catalog listing, progress sync and stream resolution
//! are consumed through service traits; [`remote::LibraryClient`] implements
//! all three over HTTP.

pub mod app;
pub mod catalog;
pub mod config;
pub mod continue_watching;
pub mod errors;
pub mod models;
pub mod player;
pub mod playlist;
pub mod progress;
pub mod remote;
pub mod resume;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use app::App;
pub use config::Config;
pub use continue_watching::ContinueEntry;
pub use errors::AppError;
pub use models::{CatalogKind, PlaylistEntry, ProgressRecord, StreamInfo, VideoRef};
pub use player::{PlayerEvent, PlayerSession, PlayerState};
pub use playlist::Playlist;
pub use progress::{ProgressCache, ProgressStore};
