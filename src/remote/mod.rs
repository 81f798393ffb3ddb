//! HTTP client for the personal library server. One client implements all
//! three service contracts the core consumes: catalog listing, the remote
//! half of the progress store, and stream endpoint resolution.

mod models;

use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CatalogKind, ProgressRecord, StreamInfo, VideoRef};
use crate::services::{CatalogService, ProgressService, StreamService};
use crate::catalog;

use models::{CatalogItemDto, ProgressDto, SaveProgressBody};

pub struct LibraryClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    client_id: String,
}

impl LibraryClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.server_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Where the shell should send the user when the server answers 401.
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.api_token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => log::warn!("[LibraryClient] API token is not a valid header value"),
            }
        }
        if let Ok(value) = HeaderValue::from_str(&self.client_id) {
            headers.insert("X-Client-Id", value);
        }
        headers
    }

    /// Map 401 to the typed error the shell turns into a login redirect;
    /// everything else non-2xx is a plain network error.
    fn checked(&self, response: Response) -> Result<Response> {
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(anyhow!(AppError::Unauthenticated {
                login_url: self.login_url(),
            }));
        }
        Ok(response.error_for_status()?)
    }

    /// Percent-encode an id for use as a URL path, segment by segment.
    fn encode_path(segments: &[&str]) -> String {
        segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// `movies/<cat>/<file>` and `series/<show>/<season>/<file>` are the two
    /// shapes the stream route understands; the trailing file keeps any
    /// inner slashes inside one encoded segment.
    fn stream_path(video_id: &str) -> Result<String> {
        let parts: Vec<&str> = video_id.split('/').collect();
        match parts.as_slice() {
            ["movies", category, file @ ..] if !file.is_empty() => {
                let file = file.join("/");
                Ok(Self::encode_path(&[*category, file.as_str()]))
            }
            ["series", show, season, file @ ..] if !file.is_empty() => {
                let file = file.join("/");
                Ok(Self::encode_path(&[*show, *season, file.as_str()]))
            }
            _ => bail!("Unrecognized video id: {}", video_id),
        }
    }
}

#[async_trait]
impl CatalogService for LibraryClient {
    async fn list_items(&self, kind: CatalogKind) -> Result<Vec<VideoRef>> {
        let url = format!("{}/videos/{}", self.base_url, kind);
        let response = self.client.get(&url).headers(self.headers()).send().await?;
        let items: Vec<CatalogItemDto> = self.checked(response)?.json().await?;

        Ok(items
            .into_iter()
            .map(|item| catalog::video_ref(item.name, item.thumb))
            .collect())
    }
}

#[async_trait]
impl ProgressService for LibraryClient {
    async fn fetch_all(&self) -> Result<HashMap<String, ProgressRecord>> {
        let url = format!("{}/progress", self.base_url);
        let response = self.client.get(&url).headers(self.headers()).send().await?;
        let records: HashMap<String, ProgressDto> = self.checked(response)?.json().await?;

        Ok(records
            .into_iter()
            .map(|(video_id, dto)| {
                let record = ProgressRecord::new(video_id.clone(), dto.time, dto.thumb);
                (video_id, record)
            })
            .collect())
    }

    async fn upsert(
        &self,
        video_id: &str,
        position_secs: f64,
        thumbnail: Option<&str>,
    ) -> Result<()> {
        let url = format!("{}/progress", self.base_url);
        let body = SaveProgressBody {
            video: video_id,
            time: position_secs,
            thumb: thumbnail,
        };
        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;
        self.checked(response)?;
        Ok(())
    }

    async fn remove(&self, video_id: &str) -> Result<()> {
        let segments: Vec<&str> = video_id.split('/').collect();
        let url = format!(
            "{}/progress/{}",
            self.base_url,
            Self::encode_path(&segments)
        );
        let response = self
            .client
            .delete(&url)
            .headers(self.headers())
            .send()
            .await?;
        self.checked(response)?;
        Ok(())
    }
}

#[async_trait]
impl StreamService for LibraryClient {
    async fn resolve(&self, video_id: &str) -> Result<StreamInfo> {
        let path = Self::stream_path(video_id)?;
        Ok(StreamInfo {
            url: format!("{}/stream/{}", self.base_url, path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LibraryClient {
        LibraryClient::new(&Config::new("https://media.example.org/"))
    }

    #[tokio::test]
    async fn movie_ids_resolve_to_category_and_file() {
        let info = client()
            .resolve("movies/Vígjáték/A_Grand_Budapest_Hotel.mp4")
            .await
            .unwrap();
        assert_eq!(
            info.url,
            "https://media.example.org/stream/V%C3%ADgj%C3%A1t%C3%A9k/A_Grand_Budapest_Hotel.mp4"
        );
    }

    #[tokio::test]
    async fn series_ids_resolve_to_show_season_and_file() {
        let info = client()
            .resolve("series/Dark/S01/E01.mp4")
            .await
            .unwrap();
        assert_eq!(info.url, "https://media.example.org/stream/Dark/S01/E01.mp4");
    }

    #[tokio::test]
    async fn unknown_id_shapes_fail_resolution() {
        assert!(client().resolve("music/track.mp3").await.is_err());
        assert!(client().resolve("movies/orphan.mp4").await.is_err());
    }

    #[test]
    fn login_url_hangs_off_the_base() {
        assert_eq!(client().login_url(), "https://media.example.org/login");
    }
}
