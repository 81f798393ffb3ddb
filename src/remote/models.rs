//! Wire types for the personal library server.

use serde::{Deserialize, Serialize};

/// One entry of `GET /videos/{kind}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItemDto {
    pub name: String,
    #[serde(default)]
    pub thumb: Option<String>,
}

/// One value of the `GET /progress` map. No versioning field exists on the
/// wire; schema evolution is unaddressed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressDto {
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
}

/// Body of `POST /progress`.
#[derive(Debug, Serialize)]
pub struct SaveProgressBody<'a> {
    pub video: &'a str,
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<&'a str>,
}
