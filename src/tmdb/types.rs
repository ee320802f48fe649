use serde::Deserialize;

/// Body TMDB sends along with a non-success status.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorBody {
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
}
