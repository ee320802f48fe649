use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub i64);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A movie as resolved by the metadata service.
///
/// Field names follow the TMDB movie detail object, so the same type is
/// used on the wire and in views. Fields we do not display are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: String,
}

impl Movie {
    pub fn release_year(&self) -> Option<i32> {
        NaiveDate::parse_from_str(&self.release_date, "%Y-%m-%d")
            .ok()
            .map(|d| d.year())
    }
}

/// The authenticated user a favorites view is built for.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    username: String,
    token: String,
}

impl Identity {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Result<Self, IdentityError> {
        let username = username.into();
        let token = token.into();
        if username.trim().is_empty() {
            return Err(IdentityError::MissingUsername);
        }
        if token.trim().is_empty() {
            return Err(IdentityError::MissingToken);
        }
        Ok(Self { username, token })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("username is empty")]
    MissingUsername,
    #[error("bearer token is empty")]
    MissingToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_from_tmdb_json() {
        let json = r#"{
            "adult": false,
            "id": 550,
            "title": "Fight Club",
            "poster_path": "/abc.jpg",
            "vote_average": 8.4,
            "release_date": "1999-10-15",
            "runtime": 139
        }"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, MovieId(550));
        assert_eq!(movie.title, "Fight Club");
        assert_eq!(movie.poster_path.as_deref(), Some("/abc.jpg"));
        assert_eq!(movie.release_year(), Some(1999));
    }

    #[test]
    fn test_movie_null_poster_and_missing_date() {
        let movie: Movie =
            serde_json::from_str(r#"{"id": 1, "title": "X", "poster_path": null}"#).unwrap();
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.release_year(), None);
    }

    #[test]
    fn test_identity_rejects_blank_parts() {
        assert_eq!(Identity::new("", "t").unwrap_err(), IdentityError::MissingUsername);
        assert_eq!(Identity::new("alice", " ").unwrap_err(), IdentityError::MissingToken);
        let id = Identity::new("alice", "secret").unwrap();
        assert!(!format!("{:?}", id).contains("secret"));
    }
}
