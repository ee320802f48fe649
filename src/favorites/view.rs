use serde::Serialize;
use tracing::warn;

use super::aggregator::{Aggregate, UnresolvedFavorite};
use crate::error::FetchError;
use crate::model::{Movie, MovieId};

/// Messages a child component sends up to the favorites view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoritesEvent {
    /// The delete control finished removing this movie on the backend.
    MovieDeleted(MovieId),
}

/// State behind the favorites page.
///
/// Starts pending, is resolved exactly once, and afterwards only shrinks
/// through [`FavoritesViewState::remove_movie`]. Removals that arrive while
/// pending are held back and applied by the resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoritesViewState {
    pub pending: bool,
    pub error: Option<String>,
    pub movies: Vec<Movie>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedFavorite>,
    #[serde(skip)]
    removed_while_pending: Vec<MovieId>,
}

impl Default for FavoritesViewState {
    fn default() -> Self {
        Self {
            pending: true,
            error: None,
            movies: Vec::new(),
            unresolved: Vec::new(),
            removed_while_pending: Vec::new(),
        }
    }
}

/// The four mutually exclusive ways the page can look.
#[derive(Debug, PartialEq)]
pub enum FavoritesDisplay<'a> {
    Loading,
    Failed(&'a str),
    Empty,
    Grid {
        movies: &'a [Movie],
        unresolved: &'a [UnresolvedFavorite],
    },
}

impl FavoritesViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits the outcome of the fetch cycle. Returns false if the state
    /// was already resolved, in which case nothing changes.
    pub fn resolve(&mut self, result: Result<Aggregate, FetchError>) -> bool {
        if !self.pending {
            warn!("Ignoring second resolution of favorites view");
            return false;
        }
        self.pending = false;
        let removed = std::mem::take(&mut self.removed_while_pending);
        match result {
            Ok(aggregate) => {
                self.movies = aggregate.movies;
                self.unresolved = aggregate.unresolved;
                self.movies.retain(|m| !removed.contains(&m.id));
                self.unresolved.retain(|u| !removed.contains(&u.id));
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
        true
    }

    /// Drops the movie with this id from the list. Returns whether anything
    /// was removed, or while pending, whether the removal was newly queued.
    pub fn remove_movie(&mut self, id: MovieId) -> bool {
        if self.pending {
            if self.removed_while_pending.contains(&id) {
                return false;
            }
            self.removed_while_pending.push(id);
            return true;
        }
        let before = self.movies.len() + self.unresolved.len();
        self.movies.retain(|m| m.id != id);
        self.unresolved.retain(|u| u.id != id);
        self.movies.len() + self.unresolved.len() != before
    }

    pub fn apply(&mut self, event: FavoritesEvent) -> bool {
        match event {
            FavoritesEvent::MovieDeleted(id) => self.remove_movie(id),
        }
    }

    pub fn display(&self) -> FavoritesDisplay<'_> {
        if self.pending {
            return FavoritesDisplay::Loading;
        }
        if let Some(ref error) = self.error {
            return FavoritesDisplay::Failed(error);
        }
        if self.movies.is_empty() && self.unresolved.is_empty() {
            return FavoritesDisplay::Empty;
        }
        FavoritesDisplay::Grid {
            movies: &self.movies,
            unresolved: &self.unresolved,
        }
    }
}
