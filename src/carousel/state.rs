use serde::Deserialize;

use crate::model::Movie;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselAction {
    Next,
    Prev,
    JumpTo(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CarouselError {
    #[error("Carousel index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Cyclic cursor over a list of posters.
///
/// The cursor is always a valid index while the list is non-empty, and 0
/// when it is empty.
#[derive(Debug, Clone, Default)]
pub struct PosterCarousel {
    movies: Vec<Movie>,
    cursor: usize,
}

impl PosterCarousel {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self { movies, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn current(&self) -> Option<&Movie> {
        self.movies.get(self.cursor)
    }

    pub fn next(&mut self) {
        let len = self.movies.len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor + 1) % len;
    }

    pub fn prev(&mut self) {
        let len = self.movies.len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor + len - 1) % len;
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), CarouselError> {
        if index >= self.movies.len() {
            return Err(CarouselError::OutOfRange {
                index,
                len: self.movies.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    pub fn apply(&mut self, action: CarouselAction) -> Result<(), CarouselError> {
        match action {
            CarouselAction::Next => self.next(),
            CarouselAction::Prev => self.prev(),
            CarouselAction::JumpTo(index) => self.jump_to(index)?,
        }
        Ok(())
    }

    /// Swaps in a new backing list. The cursor stays on the same movie if
    /// it is still there, otherwise it is clamped to the new length.
    pub fn replace_movies(&mut self, movies: Vec<Movie>) {
        let current_id = self.current().map(|m| m.id);
        self.movies = movies;
        self.cursor = current_id
            .and_then(|id| self.movies.iter().position(|m| m.id == id))
            .unwrap_or_else(|| self.cursor.min(self.movies.len().saturating_sub(1)));
    }

    /// Index-selector controls: `(index, is_current)` for the first
    /// `limit` movies.
    pub fn selectors(&self, limit: usize) -> impl Iterator<Item = (usize, bool)> + '_ {
        (0..self.movies.len().min(limit)).map(move |i| (i, i == self.cursor))
    }
}

/// Navigation as it arrives in a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    Next,
    Prev,
    Jump,
}

impl NavigationKind {
    /// `None` for a jump without an index.
    pub fn into_action(self, index: Option<usize>) -> Option<CarouselAction> {
        match self {
            NavigationKind::Next => Some(CarouselAction::Next),
            NavigationKind::Prev => Some(CarouselAction::Prev),
            NavigationKind::Jump => index.map(CarouselAction::JumpTo),
        }
    }
}
