use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backend::FavoritesBackend;
use crate::error::FetchError;
use crate::model::{Identity, Movie, MovieId};
use crate::tmdb::MetadataService;

/// What to do when some, but not all, metadata lookups fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Any failed lookup fails the whole aggregate.
    #[default]
    WholeBatch,
    /// Failed lookups are reported next to the movies that did resolve.
    PerItem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedFavorite {
    pub id: MovieId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub movies: Vec<Movie>,
    pub unresolved: Vec<UnresolvedFavorite>,
}

/// Resolves a user's favorite ids into full movie records.
pub struct FavoritesAggregator {
    backend: Arc<dyn FavoritesBackend>,
    metadata: Arc<dyn MetadataService>,
    policy: BatchPolicy,
}

impl FavoritesAggregator {
    pub fn new(
        backend: Arc<dyn FavoritesBackend>,
        metadata: Arc<dyn MetadataService>,
        policy: BatchPolicy,
    ) -> Self {
        Self {
            backend,
            metadata,
            policy,
        }
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Fetches the favorite ids, then all movie details concurrently.
    ///
    /// The result keeps the order the backend returned the ids in.
    pub async fn fetch(&self, identity: &Identity) -> Result<Aggregate, FetchError> {
        let ids = dedup_ids(self.backend.favorite_ids(identity).await?);
        debug!(user = identity.username(), count = ids.len(), "Resolving favorites");

        let aggregate = match self.policy {
            BatchPolicy::WholeBatch => {
                let movies = try_join_all(ids.iter().map(|id| self.metadata.movie(*id))).await?;
                Aggregate {
                    movies,
                    unresolved: Vec::new(),
                }
            }
            BatchPolicy::PerItem => {
                let results = join_all(ids.iter().map(|id| self.metadata.movie(*id))).await;
                let mut aggregate = Aggregate::default();
                for (id, result) in ids.iter().zip(results) {
                    match result {
                        Ok(movie) => aggregate.movies.push(movie),
                        Err(e) => {
                            warn!(movie_id = %id, "Favorite could not be resolved: {}", e);
                            aggregate.unresolved.push(UnresolvedFavorite {
                                id: *id,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                aggregate
            }
        };

        info!(
            user = identity.username(),
            movies = aggregate.movies.len(),
            unresolved = aggregate.unresolved.len(),
            "Favorites resolved"
        );
        Ok(aggregate)
    }
}

fn dedup_ids(ids: Vec<MovieId>) -> Vec<MovieId> {
    let mut seen = HashSet::with_capacity(ids.len());
    let total = ids.len();
    let unique: Vec<MovieId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if unique.len() != total {
        debug!(dropped = total - unique.len(), "Dropped duplicate favorite ids");
    }
    unique
}
