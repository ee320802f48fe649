pub mod aggregator;
pub mod backend;
pub mod session;
pub mod view;

pub use aggregator::{Aggregate, BatchPolicy, FavoritesAggregator, UnresolvedFavorite};
pub use backend::{FavoritesBackend, HttpFavoritesBackend};
pub use session::{FavoritesSession, SessionRegistry, ViewSnapshot};
pub use view::{FavoritesDisplay, FavoritesEvent, FavoritesViewState};
