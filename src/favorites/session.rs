use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::aggregator::{Aggregate, FavoritesAggregator};
use super::view::{FavoritesEvent, FavoritesViewState};
use crate::carousel::{CarouselAction, CarouselError, PosterCarousel};
use crate::error::FetchError;
use crate::model::Identity;

/// Owned copy of a session's state, taken for rendering.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub favorites: FavoritesViewState,
    pub carousel: PosterCarousel,
}

struct SessionView {
    favorites: FavoritesViewState,
    carousel: PosterCarousel,
}

struct SessionInner {
    id: Uuid,
    identity: Identity,
    carousel_size: usize,
    cancel: CancellationToken,
    started: AtomicBool,
    settled: watch::Sender<bool>,
    view: RwLock<SessionView>,
    created: Instant,
    // Milliseconds since `created`.
    last_used: AtomicU64,
}

/// One mounted favorites view: its state, its carousel and the lifetime
/// its fetch is tied to.
#[derive(Clone)]
pub struct FavoritesSession {
    inner: Arc<SessionInner>,
}

impl FavoritesSession {
    fn new(identity: Identity, carousel_size: usize) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                identity,
                carousel_size,
                cancel: CancellationToken::new(),
                started: AtomicBool::new(false),
                settled: watch::Sender::new(false),
                view: RwLock::new(SessionView {
                    favorites: FavoritesViewState::new(),
                    carousel: PosterCarousel::default(),
                }),
                created: Instant::now(),
                last_used: AtomicU64::new(0),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Starts the fetch cycle on the first call and waits until it has
    /// settled. The cycle runs in its own task, so it outlives callers that
    /// stop waiting, and every caller waits on that same cycle.
    pub async fn activate(&self, aggregator: &Arc<FavoritesAggregator>) {
        let mut settled = self.inner.settled.subscribe();
        if !self.inner.started.swap(true, Ordering::AcqRel) {
            tokio::spawn(self.clone().run_fetch(aggregator.clone()));
        }
        let _ = settled.wait_for(|done| *done).await;
    }

    async fn run_fetch(self, aggregator: Arc<FavoritesAggregator>) {
        let cancel = self.inner.cancel.clone();
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(session = %self.inner.id, "Fetch abandoned, session torn down");
            }
            result = aggregator.fetch(&self.inner.identity) => self.commit(result).await,
        }
        self.inner.settled.send_replace(true);
    }

    async fn commit(&self, result: Result<Aggregate, FetchError>) {
        if self.is_torn_down() {
            debug!(session = %self.inner.id, "Discarding favorites resolved after teardown");
            return;
        }
        if let Err(ref e) = result {
            warn!(
                session = %self.inner.id,
                user = self.inner.identity.username(),
                "Fetching favorites failed: {}",
                e
            );
        }
        let mut view = self.inner.view.write().await;
        view.favorites.resolve(result);
        self.sync_carousel(&mut view);
    }

    fn sync_carousel(&self, view: &mut SessionView) {
        let top = view
            .favorites
            .movies
            .iter()
            .take(self.inner.carousel_size)
            .cloned()
            .collect();
        view.carousel.replace_movies(top);
    }

    fn touch(&self) {
        let now = self.inner.created.elapsed().as_millis() as u64;
        self.inner.last_used.store(now, Ordering::Relaxed);
    }

    fn idle_for(&self) -> Duration {
        let last_used = Duration::from_millis(self.inner.last_used.load(Ordering::Relaxed));
        self.inner.created.elapsed().saturating_sub(last_used)
    }

    fn teardown(&self) {
        self.inner.cancel.cancel();
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.touch();
        let view = self.inner.view.read().await;
        ViewSnapshot {
            favorites: view.favorites.clone(),
            carousel: view.carousel.clone(),
        }
    }

    pub async fn apply(&self, event: FavoritesEvent) -> bool {
        self.touch();
        let mut view = self.inner.view.write().await;
        let changed = view.favorites.apply(event);
        if changed {
            self.sync_carousel(&mut view);
        }
        changed
    }

    pub async fn navigate(&self, action: CarouselAction) -> Result<ViewSnapshot, CarouselError> {
        self.touch();
        let mut view = self.inner.view.write().await;
        view.carousel.apply(action)?;
        Ok(ViewSnapshot {
            favorites: view.favorites.clone(),
            carousel: view.carousel.clone(),
        })
    }
}

/// Live favorites sessions, keyed by the identity they were opened for.
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Identity, FavoritesSession>>>,
    aggregator: Arc<FavoritesAggregator>,
    carousel_size: usize,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(aggregator: Arc<FavoritesAggregator>, carousel_size: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            aggregator,
            carousel_size,
            idle_ttl,
        }
    }

    /// Returns the session for this identity, creating and activating it
    /// if needed.
    pub async fn open(&self, identity: Identity) -> FavoritesSession {
        let session = {
            let mut sessions = self.sessions.write().await;
            sessions
                .entry(identity.clone())
                .or_insert_with(|| {
                    let session = FavoritesSession::new(identity, self.carousel_size);
                    info!(
                        session = %session.id(),
                        user = session.identity().username(),
                        "Opened favorites session"
                    );
                    session
                })
                .clone()
        };
        session.activate(&self.aggregator).await;
        session
    }

    pub async fn get(&self, identity: &Identity) -> Option<FavoritesSession> {
        let sessions = self.sessions.read().await;
        sessions.get(identity).cloned()
    }

    /// Tears the session down. A fetch still in flight for it will not be
    /// committed.
    pub async fn close(&self, identity: &Identity) -> bool {
        let removed = self.sessions.write().await.remove(identity);
        match removed {
            Some(session) => {
                session.teardown();
                info!(session = %session.id(), user = identity.username(), "Closed favorites session");
                true
            }
            None => false,
        }
    }

    pub async fn refresh(&self, identity: Identity) -> FavoritesSession {
        self.close(&identity).await;
        self.open(identity).await
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn expire_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            if session.idle_for() < self.idle_ttl {
                return true;
            }
            session.teardown();
            debug!(session = %session.id(), "Expired idle favorites session");
            false
        });
        before - sessions.len()
    }

    pub fn start_background_expiry(self: Arc<Self>, interval_secs: u64) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            loop {
                interval.tick().await;
                let expired = self.expire_idle().await;
                if expired > 0 {
                    info!("Expired {} idle favorites sessions", expired);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::super::aggregator::testing::*;
    use super::super::aggregator::BatchPolicy;
    use super::*;
    use crate::model::MovieId;
    use std::sync::atomic::Ordering;

    fn alice() -> Identity {
        Identity::new("alice", "token").unwrap()
    }

    fn registry(backend: Arc<FakeBackend>, movies: Vec<crate::model::Movie>, carousel_size: usize) -> SessionRegistry {
        let aggregator = FavoritesAggregator::new(
            backend,
            Arc::new(FakeMetadata::new(movies)),
            BatchPolicy::WholeBatch,
        );
        SessionRegistry::new(Arc::new(aggregator), carousel_size, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_one_fetch_per_activation() {
        let backend = Arc::new(FakeBackend::ids(&[550]));
        let registry = registry(backend.clone(), vec![movie(550, "Fight Club")], 10);

        let first = registry.open(alice()).await;
        let second = registry.open(alice()).await;
        assert_eq!(first.id(), second.id());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        let snapshot = second.snapshot().await;
        assert!(!snapshot.favorites.pending);
        assert_eq!(snapshot.favorites.movies.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_opens_share_one_fetch() {
        let backend = Arc::new(FakeBackend::ids(&[550]).with_delay(Duration::from_millis(50)));
        let registry = Arc::new(registry(backend.clone(), vec![movie(550, "Fight Club")], 10));

        let (a, b) = tokio::join!(registry.open(alice()), registry.open(alice()));
        assert_eq!(a.id(), b.id());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abandoned_open_keeps_its_fetch() {
        let backend = Arc::new(FakeBackend::ids(&[550]).with_delay(Duration::from_millis(100)));
        let registry = registry(backend.clone(), vec![movie(550, "Fight Club")], 10);

        let abandoned = tokio::time::timeout(Duration::from_millis(20), registry.open(alice())).await;
        assert!(abandoned.is_err());

        let session = registry.open(alice()).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let snapshot = session.snapshot().await;
        assert!(!snapshot.favorites.pending);
        assert_eq!(snapshot.favorites.movies, vec![movie(550, "Fight Club")]);
    }

    #[tokio::test]
    async fn test_deletion_while_pending_survives_commit() {
        let backend = Arc::new(FakeBackend::ids(&[550, 27205]).with_delay(Duration::from_millis(100)));
        let registry = Arc::new(registry(
            backend,
            vec![movie(550, "Fight Club"), movie(27205, "Inception")],
            10,
        ));

        let opener = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.open(alice()).await })
        };
        let session = loop {
            if let Some(session) = registry.get(&alice()).await {
                break session;
            }
            tokio::task::yield_now().await;
        };
        assert!(session.snapshot().await.favorites.pending);
        assert!(session.apply(FavoritesEvent::MovieDeleted(MovieId(550))).await);

        opener.await.unwrap();
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.favorites.movies, vec![movie(27205, "Inception")]);
        assert_eq!(snapshot.carousel.len(), 1);
        assert_eq!(snapshot.carousel.current().unwrap().id, MovieId(27205));
    }

    #[tokio::test]
    async fn test_refresh_is_a_new_activation() {
        let backend = Arc::new(FakeBackend::ids(&[550]));
        let registry = registry(backend.clone(), vec![movie(550, "Fight Club")], 10);

        let first = registry.open(alice()).await;
        let second = registry.refresh(alice()).await;
        assert_ne!(first.id(), second.id());
        assert!(first.is_torn_down());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_teardown_discards_inflight_fetch() {
        let backend = Arc::new(FakeBackend::ids(&[550]).with_delay(Duration::from_millis(200)));
        let registry = Arc::new(registry(backend, vec![movie(550, "Fight Club")], 10));

        let opener = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.open(alice()).await })
        };

        let session = loop {
            if let Some(session) = registry.get(&alice()).await {
                break session;
            }
            tokio::task::yield_now().await;
        };
        assert!(registry.close(&alice()).await);

        let opened = opener.await.unwrap();
        assert_eq!(opened.id(), session.id());
        let snapshot = session.snapshot().await;
        assert!(snapshot.favorites.pending);
        assert!(snapshot.favorites.movies.is_empty());
    }

    #[tokio::test]
    async fn test_deleted_event_resyncs_carousel() {
        let backend = Arc::new(FakeBackend::ids(&[1, 2, 3]));
        let registry = registry(
            backend,
            vec![movie(1, "One"), movie(2, "Two"), movie(3, "Three")],
            2,
        );
        let session = registry.open(alice()).await;

        let snapshot = session.navigate(CarouselAction::JumpTo(1)).await.unwrap();
        assert_eq!(snapshot.carousel.len(), 2);
        assert_eq!(snapshot.carousel.current().unwrap().id, MovieId(2));

        assert!(session.apply(FavoritesEvent::MovieDeleted(MovieId(1))).await);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.favorites.movies.len(), 2);
        assert_eq!(snapshot.carousel.cursor(), 0);
        assert_eq!(snapshot.carousel.current().unwrap().id, MovieId(2));

        assert!(!session.apply(FavoritesEvent::MovieDeleted(MovieId(1))).await);
    }

    #[tokio::test]
    async fn test_expire_idle_sessions() {
        let backend = Arc::new(FakeBackend::ids(&[]));
        let aggregator = FavoritesAggregator::new(
            backend,
            Arc::new(FakeMetadata::new(vec![])),
            BatchPolicy::WholeBatch,
        );
        let registry = SessionRegistry::new(Arc::new(aggregator), 10, Duration::ZERO);
        let session = registry.open(alice()).await;
        assert_eq!(registry.expire_idle().await, 1);
        assert!(registry.is_empty().await);
        assert!(session.is_torn_down());
    }

    #[tokio::test]
    async fn test_recent_use_postpones_expiry() {
        let backend = Arc::new(FakeBackend::ids(&[]));
        let aggregator = FavoritesAggregator::new(
            backend,
            Arc::new(FakeMetadata::new(vec![])),
            BatchPolicy::WholeBatch,
        );
        let registry = SessionRegistry::new(Arc::new(aggregator), 10, Duration::from_millis(200));
        let session = registry.open(alice()).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        session.snapshot().await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(registry.expire_idle().await, 0);
        assert_eq!(registry.len().await, 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(registry.expire_idle().await, 1);
        assert!(session.is_torn_down());
    }
}
