//! Keyed, shared cache of fetched entities.
//!
//! One [`EntityCache`] exists per session. Every consumer asking for the same
//! [`CacheKey`] sees the same entry, and concurrent reads of a key share a
//! single in-flight fetch. Mutations mark entries stale through
//! [`EntityCache::invalidate`]; entries that somebody is subscribed to are
//! re-read in the background.
//!
//! ```text
//!            read()                     settle()
//!   Idle ───────────────► Loading ─────────────────► Ready / Error
//!    ▲                      ▲                           │
//!    │                      └────── read() if stale ◄───┤ invalidate()
//!    └──────────────────────────── reset() ◄────────────┘
//! ```
//!
//! Fetches run as spawned tasks, so a reader that goes away (the view was
//! left) never cancels the fetch other observers are waiting on. A fetch only
//! settles its entry if no newer fetch for that key was started meanwhile.

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use loanscope_common::UserId;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::ApiError;

const CHANNEL_CAPACITY: usize = 64;

/// Which predictions a list holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionScope {
    /// The session user's own predictions
    Own,
    OfUser(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    CurrentUser,
    User,
    UserList,
    PredictionList,
    Prediction,
    ModelMetrics,
}

/// Logical identity of a cached resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    CurrentUser,
    User(UserId),
    UserList,
    PredictionList(PredictionScope),
    Prediction(i64),
    ModelMetrics,
}

impl CacheKey {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::CurrentUser => ResourceKind::CurrentUser,
            Self::User(_) => ResourceKind::User,
            Self::UserList => ResourceKind::UserList,
            Self::PredictionList(_) => ResourceKind::PredictionList,
            Self::Prediction(_) => ResourceKind::Prediction,
            Self::ModelMetrics => ResourceKind::ModelMetrics,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentUser => write!(f, "user/current"),
            Self::User(id) => write!(f, "user/{}", id),
            Self::UserList => write!(f, "users"),
            Self::PredictionList(PredictionScope::Own) => write!(f, "predictions/own"),
            Self::PredictionList(PredictionScope::OfUser(id)) => write!(f, "predictions/user/{}", id),
            Self::Prediction(id) => write!(f, "prediction/{}", id),
            Self::ModelMetrics => write!(f, "model"),
        }
    }
}

/// A single key or every key of one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invalidation {
    Key(CacheKey),
    Kind(ResourceKind),
}

impl Invalidation {
    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            Self::Key(k) => k == key,
            Self::Kind(kind) => key.kind() == *kind,
        }
    }
}

impl From<CacheKey> for Invalidation {
    fn from(key: CacheKey) -> Self {
        Self::Key(key)
    }
}

impl From<ResourceKind> for Invalidation {
    fn from(kind: ResourceKind) -> Self {
        Self::Kind(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Change notifications delivered to subscribers of a key
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    Loading,
    Ready,
    Failed(ApiError),
    Invalidated,
}

/// Snapshot of one cache entry
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub key: CacheKey,
    pub value: Option<Arc<T>>,
    pub error: Option<ApiError>,
    pub status: EntryStatus,
    /// Marked by an invalidation; the next read fetches again
    pub stale: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            value: self.value.clone(),
            error: self.error.clone(),
            status: self.status,
            stale: self.stale,
            last_fetched_at: self.last_fetched_at,
        }
    }
}

impl<T> CacheEntry<T> {
    pub fn is_ready(&self) -> bool {
        self.status == EntryStatus::Ready
    }

    /// The value if the entry is ready, the stored failure otherwise
    pub fn into_result(self) -> Result<Arc<T>, ApiError> {
        match (self.status, self.value, self.error) {
            (EntryStatus::Ready, Some(value), _) => Ok(value),
            (_, _, Some(err)) => Err(err),
            (status, _, None) => Err(ApiError::Decode(format!(
                "cache entry {} has no value (status {:?})",
                self.key, status
            ))),
        }
    }
}

type AnyValue = Arc<dyn Any + Send + Sync>;
type FetchResult = Result<AnyValue, ApiError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, FetchResult> + Send + Sync>;

struct Slot {
    status: EntryStatus,
    value: Option<AnyValue>,
    error: Option<ApiError>,
    stale: bool,
    last_fetched_at: Option<DateTime<Utc>>,
    generation: u64,
    inflight: Option<SharedFetch>,
    /// Most recent fetcher, kept for background re-reads
    fetcher: Option<Fetcher>,
    events: broadcast::Sender<CacheEvent>,
}

impl Slot {
    fn new() -> Self {
        Self {
            status: EntryStatus::Idle,
            value: None,
            error: None,
            stale: false,
            last_fetched_at: None,
            generation: 0,
            inflight: None,
            fetcher: None,
            events: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    fn observed(&self) -> bool {
        self.events.receiver_count() > 0
    }

    fn notify(&self, event: CacheEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn snapshot<T: Send + Sync + 'static>(&self, key: CacheKey) -> CacheEntry<T> {
        let (value, error) = match &self.value {
            Some(any) => match Arc::clone(any).downcast::<T>() {
                Ok(value) => (Some(value), self.error.clone()),
                Err(_) => (
                    None,
                    Some(ApiError::Decode(format!(
                        "cache entry {} holds a different type",
                        key
                    ))),
                ),
            },
            None => (None, self.error.clone()),
        };
        let status = if self.status == EntryStatus::Ready && value.is_none() {
            EntryStatus::Error
        } else {
            self.status
        };
        CacheEntry {
            key,
            value,
            error,
            status,
            stale: self.stale,
            last_fetched_at: self.last_fetched_at,
        }
    }
}

struct State {
    slots: HashMap<CacheKey, Slot>,
    next_generation: u64,
}

/// Session-scoped entity cache. Cloning shares the same entries.
#[derive(Clone)]
pub struct EntityCache {
    state: Arc<Mutex<State>>,
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityCache {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                slots: HashMap::new(),
                next_generation: 0,
            })),
        }
    }

    /// Read `key`, fetching through `fetcher` unless a fresh value is cached
    /// or a fetch for the key is already in flight.
    pub async fn read<T, F, Fut>(&self, key: CacheKey, fetcher: F) -> CacheEntry<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let fetcher: Fetcher = Arc::new(move || {
            let fut = fetcher();
            async move { fut.await.map(|value| Arc::new(value) as AnyValue) }.boxed()
        });

        let (shared, generation) = {
            let mut guard = self.state.lock();
            let State {
                slots,
                next_generation,
            } = &mut *guard;
            let slot = slots.entry(key).or_insert_with(Slot::new);
            slot.fetcher = Some(Arc::clone(&fetcher));

            let attached = match slot.status {
                EntryStatus::Ready if !slot.stale => {
                    tracing::debug!("Cache hit for {}", key);
                    return slot.snapshot(key);
                }
                // A fetch started before an invalidation may carry old data
                EntryStatus::Loading if !slot.stale => slot
                    .inflight
                    .clone()
                    .map(|inflight| (inflight, slot.generation)),
                _ => None,
            };

            match attached {
                Some(pending) => {
                    tracing::debug!("Attaching to in-flight fetch for {}", key);
                    pending
                }
                None => self.start_fetch(key, slot, next_generation, fetcher),
            }
        };

        let result = shared.await;

        let guard = self.state.lock();
        match guard.slots.get(&key) {
            Some(slot) if slot.generation == generation => slot.snapshot(key),
            // Superseded or reset while we waited: report what our fetch produced
            _ => {
                let slot = Slot {
                    status: if result.is_ok() {
                        EntryStatus::Ready
                    } else {
                        EntryStatus::Error
                    },
                    error: result.as_ref().err().cloned(),
                    value: result.ok(),
                    last_fetched_at: Some(Utc::now()),
                    ..Slot::new()
                };
                slot.snapshot(key)
            }
        }
    }

    fn start_fetch(
        &self,
        key: CacheKey,
        slot: &mut Slot,
        next_generation: &mut u64,
        fetcher: Fetcher,
    ) -> (SharedFetch, u64) {
        *next_generation += 1;
        let generation = *next_generation;
        tracing::debug!("Fetching {} (generation {})", key, generation);

        slot.generation = generation;
        slot.status = EntryStatus::Loading;
        slot.stale = false;

        let cache = self.clone();
        let task = tokio::spawn(async move {
            let result = fetcher().await;
            cache.settle(key, generation, &result);
            result
        });
        let shared = async move {
            task.await
                .unwrap_or_else(|e| Err(ApiError::Transport(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared();

        slot.inflight = Some(shared.clone());
        slot.notify(CacheEvent::Loading);
        (shared, generation)
    }

    fn settle(&self, key: CacheKey, generation: u64, result: &FetchResult) {
        let mut guard = self.state.lock();
        let Some(slot) = guard.slots.get_mut(&key) else {
            tracing::debug!("Dropping result for {}: cache was reset", key);
            return;
        };
        if slot.generation != generation {
            tracing::debug!("Dropping superseded result for {}", key);
            return;
        }

        slot.inflight = None;
        slot.last_fetched_at = Some(Utc::now());
        match result {
            Ok(value) => {
                slot.value = Some(Arc::clone(value));
                slot.error = None;
                slot.status = EntryStatus::Ready;
                slot.notify(CacheEvent::Ready);
            }
            Err(err) => {
                slot.error = Some(err.clone());
                slot.status = EntryStatus::Error;
                slot.notify(CacheEvent::Failed(err.clone()));
            }
        }
    }

    /// Mark every entry matching `target` stale and re-read the observed ones.
    ///
    /// Staleness is immediate; the re-read happens in the background.
    /// Returns the keys that were invalidated.
    pub fn invalidate(&self, target: impl Into<Invalidation>) -> Vec<CacheKey> {
        let target = target.into();
        let can_spawn = tokio::runtime::Handle::try_current().is_ok();

        let mut guard = self.state.lock();
        let State {
            slots,
            next_generation,
        } = &mut *guard;

        let mut invalidated = Vec::new();
        for (key, slot) in slots.iter_mut() {
            if !target.matches(key) {
                continue;
            }
            slot.stale = true;
            slot.notify(CacheEvent::Invalidated);
            invalidated.push(*key);

            if slot.observed() && can_spawn {
                if let Some(fetcher) = slot.fetcher.clone() {
                    tracing::debug!("Background refetch of observed entry {}", key);
                    self.start_fetch(*key, slot, next_generation, fetcher);
                }
            }
        }

        tracing::debug!("Invalidated {:?}: {} entries", target, invalidated.len());
        invalidated
    }

    /// Subscribe to changes of `key`. The entry counts as observed while the
    /// receiver is alive.
    pub fn subscribe(&self, key: CacheKey) -> broadcast::Receiver<CacheEvent> {
        let mut guard = self.state.lock();
        guard
            .slots
            .entry(key)
            .or_insert_with(Slot::new)
            .events
            .subscribe()
    }

    /// Current snapshot without fetching
    pub fn peek<T: Send + Sync + 'static>(&self, key: CacheKey) -> Option<CacheEntry<T>> {
        let guard = self.state.lock();
        guard.slots.get(&key).map(|slot| slot.snapshot(key))
    }

    pub fn status(&self, key: CacheKey) -> Option<EntryStatus> {
        let guard = self.state.lock();
        guard.slots.get(&key).map(|slot| slot.status)
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        let guard = self.state.lock();
        guard.slots.keys().copied().collect()
    }

    /// Drop every entry. Only used at session boundaries (login, logout).
    pub fn reset(&self) {
        let mut guard = self.state.lock();
        for slot in guard.slots.values() {
            slot.notify(CacheEvent::Invalidated);
        }
        let count = guard.slots.len();
        guard.slots.clear();
        tracing::debug!("Cache reset ({} entries dropped)", count);
    }
}
