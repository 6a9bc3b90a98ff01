//! Generic deduplicating batch loader
//!
//! A [`BatchLoader`] collects keys requested by concurrently running
//! resolvers and hands them to a [`BatchFn`] in one call. Results are cached
//! per key for the lifetime of the loader, which is one request.
//!
//! # Dispatch window
//!
//! `load` registers its key synchronously and returns a [`Load`] future.
//! A `Load` whose batch is still open parks until the batch is sealed;
//! it never seals the batch itself. Sealing happens in
//! [`Dispatch::dispatch_open`], which [`until_idle`](super::until_idle)
//! calls once the driven request has nothing left to run. Every key any
//! resolver could register by then is in the batch, regardless of the
//! order fields are polled in. A `Load` awaited outside such a driver
//! never completes.
//!
//! # Failure
//!
//! A failing batch rejects every future of that batch with the same error
//! and evicts the batch's keys, so a later `load` retries them. A batch
//! function that returns the wrong number of values fails the whole batch
//! with [`LoadError::LengthMismatch`].

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Waker};
use thiserror::Error;

use super::Dispatch;
use crate::store::StoreError;

/// Fetches values for a batch of keys
///
/// Implementations must return exactly one value per key, in key order.
/// Single-valued loaders return `Option<T>` (absent rows become `None`);
/// multi-valued loaders return `Vec<T>` (keys without rows get an empty
/// list).
pub trait BatchFn<K, V>: Send + Sync + 'static {
    fn load(&self, keys: &[K]) -> impl Future<Output = Result<Vec<V>, StoreError>> + Send;
}

/// Error delivered to every future of a failed batch
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The batch function broke the one-value-per-key contract
    #[error("loader {loader} returned {actual} values for {expected} keys")]
    LengthMismatch {
        loader: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The store rejected the batch query
    #[error("{0}")]
    Store(Arc<StoreError>),
}

type Outcome<V> = Result<Arc<Vec<V>>, LoadError>;
type SharedFetch<V> = Shared<BoxFuture<'static, Outcome<V>>>;

enum BatchState<K, V> {
    /// Still accepting keys; `waiting` are the parked loads
    Open { keys: Vec<K>, waiting: Vec<Waker> },
    /// Sealed; the batch function is running or has finished
    Dispatched(SharedFetch<V>),
}

struct Batch<K, V> {
    id: u64,
    state: Mutex<BatchState<K, V>>,
}

enum Slot<K, V> {
    Ready(V),
    Pending { batch: Arc<Batch<K, V>>, index: usize },
}

struct State<K, V> {
    cache: HashMap<K, Slot<K, V>>,
    open: Option<Arc<Batch<K, V>>>,
    next_batch_id: u64,
}

struct Inner<K, V, F> {
    name: &'static str,
    fetch: Arc<F>,
    state: Mutex<State<K, V>>,
}

/// Per-request batching, caching loader over a [`BatchFn`]
pub struct BatchLoader<K, V, F> {
    inner: Arc<Inner<K, V, F>>,
}

impl<K, V, F> Clone for BatchLoader<K, V, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V, F> BatchLoader<K, V, F>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: BatchFn<K, V>,
{
    /// Create a loader with an empty cache
    pub fn new(name: &'static str, fetch: F) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                fetch: Arc::new(fetch),
                state: Mutex::new(State {
                    cache: HashMap::new(),
                    open: None,
                    next_batch_id: 0,
                }),
            }),
        }
    }

    /// Loader name used in logs and errors
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Request the value for `key`
    ///
    /// The key joins the currently open batch unless it is already cached
    /// or in flight, in which case the existing result is shared.
    pub fn load(&self, key: K) -> Load<K, V, F> {
        let mut state = self.inner.state.lock();

        let stage = match state.cache.get(&key) {
            Some(Slot::Ready(value)) => Stage::Ready(value.clone()),
            Some(Slot::Pending { batch, index }) => Stage::Queued {
                batch: batch.clone(),
                index: *index,
            },
            None => {
                let (batch, index) = enqueue(&mut state, key.clone());
                state.cache.insert(
                    key,
                    Slot::Pending {
                        batch: batch.clone(),
                        index,
                    },
                );
                Stage::Queued { batch, index }
            }
        };

        Load {
            _loader: self.inner.clone(),
            stage,
        }
    }

    /// Seed the cache for `key`
    ///
    /// Has no effect when the key is already cached or in flight. Returns
    /// whether the value was stored.
    pub fn prime(&self, key: K, value: V) -> bool {
        match self.inner.state.lock().cache.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Slot::Ready(value));
                true
            }
        }
    }
}

/// Add `key` to the open batch, opening a new one if the last was sealed
fn enqueue<K, V>(state: &mut State<K, V>, key: K) -> (Arc<Batch<K, V>>, usize) {
    if let Some(batch) = &state.open {
        if let BatchState::Open { keys, .. } = &mut *batch.state.lock() {
            keys.push(key);
            return (batch.clone(), keys.len() - 1);
        }
    }

    let batch = Arc::new(Batch {
        id: state.next_batch_id,
        state: Mutex::new(BatchState::Open {
            keys: vec![key],
            waiting: Vec::new(),
        }),
    });
    state.next_batch_id += 1;
    state.open = Some(batch.clone());
    (batch, 0)
}

impl<K, V, F> Inner<K, V, F>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: BatchFn<K, V>,
{
    fn run(self: &Arc<Self>, batch_id: u64, keys: Vec<K>) -> impl Future<Output = Outcome<V>> {
        let fetch = self.fetch.clone();
        let loader = Arc::downgrade(self);
        let name = self.name;

        async move {
            tracing::debug!(loader = name, keys = keys.len(), "Dispatching batch");

            let outcome = match fetch.load(&keys).await {
                Ok(values) if values.len() == keys.len() => Ok(Arc::new(values)),
                Ok(values) => {
                    tracing::error!(
                        loader = name,
                        expected = keys.len(),
                        actual = values.len(),
                        "Batch function broke the one-value-per-key contract"
                    );
                    Err(LoadError::LengthMismatch {
                        loader: name,
                        expected: keys.len(),
                        actual: values.len(),
                    })
                }
                Err(err) => {
                    tracing::warn!(loader = name, error = %err, "Batch fetch failed");
                    Err(LoadError::Store(Arc::new(err)))
                }
            };

            settle(&loader, batch_id, &keys, &outcome);
            outcome
        }
    }
}

impl<K, V, F> Dispatch for BatchLoader<K, V, F>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: BatchFn<K, V>,
{
    fn dispatch_open(&self) -> usize {
        let Some(batch) = self.inner.state.lock().open.take() else {
            return 0;
        };

        let waiting = {
            let mut batch_state = batch.state.lock();
            let BatchState::Open { keys, waiting } = &mut *batch_state else {
                return 0;
            };
            let keys = std::mem::take(keys);
            let waiting = std::mem::take(waiting);
            *batch_state = BatchState::Dispatched(self.inner.run(batch.id, keys).boxed().shared());
            waiting
        };

        for waker in waiting {
            waker.wake();
        }
        1
    }
}

/// Replace the batch's pending slots with values, or evict them on failure
fn settle<K, V, F>(loader: &Weak<Inner<K, V, F>>, batch_id: u64, keys: &[K], outcome: &Outcome<V>)
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let Some(loader) = loader.upgrade() else {
        return;
    };
    let mut state = loader.state.lock();

    for (index, key) in keys.iter().enumerate() {
        let owned = matches!(
            state.cache.get(key),
            Some(Slot::Pending { batch, .. }) if batch.id == batch_id
        );
        if !owned {
            continue;
        }
        match outcome {
            Ok(values) => {
                state
                    .cache
                    .insert(key.clone(), Slot::Ready(values[index].clone()));
            }
            Err(_) => {
                state.cache.remove(key);
            }
        }
    }
}

enum Stage<K, V> {
    Ready(V),
    Queued {
        batch: Arc<Batch<K, V>>,
        index: usize,
    },
    Fetching {
        fetch: SharedFetch<V>,
        index: usize,
    },
    Done,
}

/// Future returned by [`BatchLoader::load`]
#[must_use = "futures do nothing unless polled"]
pub struct Load<K, V, F> {
    /// Keeps the cache alive until the batch has settled into it
    _loader: Arc<Inner<K, V, F>>,
    stage: Stage<K, V>,
}

// No field is ever pinned.
impl<K, V, F> Unpin for Load<K, V, F> {}

impl<K, V, F> Future for Load<K, V, F>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: BatchFn<K, V>,
{
    type Output = Result<V, LoadError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        loop {
            match std::mem::replace(&mut this.stage, Stage::Done) {
                Stage::Ready(value) => return Poll::Ready(Ok(value)),
                Stage::Queued { batch, index } => {
                    let fetch = match &mut *batch.state.lock() {
                        BatchState::Dispatched(fetch) => Some(fetch.clone()),
                        BatchState::Open { waiting, .. } => {
                            if !waiting.iter().any(|w| w.will_wake(cx.waker())) {
                                waiting.push(cx.waker().clone());
                            }
                            None
                        }
                    };
                    match fetch {
                        Some(fetch) => this.stage = Stage::Fetching { fetch, index },
                        None => {
                            this.stage = Stage::Queued { batch, index };
                            return Poll::Pending;
                        }
                    }
                }
                Stage::Fetching { mut fetch, index } => match fetch.poll_unpin(cx) {
                    Poll::Pending => {
                        this.stage = Stage::Fetching { fetch, index };
                        return Poll::Pending;
                    }
                    Poll::Ready(outcome) => {
                        return Poll::Ready(outcome.map(|values| values[index].clone()))
                    }
                },
                Stage::Done => panic!("`Load` polled after completion"),
            }
        }
    }
}
