//! Per-key single-flight task queues.
//!
//! A `SeqQueue` executes asynchronous tasks strictly in submission order,
//! one at a time. The `QueueRegistry` keys queues by fingerprint so that
//! operations sharing a fingerprint serialize while operations on different
//! fingerprints run fully in parallel. Queues are created on first use and
//! removed when they drain; both transitions are atomic with lookup.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::debug;

use common::Error;

/// A boxed task future executed by a queue.
pub type TaskFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

type OnEmpty = Box<dyn Fn() + Send + Sync>;

/// Sequential task queue that is future-friendly. Each pushed task settles
/// its pusher's future with the task's own outcome, unaltered.
pub struct SeqQueue<T> {
    state: Mutex<QueueState<T>>,
    on_empty: OnEmpty,
}

struct QueueState<T> {
    pending: VecDeque<QueueTask<T>>,
    busy: bool,
    dead: bool,
}

struct QueueTask<T> {
    fut: TaskFuture<T>,
    reply: oneshot::Sender<Result<T, Error>>,
}

impl<T: Send + 'static> SeqQueue<T> {
    /// Create a queue. `on_empty` fires every time the queue drains to
    /// empty, so the owner can drop it from a keyed registry.
    pub fn new(on_empty: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                busy: false,
                dead: false,
            }),
            on_empty: Box::new(on_empty),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue a task. The returned receiver settles with the task's
    /// outcome once the task reaches the head of the queue and completes.
    /// Fails immediately if the queue has been disposed.
    pub fn push(
        self: &Arc<Self>,
        fut: TaskFuture<T>,
    ) -> Result<oneshot::Receiver<Result<T, Error>>, Error> {
        let (tx, rx) = oneshot::channel();

        let spawn_driver = {
            let mut state = self.lock();
            if state.dead {
                return Err(Error::QueueDisposed);
            }

            state.pending.push_back(QueueTask { fut, reply: tx });
            let was_idle = !state.busy;
            if was_idle {
                state.busy = true;
            }
            was_idle
        };

        if spawn_driver {
            let queue = Arc::clone(self);
            tokio::spawn(queue.drive());
        }

        Ok(rx)
    }

    /// Mark the queue dead and reject all unstarted tasks. An in-flight
    /// task runs to completion; new pushes fail.
    pub fn cancel(&self) {
        let rejected: Vec<QueueTask<T>> = {
            let mut state = self.lock();
            state.dead = true;
            state.pending.drain(..).collect()
        };

        for task in rejected {
            let _ = task.reply.send(Err(Error::QueueDisposed));
        }
    }

    /// True when nothing is pending or in flight.
    pub fn is_idle(&self) -> bool {
        let state = self.lock();
        !state.busy && state.pending.is_empty()
    }

    async fn drive(self: Arc<Self>) {
        loop {
            let task = {
                let mut state = self.lock();
                match state.pending.pop_front() {
                    Some(task) => task,
                    None => {
                        state.busy = false;
                        break;
                    }
                }
            };

            let outcome = task.fut.await;
            let _ = task.reply.send(Ok(outcome));
        }

        (self.on_empty)();
    }
}

/// Fingerprint-keyed registry of single-flight queues.
///
/// Pushes happen while the map entry guard is held, so a task can never land
/// on a queue that is concurrently being removed; removal on drain re-checks
/// idleness under the same map lock.
pub struct QueueRegistry<T> {
    queues: Arc<DashMap<String, Arc<SeqQueue<T>>>>,
}

impl<T: Send + 'static> QueueRegistry<T> {
    pub fn new() -> Self {
        Self {
            queues: Arc::new(DashMap::new()),
        }
    }

    /// Number of live queues. Drained queues are removed eagerly.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Run a task on the queue for `key`, serialized after everything
    /// already queued under that key.
    pub async fn run(&self, key: &str, fut: TaskFuture<T>) -> Result<T, Error> {
        let pushed = {
            let entry = self
                .queues
                .entry(key.to_string())
                .or_insert_with(|| self.make_queue(key));
            entry.value().push(fut)
        };

        match pushed?.await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::QueueDisposed),
        }
    }

    fn make_queue(&self, key: &str) -> Arc<SeqQueue<T>> {
        debug!("creating single-flight queue for {}", key);

        let queues = Arc::clone(&self.queues);
        let key = key.to_string();
        Arc::new(SeqQueue::new(move || {
            queues.remove_if(&key, |_, queue| queue.is_idle());
        }))
    }

    /// Cancel every queue and clear the registry.
    pub fn clear(&self) {
        self.queues.retain(|_, queue| {
            queue.cancel();
            false
        });
    }
}

impl<T: Send + 'static> Default for QueueRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
