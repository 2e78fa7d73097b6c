//! Debounced unsubscription scheduling.

use crate::types::FeedId;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Callback invoked for each feed whose grace period has elapsed.
///
/// The callback runs on the sweeper thread with no scheduler lock held; it is
/// responsible for isolating its own failures.
pub type ExpireFn = Box<dyn Fn(&FeedId) + Send + Sync>;

/// A feed awaiting provider-level unsubscription.
///
/// Ordered by `(deadline, seq)`; `seq` is the insertion counter, so equal
/// deadlines expire in schedule order, deterministically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct PendingUnsubscribe {
    deadline: Instant,
    seq: u64,
    feed: FeedId,
}

struct SchedulerInner {
    /// Min-heap of pending entries by deadline.
    heap: BinaryHeap<Reverse<PendingUnsubscribe>>,

    /// Live entry per feed, keyed to its heap entry's `seq`. Removal here is
    /// the lazy-deletion tombstone: stale heap entries are skipped at pop.
    live: HashMap<FeedId, u64>,

    next_seq: u64,
}

/// Time-ordered pending-removal queue with a periodic sweeper.
///
/// `schedule` is O(log n), `cancel` O(1), and each sweep pops only the
/// elapsed prefix of the heap. A feed's entry is consumed by exactly one of
/// cancel or sweep — both resolve it against the live index under the same
/// lock.
pub struct UnsubscriptionScheduler {
    grace_period: Duration,
    inner: Arc<Mutex<SchedulerInner>>,
    on_expire: Arc<ExpireFn>,
    shutdown: Option<Sender<()>>,
    sweeper: Option<JoinHandle<()>>,
}

impl UnsubscriptionScheduler {
    /// Create a scheduler. The sweeper thread is not started until
    /// [`start_sweeper`](Self::start_sweeper) is called.
    pub fn new(grace_period: Duration, on_expire: ExpireFn) -> Self {
        Self {
            grace_period,
            inner: Arc::new(Mutex::new(SchedulerInner {
                heap: BinaryHeap::new(),
                live: HashMap::new(),
                next_seq: 0,
            })),
            on_expire: Arc::new(on_expire),
            shutdown: None,
            sweeper: None,
        }
    }

    /// Start the background sweeper, running one pass every `interval`.
    pub fn start_sweeper(&mut self, interval: Duration) {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let inner = Arc::clone(&self.inner);
        let on_expire = Arc::clone(&self.on_expire);

        let handle = std::thread::spawn(move || loop {
            match shutdown_rx.recv_timeout(interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => Self::sweep(&inner, &on_expire),
            }
        });

        self.shutdown = Some(shutdown_tx);
        self.sweeper = Some(handle);
    }

    /// Register `feed` for unsubscription after the grace period.
    ///
    /// If the feed already has a pending entry this is a no-op: the first
    /// deadline wins, so repeated unsubscribes do not reset the clock.
    pub fn schedule(&self, feed: FeedId) {
        let mut inner = self.inner.lock();
        if inner.live.contains_key(&feed) {
            return;
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;

        let deadline = Instant::now() + self.grace_period;
        inner.live.insert(feed.clone(), seq);
        inner.heap.push(Reverse(PendingUnsubscribe {
            deadline,
            seq,
            feed,
        }));
    }

    /// Remove `feed`'s pending entry, returning whether one was found.
    pub fn cancel(&self, feed: &FeedId) -> bool {
        self.inner.lock().live.remove(feed).is_some()
    }

    /// Number of feeds currently pending unsubscription.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().live.len()
    }

    /// Run one sweep pass immediately. Deadlines still apply; only elapsed
    /// entries expire.
    pub fn sweep_once(&self) {
        Self::sweep(&self.inner, &self.on_expire);
    }

    /// Pop the elapsed prefix under the lock, then expire outside it.
    fn sweep(inner: &Mutex<SchedulerInner>, on_expire: &ExpireFn) {
        let expired = {
            let mut inner = inner.lock();
            let now = Instant::now();
            let mut expired = Vec::new();

            loop {
                let elapsed = match inner.heap.peek() {
                    Some(Reverse(head)) => head.deadline <= now,
                    None => false,
                };
                if !elapsed {
                    break;
                }

                if let Some(Reverse(entry)) = inner.heap.pop() {
                    // Stale entries (cancelled or re-armed) are skipped.
                    if inner.live.get(&entry.feed).copied() == Some(entry.seq) {
                        inner.live.remove(&entry.feed);
                        expired.push(entry.feed);
                    }
                }
            }

            expired
        };

        for feed in &expired {
            on_expire(feed);
        }
    }
}

impl Drop for UnsubscriptionScheduler {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.try_send(());
        }
        if let Some(handle) = self.sweeper.take() {
            let _ = handle.join();
        }
    }
}
