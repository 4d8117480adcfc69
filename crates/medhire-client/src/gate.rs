//! Single-flight refresh coordination
//!
//! The gate enforces the "at most one refresh call in flight" invariant
//! under preemptive scheduling. A request entering the recovery path
//! records the epoch it observed at dispatch, then acquires the gate.
//! Tokio's Mutex queues waiters fairly, so continuations resume in FIFO
//! enqueue order. If the epoch advanced while waiting, a caller ahead in
//! the queue already rotated the tokens and the waiter replays without
//! issuing its own refresh.
//!
//! The epoch only moves forward on a *successful* refresh. A failed
//! refresh leaves it unchanged; waiters then find the credential store
//! empty (the failure path clears it) and fail without touching the
//! network.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, MutexGuard};

/// Permit proving the holder owns the refresh critical section.
pub struct RefreshPermit<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// Refresh coordinator: an epoch counter plus a FIFO critical section.
#[derive(Default)]
pub struct RefreshGate {
    epoch: AtomicU64,
    lock: Mutex<()>,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current refresh epoch. Sampled before dispatch; compared after
    /// acquiring the gate to detect a refresh completed by another caller.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Enter the refresh critical section. Waiters are resumed in
    /// acquisition order.
    pub async fn acquire(&self) -> RefreshPermit<'_> {
        RefreshPermit {
            _guard: self.lock.lock().await,
        }
    }

    /// Record a successful token rotation. Requires the permit so the
    /// epoch can only advance from inside the critical section.
    pub fn advance(&self, _permit: &RefreshPermit<'_>) {
        self.epoch.fetch_add(1, Ordering::Release);
    }
}
