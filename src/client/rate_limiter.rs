//! Dual-layer rate limiter for outbound Apollo requests.
//!
//! Two independent layers must both be satisfied before a request is
//! dispatched, in order: the sliding-window counter, then the concurrency
//! gate. The window prevents bursts that stay under the concurrency cap but
//! exceed the provider's requests-per-second budget; the gate bounds how many
//! requests are in flight at any instant regardless of elapsed time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Mutable sliding-window state, a single critical section.
#[derive(Debug)]
struct WindowState {
    started_at: Instant,
    count: usize,
}

/// Admission gate for outbound requests.
///
/// Instances are independent, so separate limiters can enforce separate
/// budgets (e.g. per tenant). All waits are timed suspensions of the calling
/// task; sibling tasks are never blocked.
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    state: Mutex<WindowState>,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
}

/// RAII permit for one in-flight request.
///
/// Held for the whole request, including failure paths; dropping it releases
/// the concurrency slot.
pub struct RatePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl RatePermit {
    /// Number of requests currently in flight, including this one.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Drop for RatePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RateLimiter {
    /// Create a limiter admitting at most `max` requests in flight and at
    /// most `max` request starts per `window`.
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max_per_window: max,
            window,
            state: Mutex::new(WindowState {
                started_at: Instant::now(),
                count: 0,
            }),
            semaphore: Arc::new(Semaphore::new(max)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Acquire admission for one request: window first, then a concurrency slot.
    ///
    /// Suspends the calling task until both layers admit it. The returned
    /// permit must be held until the request completes.
    pub async fn acquire(&self) -> RatePermit {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.started_at);
                if elapsed >= self.window {
                    state.started_at = now;
                    state.count = 0;
                }
                if state.count < self.max_per_window {
                    state.count += 1;
                    None
                } else {
                    // Window exhausted; suspend until it rolls over.
                    Some(self.window.saturating_sub(elapsed))
                }
            };

            match wait {
                None => break,
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }

        // The semaphore is never closed, so acquisition cannot fail.
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("rate limiter semaphore closed");
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        RatePermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }

    /// Requests started in the current window (diagnostic).
    pub async fn window_count(&self) -> usize {
        self.state.lock().await.count
    }
}
