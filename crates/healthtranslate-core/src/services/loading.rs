//! In-flight operation gauge.
//!
//! Loading is visible while *any* operation is outstanding, so the gauge
//! counts rather than toggles: overlapping operations each hold a guard,
//! and the indicator clears only when the last one settles. Guards release
//! on drop, which covers every exit path including cancellation.

use std::sync::Arc;

use tokio::sync::watch;

/// Counted loading indicator shared by all session operations.
#[derive(Debug)]
pub struct LoadingGauge {
    count: watch::Sender<usize>,
}

impl LoadingGauge {
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (count, _) = watch::channel(0);
        Arc::new(Self { count })
    }

    /// Mark one operation as dispatched. The returned guard marks it
    /// settled when dropped.
    #[must_use]
    pub fn begin(self: &Arc<Self>) -> LoadingGuard {
        self.count.send_modify(|n| *n += 1);
        LoadingGuard {
            gauge: Arc::clone(self),
        }
    }

    /// Whether any operation is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.count.borrow() > 0
    }

    /// Observe the in-flight count as it changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }
}

/// RAII guard for one in-flight operation.
#[derive(Debug)]
pub struct LoadingGuard {
    gauge: Arc<LoadingGauge>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.gauge.count.send_modify(|n| {
            debug_assert!(*n > 0, "loading gauge underflow");
            *n = n.saturating_sub(1);
        });
    }
}
