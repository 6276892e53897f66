//! Shared, re-entrant busy indicator.
//!
//! A depth counter with scoped guards: the first guard turns the indicator
//! on, the last one dropped turns it off. Nested operations such as the pass
//! runs inside an optimize never toggle it.

use std::sync::Arc;

use tokio::sync::watch;

/// Busy state shared by every session in a registry.
///
/// The depth lives inside the watch channel, so each count change and the
/// decision to notify happen under the same lock.
#[derive(Debug, Clone)]
pub struct BusyIndicator {
    depth: Arc<watch::Sender<usize>>,
}

impl Default for BusyIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl BusyIndicator {
    /// Create an idle indicator.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { depth: Arc::new(tx) }
    }

    /// Mark an operation as running until the returned guard is dropped.
    #[must_use = "the indicator is released when the guard is dropped"]
    pub fn acquire(&self) -> BusyGuard {
        self.depth.send_if_modified(|depth| {
            *depth += 1;
            *depth == 1
        });
        BusyGuard {
            indicator: self.clone(),
        }
    }

    /// Whether any operation holds a guard.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.depth() > 0
    }

    /// Number of live guards.
    #[must_use]
    pub fn depth(&self) -> usize {
        *self.depth.borrow()
    }

    /// Receiver for spinners. Non-zero means busy; only the idle/busy
    /// transitions mark it changed.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.depth.subscribe()
    }
}

/// Scoped hold on a [`BusyIndicator`].
#[derive(Debug)]
pub struct BusyGuard {
    indicator: BusyIndicator,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.indicator.depth.send_if_modified(|depth| {
            *depth = depth.saturating_sub(1);
            *depth == 0
        });
    }
}
