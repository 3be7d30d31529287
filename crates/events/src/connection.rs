//! Active-connection accounting for the dashboard WebSocket fan-out.
//!
//! `broadcast` already fans out to every subscribed task, so there is no
//! manually-maintained set of socket handles here — each handler task
//! subscribes on connect and its loop exit is the disconnect. This only
//! tracks the count for the active-connections gauge.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
    count: Arc<AtomicI64>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    /// RAII guard: increments on creation, decrements on drop. Hold one for
    /// the lifetime of a single WebSocket handler task.
    pub fn track(&self) -> ConnectionGuard {
        self.count.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard { count: self.count.clone() }
    }
}

pub struct ConnectionGuard {
    count: Arc<AtomicI64>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_rises_and_falls_with_guard_lifetime() {
        let manager = ConnectionManager::new();
        assert_eq!(manager.connection_count(), 0);

        let guard = manager.track();
        assert_eq!(manager.connection_count(), 1);

        let guard2 = manager.track();
        assert_eq!(manager.connection_count(), 2);

        drop(guard);
        assert_eq!(manager.connection_count(), 1);
        drop(guard2);
        assert_eq!(manager.connection_count(), 0);
    }
}
