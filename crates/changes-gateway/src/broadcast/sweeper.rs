//! Idle sweeper
//!
//! Drives `TransportRegistry::on_idle` on a fixed period. Sessions of clients
//! that never come back are only ever reclaimed here, so the sweeper has to
//! be running for the lifetime of the registry.

use crate::connection::TransportRegistry;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Periodic expiry sweep over a registry
pub struct IdleSweeper {
    registry: Arc<TransportRegistry>,
    period: Duration,
    running: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl IdleSweeper {
    /// Create a sweeper; nothing runs until `start`
    pub fn new(registry: Arc<TransportRegistry>, period: Duration) -> Self {
        Self {
            registry,
            period,
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// Spawn the sweep loop on the current runtime
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Idle sweeper is already running");
            return;
        }

        let sweeper = Arc::clone(self);
        let handle = tokio::spawn(async move {
            sweeper.run().await;
        });
        *self.task.lock() = Some(handle);

        tracing::info!(period_ms = self.period.as_millis(), "Idle sweeper started");
    }

    /// Stop the sweep loop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        tracing::info!("Idle sweeper stopped");
    }

    async fn run(&self) {
        // First sweep one period after start, not immediately.
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            let removed = self.registry.on_idle();
            tracing::trace!(
                removed = removed,
                sessions = self.registry.connection_count(),
                "Idle tick"
            );
        }

        tracing::debug!("Idle sweeper loop ended");
    }

    /// Check if the sweeper is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for IdleSweeper {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for IdleSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleSweeper")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish()
    }
}
