//! Background config refresh.

use crate::config::MIN_POLLING_INTERVAL;
use crate::error::{ClientError, Result};
use crate::source::ConfigSource;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tggl_flags::{ConfigSnapshot, ConfigStore};
use tggl_log::{TARGET_POLLER, debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodically fetches flag definitions into a [`ConfigStore`].
///
/// The first fetch starts immediately, then one runs every interval. A
/// fetch never overlaps another one. Failed fetches are logged and the
/// store keeps its previous snapshot.
pub struct Poller {
    ready: Arc<watch::Sender<bool>>,
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    /// Start polling `source` into `store`.
    ///
    /// Must be called from within a tokio runtime. Intervals shorter than
    /// [`MIN_POLLING_INTERVAL`] are raised to it.
    pub fn spawn(source: Arc<dyn ConfigSource>, store: Arc<ConfigStore>, interval: Duration) -> Self {
        let interval = interval.max(MIN_POLLING_INTERVAL);
        let (ready, _) = watch::channel(false);
        let ready = Arc::new(ready);
        let (shutdown, mut stop) = watch::channel(false);

        debug!(target: TARGET_POLLER, "Starting config poller every {:?}", interval);

        let task_ready = ready.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // Dropping the poller closes the channel and ends the loop too
                tokio::select! {
                    biased;
                    _ = stop.changed() => break,
                    _ = ticker.tick() => {}
                }

                match source.fetch().await {
                    Ok(flags) => {
                        let snapshot = ConfigSnapshot::from_flags(flags);
                        debug!(target: TARGET_POLLER, "Fetched {} flag(s)", snapshot.len());
                        store.replace(snapshot);

                        if task_ready.send_if_modified(|ready| !std::mem::replace(ready, true)) {
                            info!(target: TARGET_POLLER, "Flag config loaded");
                        }
                    }
                    Err(e) => {
                        warn!(target: TARGET_POLLER, "Failed to fetch flag config: {}", e);
                    }
                }
            }

            debug!(target: TARGET_POLLER, "Config poller stopped");
        });

        Self {
            ready,
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Wait for the first successful fetch.
    ///
    /// Returns immediately once a fetch has succeeded. Returns
    /// [`ClientError::Closed`] when the poller is closed before that.
    pub async fn ready(&self) -> Result<()> {
        let mut ready = self.ready.subscribe();
        let mut shutdown = self.shutdown.subscribe();

        loop {
            if *ready.borrow_and_update() {
                return Ok(());
            }
            if *shutdown.borrow_and_update() {
                return Err(ClientError::Closed);
            }

            tokio::select! {
                _ = ready.changed() => {}
                _ = shutdown.changed() => {}
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Stop polling.
    ///
    /// No fetch starts after this call. A fetch already running completes
    /// and its result is still applied.
    pub async fn close(&self) {
        self.shutdown.send_replace(true);

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
