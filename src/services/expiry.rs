//! Expiry sweeper: reclaims seats held by lapsed PENDING bookings.
//!
//! The timer loop runs as an owned background task started by [`ExpirySweeper::spawn`]
//! and stopped through the returned [`SweeperHandle`]. A tick that finds the
//! previous batch (or an admin-triggered one) still running is skipped. Errors
//! are logged and left for the next tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::reservation::ReservationManager;
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing had lapsed.
    Idle,
    Expired(usize),
    /// Another batch was still running.
    Skipped,
    /// The batch rolled back; it will be retried next tick.
    Failed,
}

#[derive(Clone)]
pub struct ExpirySweeper {
    manager: ReservationManager,
    interval: Duration,
    // держится на время одного батча
    batch_lock: Arc<Mutex<()>>,
}

impl ExpirySweeper {
    pub fn new(manager: ReservationManager, interval: Duration) -> Self {
        Self {
            manager,
            interval,
            batch_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Timer entry point. Never fails.
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_guard) = self.batch_lock.try_lock() else {
            debug!("Previous expiry batch still running, skipping tick");
            return TickOutcome::Skipped;
        };

        match self.manager.expire_lapsed().await {
            Ok(0) => TickOutcome::Idle,
            Ok(n) => TickOutcome::Expired(n),
            Err(e) => {
                error!(error = %e, "Expiry sweep failed, will retry next tick");
                TickOutcome::Failed
            }
        }
    }

    /// On-demand batch. Waits for a running batch to finish, then runs its own.
    pub async fn run_now(&self) -> AppResult<usize> {
        let _guard = self.batch_lock.lock().await;
        self.manager.expire_lapsed().await
    }

    /// Starts the timer loop. The first tick fires immediately.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(self.run(shutdown_rx));
        SweeperHandle { shutdown_tx, join }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(interval_secs = self.interval.as_secs(), "Booking expiry sweeper started");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let TickOutcome::Expired(n) = self.tick().await {
                        debug!(processed = n, "Expiry tick done");
                    }
                }

                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        info!("Booking expiry sweeper stopped");
    }
}

/// Owner of the running sweeper task.
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the loop to stop and waits for the current tick to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.join.await {
            error!(error = %e, "Expiry sweeper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
