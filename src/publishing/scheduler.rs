//! Tick Scheduler
//!
//! Calls `PublishWorker::process_next` on a fixed period from a single background
//! task, so ticks never overlap. A tick that runs long pushes the next one back
//! (`MissedTickBehavior::Delay`) instead of causing a burst of catch-up ticks.
//!
//! Each tick runs on its own spawned task and is awaited before the next one, so a
//! tick that errors or panics is logged and the loop keeps going.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::worker::PublishWorker;

pub struct Scheduler {
    worker: Arc<PublishWorker>,
    period: Duration,
    /// Present while RUNNING.
    tick_loop: Mutex<Option<TickLoop>>,
    running: AtomicBool,
    ticks: Arc<AtomicU64>,
}

struct TickLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn new(worker: Arc<PublishWorker>, period: Duration) -> Self {
        Self {
            worker,
            period,
            tick_loop: Mutex::new(None),
            running: AtomicBool::new(false),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Starts ticking. Calling it while already running does nothing.
    ///
    /// The first tick fires immediately.
    pub async fn start(&self) {
        let mut tick_loop = self.tick_loop.lock().await;
        if tick_loop.is_some() {
            tracing::debug!("Scheduler already running");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(Self::run(
            self.worker.clone(),
            self.period,
            self.ticks.clone(),
            shutdown_rx,
        ));

        *tick_loop = Some(TickLoop { shutdown, handle });
        self.running.store(true, Ordering::SeqCst);

        tracing::info!("Scheduler started (period: {:?})", self.period);
    }

    /// Stops ticking.
    ///
    /// Waits for an in-flight tick to finish; once this returns no further tick
    /// will run until `start` is called again.
    pub async fn stop(&self) {
        let mut tick_loop = self.tick_loop.lock().await;
        let Some(TickLoop { shutdown, handle }) = tick_loop.take() else {
            return;
        };

        let _ = shutdown.send(true);
        if let Err(e) = handle.await {
            tracing::error!("Scheduler loop terminated abnormally: {}", e);
        }
        self.running.store(false, Ordering::SeqCst);

        tracing::info!("Scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ticks run since construction, across restarts.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    async fn run(
        worker: Arc<PublishWorker>,
        period: Duration,
        ticks: Arc<AtomicU64>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = interval.tick() => {}
            }

            let tick = ticks.fetch_add(1, Ordering::SeqCst) + 1;
            let worker = worker.clone();

            match tokio::spawn(async move { worker.process_next().await }).await {
                Ok(Ok(Some(entry))) => {
                    tracing::debug!(
                        "Tick {} finished {} as {:?}",
                        tick,
                        entry.publishing_record_id,
                        entry.status
                    );
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    tracing::error!("Tick {} failed: {}", tick, e);
                }
                Err(e) => {
                    tracing::error!("Tick {} panicked: {}", tick, e);
                }
            }
        }

        tracing::debug!("Scheduler loop exited");
    }
}
