//! Probe supervisor.
//!
//! # Responsibilities
//! - Own the targets and the shared collaborators
//! - Run exactly one probe loop per target
//! - Restart a loop that panicked, isolated from every other target
//! - Stop every loop through one coordinated, idempotent path
//!
//! # Task Layout
//! ```text
//! Watcher::start
//!     ├── signal listener (SIGINT/SIGTERM → Shutdown::trigger)
//!     └── per target: supervisor task
//!             └── probe loop task (respawned fresh, at INIT, after a panic)
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time;

use crate::dispatch::Dispatcher;
use crate::health::active::ProbeLoop;
use crate::health::probe::Prober;
use crate::health::target::TargetSpec;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("watcher already started")]
    AlreadyStarted,
}

/// Runs and supervises one probe loop per target.
pub struct Watcher {
    targets: Vec<Arc<TargetSpec>>,
    prober: Arc<dyn Prober>,
    dispatcher: Arc<Dispatcher>,
    shutdown: Shutdown,
    handle_signals: bool,
    started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// Handles taken over by `stop` and not yet joined. The async lock also
    /// serializes `stop`, so a concurrent caller waits for the same join.
    joining: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
    sinks_closed: AtomicBool,
}

impl Watcher {
    pub fn new(targets: Vec<TargetSpec>, prober: Arc<dyn Prober>, dispatcher: Dispatcher) -> Self {
        Self {
            targets: targets.into_iter().map(Arc::new).collect(),
            prober,
            dispatcher: Arc::new(dispatcher),
            shutdown: Shutdown::new(),
            handle_signals: true,
            started: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
            joining: tokio::sync::Mutex::new(Vec::new()),
            sinks_closed: AtomicBool::new(false),
        }
    }

    /// Whether `start` installs the SIGINT/SIGTERM listener (default: yes).
    pub fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    pub fn targets(&self) -> &[Arc<TargetSpec>] {
        &self.targets
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle to the shared shutdown signal.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Spawn the signal listener and one supervised loop per target.
    ///
    /// Returns once everything is spawned. Must be called inside a Tokio
    /// runtime.
    pub fn start(&self) -> Result<(), WatcherError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(WatcherError::AlreadyStarted);
        }

        tracing::info!(targets = self.targets.len(), "Watcher starting");

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if self.handle_signals {
            tasks.push(signals::spawn_listener(self.shutdown.clone()));
        }
        for spec in &self.targets {
            tasks.push(tokio::spawn(supervise(
                spec.clone(),
                self.prober.clone(),
                self.dispatcher.clone(),
                self.shutdown.clone(),
            )));
        }
        Ok(())
    }

    /// Resolve once shutdown has been triggered (by a signal or by `stop`).
    pub async fn wait_for_shutdown(&self) {
        self.shutdown.subscribe().recv().await;
    }

    /// Cancel every loop and wait until all of them have exited, then close
    /// the sinks. Idempotent; a no-op before `start`. A `stop` dropped
    /// midway is finished by the next call.
    pub async fn stop(&self) {
        let mut pending = self.joining.lock().await;
        if !self.started.load(Ordering::SeqCst) {
            return;
        }
        self.shutdown.trigger();

        pending.append(&mut self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        if pending.is_empty() && self.sinks_closed.load(Ordering::SeqCst) {
            return;
        }

        tracing::info!(tasks = pending.len(), "Watcher stopping");
        // A handle leaves the queue only once it has been joined.
        while let Some(task) = pending.last_mut() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Watcher task ended abnormally");
            }
            pending.pop();
        }
        self.dispatcher.close().await;
        self.sinks_closed.store(true, Ordering::SeqCst);
        tracing::info!("Watcher stopped");
    }
}

/// Keep one probe loop alive for `spec` until shutdown.
async fn supervise(
    spec: Arc<TargetSpec>,
    prober: Arc<dyn Prober>,
    dispatcher: Arc<Dispatcher>,
    shutdown: Shutdown,
) {
    let mut signal = shutdown.subscribe();

    loop {
        let probe_loop = ProbeLoop::new(
            spec.clone(),
            prober.clone(),
            dispatcher.clone(),
            shutdown.subscribe(),
        );

        match tokio::spawn(probe_loop.run()).await {
            Ok(()) => break,
            Err(e) if e.is_panic() => {
                let reason = panic_reason(e.into_panic());
                tracing::error!(
                    url = %spec.url,
                    reason = %reason,
                    restart_in = ?spec.interval,
                    "Probe loop panicked, restarting"
                );
                metrics::record_loop_restart(&spec.url);
            }
            Err(e) => {
                tracing::error!(url = %spec.url, error = %e, "Probe loop cancelled");
                break;
            }
        }

        // A loop that faults on every attempt must not spin.
        tokio::select! {
            _ = time::sleep(spec.interval) => {}
            _ = signal.recv() => break,
        }
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
