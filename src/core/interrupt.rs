//! Termination-signal handling.
//!
//! Signals never run cleanup themselves. The watcher only records which
//! signal arrived; the executor notices, kills the running child and returns
//! an `Interrupted` error that unwinds through the teardown guard.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{debug, info, warn};

const NOT_TRIGGERED: i32 = 0;

/// Shared record of a received termination signal.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    signal: Arc<AtomicI32>,
}

impl Interrupt {
    /// A token that is never triggered by the OS; tests trigger it by hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token and start watching SIGINT, SIGTERM, SIGHUP and SIGQUIT.
    ///
    /// The watcher runs on its own thread with a current-thread tokio
    /// runtime. This returns only once the handlers are registered, so a
    /// signal arriving afterwards is always recorded. If the handlers cannot
    /// be registered, the run continues without interruption support.
    pub fn install() -> Self {
        let interrupt = Self::new();
        let token = interrupt.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<bool>();

        let spawned = std::thread::Builder::new()
            .name("kindrun-signals".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        warn!(error = %e, "failed to start signal runtime");
                        let _ = ready_tx.send(false);
                        return;
                    }
                };
                rt.block_on(watch(token, ready_tx));
            });

        match spawned {
            Ok(_) => {
                if !matches!(ready_rx.recv(), Ok(true)) {
                    warn!("running without interruption support");
                }
            }
            Err(e) => warn!(error = %e, "failed to spawn signal watcher"),
        }

        interrupt
    }

    /// Record `signal` as received. Only the first signal is kept.
    pub fn trigger(&self, signal: i32) {
        let _ = self.signal.compare_exchange(
            NOT_TRIGGERED,
            signal,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// The received signal number, if any.
    pub fn signal(&self) -> Option<i32> {
        match self.signal.load(Ordering::SeqCst) {
            NOT_TRIGGERED => None,
            signal => Some(signal),
        }
    }
}

#[cfg(unix)]
async fn watch(token: Interrupt, ready: mpsc::Sender<bool>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigint, mut sigterm, mut sighup, mut sigquit) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
        signal(SignalKind::quit()),
    ) {
        (Ok(int), Ok(term), Ok(hup), Ok(quit)) => (int, term, hup, quit),
        _ => {
            warn!("failed to register signal handlers");
            let _ = ready.send(false);
            return;
        }
    };
    debug!("signal handlers registered");
    let _ = ready.send(true);

    let (name, number) = tokio::select! {
        _ = sigint.recv() => ("SIGINT", 2),
        _ = sigterm.recv() => ("SIGTERM", 15),
        _ = sighup.recv() => ("SIGHUP", 1),
        _ = sigquit.recv() => ("SIGQUIT", 3),
    };

    info!(signal = name, "received termination signal, tearing down");
    token.trigger(number);
}

#[cfg(not(unix))]
async fn watch(token: Interrupt, ready: mpsc::Sender<bool>) {
    let _ = ready.send(true);
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    info!(signal = "SIGINT", "received ctrl-c, tearing down");
    token.trigger(2);
}
