//! Signal handling for duskswitch.
//!
//! SIGINT, SIGTERM and SIGHUP all request a shutdown. A watcher thread turns each one into a
//! [`SignalMessage`] on an mpsc channel and clears the shared `running` flag, so the control
//! loop can leave its wait state promptly instead of sleeping until the next transition.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use crate::common::constants::SIGNAL_POLL_INTERVAL_MS;

/// Message sent from the watcher thread to the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    /// Shutdown requested (SIGTERM, SIGINT, SIGHUP)
    Shutdown,
}

/// How a call to [`SignalState::wait`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration passed without a shutdown request.
    Elapsed,
    /// A shutdown was requested before the duration passed.
    Shutdown,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Atomic flag indicating if the application should keep running
    pub running: Arc<AtomicBool>,
    /// Channel receiver for signal messages
    pub signal_receiver: mpsc::Receiver<SignalMessage>,
    /// Channel sender, also usable to request a shutdown from inside the process
    pub signal_sender: mpsc::Sender<SignalMessage>,
}

impl SignalState {
    /// State with no OS handlers attached.
    ///
    /// Used by tests and by embedders that drive shutdown through
    /// [`SignalState::request_shutdown`].
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = mpsc::channel::<SignalMessage>();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear the running flag and wake any pending wait.
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        // The receiver lives in self, so the send cannot fail while we hold &self
        let _ = self.signal_sender.send(SignalMessage::Shutdown);
    }

    /// Block for `duration` or until a shutdown request arrives.
    ///
    /// Waits in short chunks on the channel and re-checks the running flag between them.
    pub fn wait(&self, duration: Duration) -> WaitOutcome {
        let poll_interval = Duration::from_millis(SIGNAL_POLL_INTERVAL_MS);
        let start = Instant::now();

        loop {
            if !self.is_running() {
                return WaitOutcome::Shutdown;
            }

            let remaining = duration.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return WaitOutcome::Elapsed;
            }

            let chunk = remaining.min(poll_interval);
            match self.signal_receiver.recv_timeout(chunk) {
                Ok(SignalMessage::Shutdown) => {
                    self.running.store(false, Ordering::SeqCst);
                    return WaitOutcome::Shutdown;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    // Watcher thread gone; fall back to plain sleeping on the flag
                    thread::sleep(chunk);
                }
            }
        }
    }
}

/// Set up signal handling for the application.
///
/// Spawns a background thread that watches SIGINT, SIGTERM and SIGHUP and forwards each
/// as a shutdown request.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = state.running.clone();
    let signal_sender_clone = state.signal_sender.clone();

    thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            log_pipe!();
            match sig {
                SIGINT if debug_enabled => {
                    log_info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...")
                }
                SIGINT => log_info!("Received interrupt signal, initiating graceful shutdown..."),
                SIGHUP => log_info!("Received hangup signal, initiating graceful shutdown..."),
                _ => log_info!("Received termination request, initiating graceful shutdown..."),
            }

            // Set running flag to false before waking the loop
            running_clone.store(false, Ordering::SeqCst);

            if let Err(e) = signal_sender_clone.send(SignalMessage::Shutdown) {
                log_warning!("Failed to send shutdown message: {e}");
            }
        }
    });

    Ok(state)
}
