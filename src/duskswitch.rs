//! Application coordinator that manages the complete lifecycle of duskswitch.
//!
//! This module handles resource acquisition and hands everything to the scheduler:
//! - Configuration loading
//! - Diagnostic log setup
//! - Signal handler setup
//! - Serial connection and handshake
//!
//! `Duskswitch::new(port, debug_enabled).run()` is the normal entry point;
//! `with_config_path` selects a configuration file other than the default one.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    config::Config,
    device::{self, DeviceError},
    diagnostics::{self, DiagnosticLog, DiagnosticSink},
    io::signals::setup_signal_handler,
    scheduler::{Scheduler, SchedulerParams},
    time_source::{RealTimeSource, TimeSource},
};

/// Builder for configuring and running duskswitch.
///
/// # Examples
///
/// ```no_run
/// use duskswitch::Duskswitch;
///
/// # fn main() -> anyhow::Result<()> {
/// Duskswitch::new("/dev/ttyUSB0", false)
///     .with_config_path(Some("/etc/duskswitch.toml".into()))
///     .run()?;
/// # Ok(())
/// # }
/// ```
pub struct Duskswitch {
    port: String,
    debug_enabled: bool,
    config_path: Option<PathBuf>,
}

impl Duskswitch {
    pub fn new(port: impl Into<String>, debug_enabled: bool) -> Self {
        Self {
            port: port.into(),
            debug_enabled,
            config_path: None,
        }
    }

    /// Use a specific configuration file instead of the default location.
    pub fn with_config_path(mut self, config_path: Option<PathBuf>) -> Self {
        self.config_path = config_path;
        self
    }

    /// Connect to the controller and run the control loop until shutdown.
    ///
    /// Returns `Ok(())` after an operator-requested shutdown.
    pub fn run(self) -> Result<()> {
        let config = Config::load(self.config_path.as_deref())?;
        let source = match &self.config_path {
            Some(path) => format!("configuration from {}", path.display()),
            None => "configuration".to_string(),
        };
        config.log_config(&source);

        let location = config.location()?;
        let link = config.link_settings();

        let mut diagnostics = DiagnosticLog::open(config.log_file_path())?;

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        let clock: Arc<dyn TimeSource> = Arc::new(RealTimeSource);
        let timezone = location.timezone;
        let stamped = |text: &str| diagnostics::stamped(clock.now(), timezone, text);

        log_block_start!("Connecting to controller on {}", self.port);
        let session = match device::connect(&self.port, &link) {
            Ok(session) => session.with_debug(self.debug_enabled),
            Err(e) => {
                let line = match &e {
                    DeviceError::HandshakeFailed { received } => {
                        format!("Unexpected response from controller: {received}")
                    }
                    other => format!("Failed to connect: {other}"),
                };
                // The connection error matters more than a failed log write
                let _ = diagnostics.record(&stamped(&line));
                return Err(e).with_context(|| format!("Could not connect to {}", self.port));
            }
        };
        diagnostics.record(&stamped("connected"))?;
        log_decorated!("Connected");

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled - showing serial traffic");
        }

        let mut scheduler = Scheduler::new(SchedulerParams {
            session,
            fixture: config.fixture(),
            location,
            policy: config.post_sunset_policy(),
            polar_retry: config.polar_retry_interval(),
            clock,
            diagnostics: Box::new(diagnostics),
            debug_enabled: self.debug_enabled,
        });

        scheduler.run(&signal_state)?;

        log_block_start!("Shutting down");
        Ok(())
    }
}
