//! # duskswitch Library
//!
//! Switches a serial-controlled light fixture on at sunset and off at dawn.
//!
//! This library exists to enable testing of the control loop and the device protocol, and
//! to keep CLI dispatch (main.rs) separate from application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Duskswitch` acquires resources and starts the scheduler
//! - **Scheduler**: `scheduler` holds the Determine/Act/Wait control loop
//! - **Device**: `device` speaks the controller's line protocol over a serial port
//! - **Geographic**: `geo` computes civil dawn and sunset for a fixed location
//! - **Configuration**: `config` for TOML-based settings with validation
//! - **Infrastructure**: diagnostic log, time source, signal handling and console logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

// Public API modules
pub mod args;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod geo;
pub mod io;
pub mod scheduler;
pub mod time_source;

#[cfg(any(test, feature = "testing-support"))]
pub mod testing;

mod duskswitch;

// Re-export for binary
pub use duskswitch::Duskswitch;
