//! Configuration for duskswitch with validation.
//!
//! Settings come from an optional TOML file. Every field has a built-in default matching
//! the reference installation, so running without a configuration file is supported.
//!
//! ## Configuration Sources
//!
//! 1. The file passed with `--config <FILE>` (must exist)
//! 2. **XDG_CONFIG_HOME**/duskswitch/duskswitch.toml (optional)
//! 3. Built-in defaults
//!
//! ## Configuration Structure
//!
//! ```toml
//! #[Location]
//! latitude = 47.763212           # Geographic latitude (-90 to 90)
//! longitude = -122.0684          # Geographic longitude (-180 to 180)
//! timezone = "US/Pacific"        # IANA timezone of the installation
//!
//! #[Serial link]
//! baud_rate = 115200
//! read_timeout_ms = 5000         # Bound on every blocking read (100-600000)
//! greeting = "Remote Light Controller:"
//!
//! #[Scheduling]
//! post_sunset_policy = "legacy"  # "legacy" or "next_dawn"
//! polar_retry_secs = 3600        # Re-poll interval on polar days (60-86400)
//!
//! #[Diagnostics]
//! log_file = "lights.log"
//!
//! [[groups]]
//! name = "south"
//! channel = 4
//!
//! [[groups]]
//! name = "north"
//! channel = 12
//! ```

pub mod loading;
pub mod validation;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::constants::*;
use crate::device::{Fixture, LightGroup, LinkSettings};
use crate::geo::Location;

pub use loading::{get_config_path, load, load_from_path, parse};

/// How long to wait after sunset, before the next dawn is known.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostSunsetPolicy {
    /// Wait for the magnitude of today's (already past) dawn offset.
    ///
    /// The next cycle normally lands after midnight and re-derives the schedule for the
    /// new date, but the wake-up time itself is not tomorrow's dawn.
    #[default]
    Legacy,
    /// Compute tomorrow's dawn and wait exactly until it.
    NextDawn,
}

impl PostSunsetPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostSunsetPolicy::Legacy => "legacy",
            PostSunsetPolicy::NextDawn => "next_dawn",
        }
    }
}

/// One `[[groups]]` entry.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GroupConfig {
    pub name: String,
    pub channel: u32,
}

/// Configuration structure for duskswitch.
///
/// All fields are optional; accessors resolve missing values to defaults.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// IANA timezone name, e.g. "US/Pacific"
    pub timezone: Option<String>,

    pub baud_rate: Option<u32>,
    pub read_timeout_ms: Option<u64>,
    pub greeting: Option<String>,

    pub post_sunset_policy: Option<PostSunsetPolicy>,
    pub polar_retry_secs: Option<u64>,

    /// Diagnostic log path, relative to the working directory unless absolute
    pub log_file: Option<String>,

    /// Light groups in command order
    pub groups: Option<Vec<GroupConfig>>,
}

impl Config {
    /// Load from `--config` if given, otherwise from the default location if present.
    pub fn load(custom_path: Option<&Path>) -> Result<Self> {
        load(custom_path)
    }

    /// Parse the configured timezone.
    pub fn timezone(&self) -> Result<Tz> {
        let name = self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
        name.parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("unknown timezone '{name}': {e}"))
    }

    /// The installation's location.
    pub fn location(&self) -> Result<Location> {
        let latitude = self.latitude.unwrap_or(DEFAULT_LATITUDE);
        let longitude = self.longitude.unwrap_or(DEFAULT_LONGITUDE);
        Location::new(latitude, longitude, self.timezone()?)
            .context("Invalid location in configuration")
    }

    /// Light groups in command order.
    pub fn fixture(&self) -> Fixture {
        match &self.groups {
            Some(groups) => Fixture::new(
                groups
                    .iter()
                    .map(|g| LightGroup::new(g.name.clone(), g.channel))
                    .collect(),
            ),
            None => Fixture::default(),
        }
    }

    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            baud_rate: self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE),
            read_timeout: Duration::from_millis(
                self.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS),
            ),
            greeting: self
                .greeting
                .as_deref()
                .map_or(DEFAULT_GREETING, str::trim)
                .to_string(),
        }
    }

    pub fn post_sunset_policy(&self) -> PostSunsetPolicy {
        self.post_sunset_policy.unwrap_or_default()
    }

    pub fn polar_retry_interval(&self) -> Duration {
        Duration::from_secs(self.polar_retry_secs.unwrap_or(DEFAULT_POLAR_RETRY_SECS))
    }

    pub fn log_file_path(&self) -> PathBuf {
        PathBuf::from(self.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE))
    }

    /// Show the effective settings on the console.
    pub fn log_config(&self, source: &str) {
        log_block_start!("Loaded {}", source);

        match self.location() {
            Ok(location) => log_indented!("Location: {location}"),
            Err(e) => log_indented!("Location: invalid ({e})"),
        }

        let link = self.link_settings();
        log_indented!(
            "Serial link: {} baud, {}ms read timeout",
            link.baud_rate,
            link.read_timeout.as_millis()
        );

        let groups: Vec<String> = self
            .fixture()
            .groups()
            .iter()
            .map(|g| format!("{}={}", g.name, g.channel))
            .collect();
        log_indented!("Light groups: {}", groups.join(", "));
        log_indented!("After sunset: {}", self.post_sunset_policy().as_str());
        log_indented!("Diagnostic log: {}", self.log_file_path().display());
    }
}

#[cfg(test)]
mod tests;
