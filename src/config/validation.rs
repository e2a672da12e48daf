//! Configuration validation functionality.
//!
//! Rejects values that would make the control loop misbehave: impossible coordinates,
//! unknown timezones, unbounded reads and ambiguous light groups.

use anyhow::Result;
use std::collections::HashSet;

use super::Config;
use crate::common::constants::*;

/// Comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    config.timezone()?;

    if config.baud_rate == Some(0) {
        anyhow::bail!("baud_rate must be greater than zero");
    }

    if let Some(timeout_ms) = config.read_timeout_ms
        && !(MINIMUM_READ_TIMEOUT_MS..=MAXIMUM_READ_TIMEOUT_MS).contains(&timeout_ms)
    {
        anyhow::bail!(
            "read_timeout_ms ({}) must be between {} and {} milliseconds",
            timeout_ms,
            MINIMUM_READ_TIMEOUT_MS,
            MAXIMUM_READ_TIMEOUT_MS
        );
    }

    if let Some(retry_secs) = config.polar_retry_secs
        && !(MINIMUM_POLAR_RETRY_SECS..=MAXIMUM_POLAR_RETRY_SECS).contains(&retry_secs)
    {
        anyhow::bail!(
            "polar_retry_secs ({}) must be between {} and {} seconds",
            retry_secs,
            MINIMUM_POLAR_RETRY_SECS,
            MAXIMUM_POLAR_RETRY_SECS
        );
    }

    if let Some(greeting) = &config.greeting
        && greeting.trim().is_empty()
    {
        anyhow::bail!("greeting must not be empty");
    }

    if let Some(log_file) = &config.log_file
        && log_file.trim().is_empty()
    {
        anyhow::bail!("log_file must not be empty");
    }

    if let Some(groups) = &config.groups {
        validate_groups(groups)?;
    }

    Ok(())
}

fn validate_groups(groups: &[super::GroupConfig]) -> Result<()> {
    if groups.is_empty() {
        anyhow::bail!("at least one light group must be configured");
    }

    let mut names = HashSet::new();
    let mut channels = HashSet::new();
    for group in groups {
        if group.name.trim().is_empty() {
            anyhow::bail!("light group names must not be empty");
        }
        if !names.insert(group.name.as_str()) {
            anyhow::bail!("duplicate light group name '{}'", group.name);
        }
        if !channels.insert(group.channel) {
            anyhow::bail!(
                "channel {} is assigned to more than one light group",
                group.channel
            );
        }
    }

    Ok(())
}
