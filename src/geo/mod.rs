//! Geographic location and civil dawn / sunset calculations.
//!
//! ## Module Structure
//!
//! - [`solar`]: the dawn/sunset calculator built on the `sunrise` crate, with polar
//!   day/night detection
//!
//! A [`Location`] is fixed at configuration time. Solar times are computed fresh from it
//! on every scheduling cycle and are never cached across days.

pub mod solar;

pub use solar::{AstroError, SunTimes, compute_sun_times, sun_times_for_date};


use chrono_tz::Tz;

/// Observer position and the timezone whose wall clock the schedule runs on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Geographic latitude in degrees (-90 to +90)
    pub latitude: f64,
    /// Geographic longitude in degrees (-180 to +180)
    pub longitude: f64,
    /// Timezone of the installation
    pub timezone: Tz,
}

impl Location {
    /// Build a location, rejecting coordinates outside the valid ranges.
    pub fn new(latitude: f64, longitude: f64, timezone: Tz) -> Result<Self, AstroError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AstroError::InvalidLocation {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
            timezone,
        })
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}°{ns}, {:.4}°{ew} ({})",
            self.latitude.abs(),
            self.longitude.abs(),
            self.timezone
        )
    }
}
