//! Civil dawn and sunset for a fixed location.
//!
//! Event times come from the `sunrise` crate (NOAA-style solar position). The crate has no
//! notion of "the sun does not cross this altitude today", so polar day and polar night are
//! detected separately from the solar declination and reported as
//! [`AstroError::NoTransitionToday`] instead of a meaningless time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use sunrise::{Coordinates, DawnType, SolarDay, SolarEvent};
use thiserror::Error;

use super::Location;

/// Sun altitude at civil dawn, in degrees.
const CIVIL_DAWN_ALTITUDE: f64 = -6.0;

/// Sun altitude at sunset including refraction and the solar disc radius, in degrees.
const SUNSET_ALTITUDE: f64 = -0.833;

/// Maximum distance of a valid event from local noon of the requested date.
const MAX_EVENT_OFFSET_HOURS: i64 = 24;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AstroError {
    #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidLocation { latitude: f64, longitude: f64 },

    #[error("no dawn/sunset transition on {date} at this latitude (polar day or night)")]
    NoTransitionToday { date: NaiveDate },
}

/// Dawn and sunset for one calendar day, as naive wall-clock times of the location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunTimes {
    /// Civil dawn, used as the "sunrise" boundary
    pub dawn: NaiveDateTime,
    pub sunset: NaiveDateTime,
}

/// Compute dawn and sunset for the local date of `reference` at `location`.
pub fn compute_sun_times(
    location: &Location,
    reference: DateTime<Utc>,
) -> Result<SunTimes, AstroError> {
    let local_date = reference
        .with_timezone(&location.timezone)
        .date_naive();
    sun_times_for_date(location, local_date)
}

/// Compute dawn and sunset for an explicit local calendar date.
pub fn sun_times_for_date(location: &Location, date: NaiveDate) -> Result<SunTimes, AstroError> {
    let coordinates = Coordinates::new(location.latitude, location.longitude).ok_or(
        AstroError::InvalidLocation {
            latitude: location.latitude,
            longitude: location.longitude,
        },
    )?;

    if !sun_crosses_altitude(location.latitude, date, CIVIL_DAWN_ALTITUDE)
        || !sun_crosses_altitude(location.latitude, date, SUNSET_ALTITUDE)
    {
        return Err(AstroError::NoTransitionToday { date });
    }

    let solar_day = SolarDay::new(coordinates, date);
    let dawn_utc = solar_day.event_time(SolarEvent::Dawn(DawnType::Civil));
    let sunset_utc = solar_day.event_time(SolarEvent::Sunset);

    // Whole seconds are all the controller schedule needs
    let to_local = |instant: DateTime<Utc>| {
        let local = instant.with_timezone(&location.timezone).naive_local();
        local.with_nanosecond(0).unwrap_or(local)
    };
    let dawn = to_local(dawn_utc);
    let sunset = to_local(sunset_utc);

    // Guards against degenerate results right at the polar threshold
    let local_noon = date.and_time(NaiveTime::MIN) + Duration::hours(12);
    let plausible = |event: NaiveDateTime| {
        (event - local_noon).num_hours().abs() <= MAX_EVENT_OFFSET_HOURS
    };
    if !plausible(dawn) || !plausible(sunset) || dawn >= sunset {
        return Err(AstroError::NoTransitionToday { date });
    }

    Ok(SunTimes { dawn, sunset })
}

/// Whether the sun passes through `altitude_deg` at some point on `date`.
///
/// Uses the hour-angle equation `cos(H) = (sin(alt) - sin(lat)·sin(dec)) / (cos(lat)·cos(dec))`;
/// no real solution means the sun stays entirely above or below that altitude all day.
fn sun_crosses_altitude(latitude: f64, date: NaiveDate, altitude_deg: f64) -> bool {
    let declination = solar_declination(date).to_radians();
    let lat = latitude.to_radians();
    let alt = altitude_deg.to_radians();

    let denominator = lat.cos() * declination.cos();
    if denominator.abs() < f64::EPSILON {
        // Exactly at a pole: the sun circles at constant altitude for the day
        return false;
    }

    let cos_h = (alt.sin() - lat.sin() * declination.sin()) / denominator;
    (-1.0..=1.0).contains(&cos_h)
}

/// Approximate solar declination in degrees (accurate to a fraction of a degree).
fn solar_declination(date: NaiveDate) -> f64 {
    let day_of_year = date.ordinal() as f64;
    let gamma = 2.0 * std::f64::consts::PI / 365.0 * (day_of_year - 1.0);

    // Spencer (1971) Fourier series
    let radians = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
        - 0.006758 * (2.0 * gamma).cos()
        + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos()
        + 0.00148 * (3.0 * gamma).sin();
    radians.to_degrees()
}

#[cfg(test)]
mod declination_tests {
    use super::*;

    #[test]
    fn test_declination_extremes_near_solstices() {
        let june = solar_declination(NaiveDate::from_ymd_opt(2024, 6, 21).unwrap());
        let december = solar_declination(NaiveDate::from_ymd_opt(2024, 12, 21).unwrap());

        assert!((june - 23.44).abs() < 0.5, "June declination was {june}");
        assert!((december + 23.44).abs() < 0.5, "December declination was {december}");
    }

    #[test]
    fn test_equator_always_has_transitions() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        assert!(sun_crosses_altitude(0.0, date, CIVIL_DAWN_ALTITUDE));
        assert!(sun_crosses_altitude(0.0, date, SUNSET_ALTITUDE));
    }
}
