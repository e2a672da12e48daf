//! Day/night classification of a single instant.
//!
//! The signed offsets from "now" to today's dawn and sunset select one of three regimes.
//! The result is a pure function of its inputs, so classifying the same instant twice
//! gives the same decision.

use chrono::NaiveDateTime;
use std::fmt;
use thiserror::Error;

use crate::device::SwitchState;
use crate::geo::SunTimes;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error(
        "impossible schedule: {sunrise_delta}s until dawn but {sunset_delta}s until sunset"
    )]
    InvariantViolation {
        sunrise_delta: f64,
        sunset_delta: f64,
    },
}

/// Which side of the day/night boundary an instant falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// At or after today's sunset.
    AfterSunset,
    /// Before today's dawn.
    BeforeDawn,
    /// From dawn (inclusive) until sunset.
    Daytime,
}

impl Regime {
    /// Fixture state this regime calls for.
    pub fn target(self) -> SwitchState {
        match self {
            Regime::AfterSunset | Regime::BeforeDawn => SwitchState::On,
            Regime::Daytime => SwitchState::Off,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Regime::AfterSunset => "after sunset",
            Regime::BeforeDawn => "before dawn",
            Regime::Daytime => "daytime",
        };
        f.write_str(name)
    }
}

/// Outcome of one Determine step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleDecision {
    pub regime: Regime,
    pub target: SwitchState,
    /// Seconds to suspend before the next cycle, never negative
    pub wait_secs: f64,
}

/// Signed seconds from `now` to `dawn` and to `sunset`.
pub fn deltas(sun_times: &SunTimes, now: NaiveDateTime) -> (f64, f64) {
    let seconds = |event: NaiveDateTime| {
        let delta = event - now;
        // Microsecond precision keeps the f64 exact for any realistic offset
        delta.num_microseconds().map_or_else(
            || delta.num_milliseconds() as f64 / 1_000.0,
            |us| us as f64 / 1_000_000.0,
        )
    };
    (seconds(sun_times.dawn), seconds(sun_times.sunset))
}

/// Classify `now` against today's dawn and sunset.
///
/// After sunset the wait is the magnitude of the (already past) dawn offset. Callers that
/// want the wait to end at tomorrow's dawn replace it afterwards.
pub fn classify(
    sun_times: &SunTimes,
    now: NaiveDateTime,
) -> Result<ScheduleDecision, ScheduleError> {
    let (sunrise_delta, sunset_delta) = deltas(sun_times, now);
    classify_deltas(sunrise_delta, sunset_delta)
}

/// Classification on raw offsets. Any sign combination outside the three regimes, NaN
/// included, is an [`ScheduleError::InvariantViolation`].
pub fn classify_deltas(
    sunrise_delta: f64,
    sunset_delta: f64,
) -> Result<ScheduleDecision, ScheduleError> {
    let (regime, wait_secs) = if sunrise_delta < 0.0 && sunset_delta <= 0.0 {
        (Regime::AfterSunset, -sunrise_delta)
    } else if sunrise_delta > 0.0 && sunset_delta > 0.0 {
        (Regime::BeforeDawn, sunrise_delta)
    } else if sunrise_delta <= 0.0 && sunset_delta > 0.0 {
        (Regime::Daytime, sunset_delta)
    } else {
        return Err(ScheduleError::InvariantViolation {
            sunrise_delta,
            sunset_delta,
        });
    };

    Ok(ScheduleDecision {
        regime,
        target: regime.target(),
        wait_secs,
    })
}
