//! The sunset/sunrise control loop.
//!
//! The scheduler cycles through three phases and has no terminal state:
//!
//! - **Determine**: compute today's dawn and sunset, classify "now" and pick a target
//!   state and a wait
//! - **Act**: drive the fixture to the target state and record every acknowledgement
//! - **Wait**: suspend until the next transition, waking early on a shutdown request
//!
//! Only an operator shutdown (or, with a simulated clock, the end of simulated time) leaves
//! the loop cleanly. Device, astronomy and invariant failures propagate as errors.
//!
//! On polar dates with no dawn or no sunset the scheduler keeps the fixture as it is and
//! checks again after the configured retry interval.

pub mod regime;

pub use regime::{Regime, ScheduleDecision, ScheduleError, classify, classify_deltas};

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, NaiveDateTime};
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::PostSunsetPolicy,
    device::{Acknowledgement, DeviceSession, Fixture, SwitchState},
    diagnostics::{self, DiagnosticSink},
    geo::{AstroError, Location, compute_sun_times, sun_times_for_date},
    io::signals::{SignalState, WaitOutcome},
    time_source::TimeSource,
};

/// What the Determine phase settled on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Plan {
    /// Drive the fixture to `decision.target`, then wait `decision.wait_secs`.
    Switch(ScheduleDecision),
    /// No transition today: leave the fixture alone and check again after `wait`.
    Hold { date: NaiveDate, wait: Duration },
}

impl Plan {
    pub fn wait(&self) -> Duration {
        match self {
            Plan::Switch(decision) => seconds_to_duration(decision.wait_secs),
            Plan::Hold { wait, .. } => *wait,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Determine,
    Act(ScheduleDecision),
    Wait(Duration),
}

/// Parameters for creating a Scheduler instance.
pub struct SchedulerParams<T: Read + Write> {
    pub session: DeviceSession<T>,
    pub fixture: Fixture,
    pub location: Location,
    pub policy: PostSunsetPolicy,
    pub polar_retry: Duration,
    pub clock: Arc<dyn TimeSource>,
    pub diagnostics: Box<dyn DiagnosticSink>,
    pub debug_enabled: bool,
}

/// Control loop state. Owns the device session exclusively.
pub struct Scheduler<T: Read + Write> {
    session: DeviceSession<T>,
    fixture: Fixture,
    location: Location,
    policy: PostSunsetPolicy,
    polar_retry: Duration,
    clock: Arc<dyn TimeSource>,
    diagnostics: Box<dyn DiagnosticSink>,
    debug_enabled: bool,
    /// Last state the whole fixture acknowledged, if any
    fixture_state: Option<SwitchState>,
}

impl<T: Read + Write> Scheduler<T> {
    pub fn new(params: SchedulerParams<T>) -> Self {
        Self {
            session: params.session,
            fixture: params.fixture,
            location: params.location,
            policy: params.policy,
            polar_retry: params.polar_retry,
            clock: params.clock,
            diagnostics: params.diagnostics,
            debug_enabled: params.debug_enabled,
            fixture_state: None,
        }
    }

    /// Last state the whole fixture acknowledged.
    pub fn fixture_state(&self) -> Option<SwitchState> {
        self.fixture_state
    }

    /// Borrow the device session, e.g. to inspect a test transport.
    pub fn session(&self) -> &DeviceSession<T> {
        &self.session
    }

    /// Run the control loop until shutdown.
    ///
    /// Returns `Ok(())` when `signal_state` reports a shutdown or a simulated clock runs out.
    /// Any failure is written to the diagnostic log before it is returned.
    pub fn run(&mut self, signal_state: &SignalState) -> Result<()> {
        let result = self.run_phases(signal_state);

        if let Err(e) = &result {
            log_error!("Control loop stopped: {e:#}");
            // Best effort; the loop error is what the caller needs
            let _ = self.record(&format!("fatal: {e:#}"));
        }
        result
    }

    fn run_phases(&mut self, signal_state: &SignalState) -> Result<()> {
        let mut phase = Phase::Determine;

        while signal_state.is_running() && !self.clock.is_ended() {
            phase = match phase {
                Phase::Determine => match self.determine()? {
                    Plan::Switch(decision) => Phase::Act(decision),
                    hold @ Plan::Hold { .. } => Phase::Wait(hold.wait()),
                },
                Phase::Act(decision) => {
                    self.act(&decision)?;
                    Phase::Wait(seconds_to_duration(decision.wait_secs))
                }
                Phase::Wait(duration) => {
                    if self.suspend(duration, signal_state) == WaitOutcome::Shutdown {
                        break;
                    }
                    Phase::Determine
                }
            };
        }

        if self.debug_enabled {
            log_debug!("Control loop finished in phase {phase:?}");
        }
        Ok(())
    }

    /// Determine and Act back to back. Returns the wait that would follow.
    pub fn cycle(&mut self) -> Result<Duration> {
        let plan = self.determine()?;
        if let Plan::Switch(decision) = &plan {
            self.act(decision)?;
        }
        Ok(plan.wait())
    }

    /// Compute today's sun times and classify the current instant.
    ///
    /// Records the sun times, the current time, both offsets and the decision.
    pub fn determine(&mut self) -> Result<Plan> {
        let now_utc = self.clock.now();
        let now = now_utc.with_timezone(&self.location.timezone).naive_local();

        let sun_times = match compute_sun_times(&self.location, now_utc) {
            Ok(sun_times) => sun_times,
            Err(AstroError::NoTransitionToday { date }) => return self.hold(date),
            Err(e) => return Err(e).context("Failed to compute sun times"),
        };

        self.record(&format!("sunrise {}", sun_times.dawn.format("%H:%M")))?;
        self.record(&format!("sunset {}", sun_times.sunset.format("%H:%M")))?;
        self.record(&format!("current time={}", now.format("%H:%M")))?;

        let (sunrise_delta, sunset_delta) = regime::deltas(&sun_times, now);
        self.record(&format!("time till sunrise is {sunrise_delta} seconds"))?;
        self.record(&format!("time till sunset is {sunset_delta} seconds"))?;

        let mut decision = classify(&sun_times, now)?;
        if decision.regime == Regime::AfterSunset && self.policy == PostSunsetPolicy::NextDawn {
            decision.wait_secs = self.seconds_until_next_dawn(now)?;
        }

        if self.debug_enabled {
            log_debug!(
                "Regime: {} (dawn in {:.0}s, sunset in {:.0}s)",
                decision.regime,
                sunrise_delta,
                sunset_delta
            );
        }

        Ok(Plan::Switch(decision))
    }

    /// Drive the fixture to the decision's target and record each acknowledgement.
    pub fn act(&mut self, decision: &ScheduleDecision) -> Result<Vec<Acknowledgement>> {
        let (action, next_action) = match decision.target {
            SwitchState::On => ("Turning on the lights", "Turning off the lights"),
            SwitchState::Off => ("Turning off the lights", "Turning on the lights"),
        };
        self.record(action)?;

        // Each acknowledgement is recorded as soon as it arrives, so a later group failing
        // still leaves the earlier ones in the log
        let groups = self.fixture.groups().to_vec();
        let mut acknowledgements = Vec::with_capacity(groups.len());
        for group in &groups {
            let ack = self
                .session
                .set_group_state(group, decision.target)
                .with_context(|| format!("Failed to switch the lights {}", decision.target))?;
            self.record(&ack.to_string())?;
            acknowledgements.push(ack);
        }
        self.fixture_state = Some(decision.target);

        self.record(&format!(
            "{next_action} in {} seconds",
            decision.wait_secs
        ))?;

        log_block_start!(
            "Lights {} ({}), next change in {}",
            decision.target,
            decision.regime,
            format_wait(seconds_to_duration(decision.wait_secs))
        );
        if self.debug_enabled {
            for ack in &acknowledgements {
                log_indented!("{ack}");
            }
        }

        Ok(acknowledgements)
    }

    fn hold(&mut self, date: NaiveDate) -> Result<Plan> {
        let state = self
            .fixture_state
            .map_or_else(|| "unchanged".to_string(), |s| s.to_string());

        self.record(&format!(
            "no sunrise/sunset on {date}, keeping lights {state}, checking again in {} seconds",
            self.polar_retry.as_secs()
        ))?;

        log_block_start!("No sunrise or sunset on {date} at this location");
        log_indented!(
            "Keeping lights {state}, checking again in {}",
            format_wait(self.polar_retry)
        );

        Ok(Plan::Hold {
            date,
            wait: self.polar_retry,
        })
    }

    /// Seconds from `now` until the dawn of the next local date.
    ///
    /// Falls back to the polar retry interval when that date has no dawn.
    fn seconds_until_next_dawn(&mut self, now: NaiveDateTime) -> Result<f64> {
        let tomorrow = now
            .date()
            .checked_add_days(Days::new(1))
            .context("Date overflow while computing tomorrow's dawn")?;

        match sun_times_for_date(&self.location, tomorrow) {
            Ok(next) => {
                let (next_dawn_delta, _) = regime::deltas(&next, now);
                self.record(&format!("next sunrise {}", next.dawn.format("%Y-%m-%d %H:%M")))?;
                Ok(next_dawn_delta.max(0.0))
            }
            Err(AstroError::NoTransitionToday { date }) => {
                self.record(&format!(
                    "no sunrise on {date}, checking again in {} seconds",
                    self.polar_retry.as_secs()
                ))?;
                Ok(self.polar_retry.as_secs_f64())
            }
            Err(e) => Err(e).context("Failed to compute tomorrow's sun times"),
        }
    }

    fn suspend(&self, duration: Duration, signal_state: &SignalState) -> WaitOutcome {
        if self.clock.is_simulated() {
            self.clock.sleep(duration);
            if signal_state.is_running() {
                WaitOutcome::Elapsed
            } else {
                WaitOutcome::Shutdown
            }
        } else {
            signal_state.wait(duration)
        }
    }

    /// Append one timestamped line to the diagnostic log.
    fn record(&mut self, text: &str) -> Result<()> {
        let line = diagnostics::stamped(self.clock.now(), self.location.timezone, text);
        self.diagnostics.record(&line)
    }
}

/// Non-negative seconds to a Duration. Values that cannot be represented become zero.
fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Human-readable wait, e.g. "7h 15m" or "42s".
fn format_wait(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
