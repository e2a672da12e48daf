//! Time source abstraction for real and simulated clocks.
//!
//! The scheduler never reads the system clock directly. It asks a [`TimeSource`], which
//! lets tests drive whole days of the control loop instantly with a
//! [`SimulatedTimeSource`].

use chrono::{DateTime, Utc};
use std::time::Duration as StdDuration;

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current instant
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for the specified duration (or simulate it)
    fn sleep(&self, duration: StdDuration);

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool;

    /// Check if simulation has ended (always false for real time)
    fn is_ended(&self) -> bool {
        false
    }
}

/// Real-time implementation that uses the system clock
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Fast-forward clock: every sleep advances simulated time by exactly the requested
/// duration and returns immediately. Time never moves past `end_time`.
#[cfg(any(test, feature = "testing-support"))]
pub struct SimulatedTimeSource {
    end_time: DateTime<Utc>,
    current: std::sync::Mutex<DateTime<Utc>>,
    /// Every duration passed to `sleep`, in call order
    sleeps: std::sync::Mutex<Vec<StdDuration>>,
}

#[cfg(any(test, feature = "testing-support"))]
impl SimulatedTimeSource {
    /// Create a simulated clock running from `start_time` to `end_time`.
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            end_time,
            current: std::sync::Mutex::new(start_time),
            sleeps: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Durations requested so far, oldest first.
    pub fn recorded_sleeps(&self) -> Vec<StdDuration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }

    fn sleep(&self, duration: StdDuration) {
        self.sleeps.lock().unwrap().push(duration);

        let mut current = self.current.lock().unwrap();
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
        let advanced = current.checked_add_signed(step).unwrap_or(self.end_time);
        *current = advanced.min(self.end_time);
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.now() >= self.end_time
    }
}
