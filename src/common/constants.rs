//! Default values and fixed limits shared across the crate.

// # Location defaults (Woodinville, WA)

pub const DEFAULT_LATITUDE: f64 = 47.763212;
pub const DEFAULT_LONGITUDE: f64 = -122.068400;
pub const DEFAULT_TIMEZONE: &str = "US/Pacific";

// # Serial link

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;
pub const MINIMUM_READ_TIMEOUT_MS: u64 = 100;
pub const MAXIMUM_READ_TIMEOUT_MS: u64 = 600_000;

/// Second line of the controller's reply to the `\r` probe.
pub const DEFAULT_GREETING: &str = "Remote Light Controller:";

/// Host-to-device line terminator.
pub const COMMAND_TERMINATOR: &str = "\r";

/// Every exchange with the controller yields exactly this many lines.
pub const RESPONSE_LINES: usize = 2;

// # Fixture

pub const DEFAULT_SOUTH_GROUP: &str = "south";
pub const DEFAULT_SOUTH_CHANNEL: u32 = 4;
pub const DEFAULT_NORTH_GROUP: &str = "north";
pub const DEFAULT_NORTH_CHANNEL: u32 = 12;

// # Scheduling

pub const DEFAULT_POLAR_RETRY_SECS: u64 = 3_600;
pub const MINIMUM_POLAR_RETRY_SECS: u64 = 60;
pub const MAXIMUM_POLAR_RETRY_SECS: u64 = 86_400;

/// Longest slice of a wait spent blocked on the signal channel before re-checking
/// the elapsed time.
pub const SIGNAL_POLL_INTERVAL_MS: u64 = 250;

// # Files

pub const DEFAULT_LOG_FILE: &str = "lights.log";
pub const CONFIG_DIR_NAME: &str = "duskswitch";
pub const CONFIG_FILE_NAME: &str = "duskswitch.toml";

/// Timestamp layout used for diagnostic records.
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
