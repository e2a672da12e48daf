//! Serial protocol driver for the remote light controller.
//!
//! The controller speaks a line-oriented ASCII protocol. Host lines end with `\r` and
//! device lines end with `\r\n`:
//!
//! | Direction     | Message                            | Notes                            |
//! |---------------|------------------------------------|----------------------------------|
//! | Host→Device   | `\r`                               | handshake probe                  |
//! | Device→Host   | 2 lines                            | 2nd line is the greeting         |
//! | Host→Device   | `on:<channel>\r` / `off:<channel>\r` | one command per light group    |
//! | Device→Host   | 2 lines                            | 2nd line is the acknowledgement  |
//!
//! ## Module Structure
//!
//! - [`session`]: the handshake and command/response exchange over any `Read + Write`
//! - [`serial`]: opening the real serial port with an explicit read timeout

pub mod serial;
pub mod session;

pub use serial::{SerialSession, connect};
pub use session::DeviceSession;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::common::constants::*;

/// Failures of the device link. None of them are retried.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to open serial port {port}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("unexpected response from controller: {received:?}")]
    HandshakeFailed { received: String },

    #[error("serial link failure while {action}")]
    Link {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("controller closed the connection")]
    Disconnected,
}

/// Target state of a light group or of the whole fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    /// Command verb understood by the controller.
    pub fn command_word(self) -> &'static str {
        match self {
            SwitchState::On => "on",
            SwitchState::Off => "off",
        }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchState::On => write!(f, "ON"),
            SwitchState::Off => write!(f, "OFF"),
        }
    }
}

/// A named set of lights bound to one controller channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightGroup {
    pub name: String,
    pub channel: u32,
}

impl LightGroup {
    pub fn new(name: impl Into<String>, channel: u32) -> Self {
        Self {
            name: name.into(),
            channel,
        }
    }

    /// Wire form of the command switching this group, terminator included.
    pub fn command(&self, state: SwitchState) -> String {
        format!(
            "{}:{}{COMMAND_TERMINATOR}",
            state.command_word(),
            self.channel
        )
    }
}

/// Every light group, in the order commands are issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    groups: Vec<LightGroup>,
}

impl Fixture {
    pub fn new(groups: Vec<LightGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[LightGroup] {
        &self.groups
    }
}

impl Default for Fixture {
    /// South group first, then north.
    fn default() -> Self {
        Self::new(vec![
            LightGroup::new(DEFAULT_SOUTH_GROUP, DEFAULT_SOUTH_CHANNEL),
            LightGroup::new(DEFAULT_NORTH_GROUP, DEFAULT_NORTH_CHANNEL),
        ])
    }
}

/// The controller's reply to one group command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub group: String,
    /// Second reply line, trimmed. Not interpreted by the link.
    pub text: String,
}

impl fmt::Display for Acknowledgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.text)
    }
}

/// Transport parameters for [`connect`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSettings {
    pub baud_rate: u32,
    /// Bound on every blocking read
    pub read_timeout: Duration,
    /// Expected second line of the handshake reply
    pub greeting: String,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_command_wire_format() {
        let south = LightGroup::new("south", 4);
        assert_eq!(south.command(SwitchState::On), "on:4\r");
        assert_eq!(south.command(SwitchState::Off), "off:4\r");
    }

    #[test]
    fn test_default_fixture_order() {
        let fixture = Fixture::default();
        let channels: Vec<u32> = fixture.groups().iter().map(|g| g.channel).collect();
        assert_eq!(channels, vec![4, 12]);
        assert_eq!(fixture.groups()[0].name, "south");
    }

    #[test]
    fn test_acknowledgement_display() {
        let ack = Acknowledgement {
            group: "north".into(),
            text: "light 12 on".into(),
        };
        assert_eq!(ack.to_string(), "north:light 12 on");
    }
}
