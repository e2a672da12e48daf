//! Command/response exchange with the light controller.
//!
//! A [`DeviceSession`] can only be obtained through [`DeviceSession::establish`], which
//! performs the handshake, so no command is ever written to an unverified device.

use std::io::{BufRead, BufReader, Read, Write};

use super::{Acknowledgement, DeviceError, Fixture, LightGroup, SwitchState};
use crate::common::constants::*;

/// An open, handshaken connection to the controller.
///
/// Generic over the transport so the protocol can run against a real serial port or an
/// in-memory stub. Reads block up to the transport's own timeout.
pub struct DeviceSession<T: Read + Write> {
    reader: BufReader<T>,
    debug_enabled: bool,
}

impl<T: Read + Write> DeviceSession<T> {
    /// Probe the controller and validate its greeting.
    ///
    /// Writes a bare `\r`, reads exactly two lines and compares the second with
    /// `expected_greeting`, both trimmed.
    pub fn establish(transport: T, expected_greeting: &str) -> Result<Self, DeviceError> {
        let mut session = Self {
            reader: BufReader::new(transport),
            debug_enabled: false,
        };

        session.send(COMMAND_TERMINATOR)?;
        let [_banner, greeting] = session.read_response()?;

        if greeting != expected_greeting.trim() {
            return Err(DeviceError::HandshakeFailed { received: greeting });
        }

        Ok(session)
    }

    /// Echo wire traffic to the console.
    pub fn with_debug(mut self, debug_enabled: bool) -> Self {
        self.debug_enabled = debug_enabled;
        self
    }

    /// Switch one light group and return the controller's acknowledgement.
    pub fn set_group_state(
        &mut self,
        group: &LightGroup,
        state: SwitchState,
    ) -> Result<Acknowledgement, DeviceError> {
        self.send(&group.command(state))?;
        let [_echo, status] = self.read_response()?;

        Ok(Acknowledgement {
            group: group.name.clone(),
            text: status,
        })
    }

    /// Switch every group of the fixture, in fixture order.
    ///
    /// Stops at the first failing group; groups already switched stay switched.
    pub fn set_fixture_state(
        &mut self,
        fixture: &Fixture,
        state: SwitchState,
    ) -> Result<Vec<Acknowledgement>, DeviceError> {
        fixture
            .groups()
            .iter()
            .map(|group| self.set_group_state(group, state))
            .collect()
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        self.reader.get_ref()
    }

    fn send(&mut self, command: &str) -> Result<(), DeviceError> {
        if self.debug_enabled {
            log_indented!("→ {:?}", command);
        }

        let write_failed = |source| DeviceError::Link {
            action: "writing a command",
            source,
        };

        let port = self.reader.get_mut();
        port.write_all(command.as_bytes()).map_err(write_failed)?;
        port.flush().map_err(write_failed)
    }

    fn read_response(&mut self) -> Result<[String; RESPONSE_LINES], DeviceError> {
        let first = self.read_line()?;
        let second = self.read_line()?;
        Ok([first, second])
    }

    fn read_line(&mut self) -> Result<String, DeviceError> {
        let mut buffer = Vec::new();
        let bytes_read = self
            .reader
            .read_until(b'\n', &mut buffer)
            .map_err(|source| DeviceError::Link {
                action: "reading a response line",
                source,
            })?;

        if bytes_read == 0 {
            return Err(DeviceError::Disconnected);
        }

        let line = String::from_utf8_lossy(&buffer).trim().to_string();
        if self.debug_enabled {
            log_indented!("← {:?}", line);
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPort;

    const GREETING_REPLY: &str = "ignored\r\nRemote Light Controller:\r\n";

    #[test]
    fn test_handshake_accepts_expected_greeting() {
        let port = ScriptedPort::new(&[GREETING_REPLY]);
        let writes = port.write_log();

        let session = DeviceSession::establish(port, DEFAULT_GREETING);

        assert!(session.is_ok());
        assert_eq!(writes.lock().unwrap().as_slice(), ["\r"]);
    }

    #[test]
    fn test_handshake_ignores_padding_around_expected_greeting() {
        let port = ScriptedPort::new(&[GREETING_REPLY]);
        assert!(DeviceSession::establish(port, "  Remote Light Controller: ").is_ok());
    }

    #[test]
    fn test_handshake_rejects_other_greeting() {
        let port = ScriptedPort::new(&["ignored\r\nGarage Door Opener:\r\n"]);

        match DeviceSession::establish(port, DEFAULT_GREETING) {
            Err(DeviceError::HandshakeFailed { received }) => {
                assert_eq!(received, "Garage Door Opener:");
            }
            Err(other) => panic!("expected HandshakeFailed, got {other}"),
            Ok(_) => panic!("handshake should have failed"),
        }
    }

    #[test]
    fn test_handshake_greeting_must_be_second_line() {
        let port = ScriptedPort::new(&["Remote Light Controller:\r\nready\r\n"]);
        assert!(matches!(
            DeviceSession::establish(port, DEFAULT_GREETING),
            Err(DeviceError::HandshakeFailed { .. })
        ));
    }

    #[test]
    fn test_handshake_times_out_on_silent_device() {
        let port = ScriptedPort::new(&[]);
        assert!(matches!(
            DeviceSession::establish(port, DEFAULT_GREETING),
            Err(DeviceError::Link { .. })
        ));
    }

    #[test]
    fn test_handshake_on_closed_port_is_disconnect() {
        let port = ScriptedPort::new(&["ignored\r\n"]).closing_when_drained();
        assert!(matches!(
            DeviceSession::establish(port, DEFAULT_GREETING),
            Err(DeviceError::Disconnected)
        ));
    }

    #[test]
    fn test_set_group_state_returns_trimmed_second_line() {
        let port = ScriptedPort::new(&[GREETING_REPLY, "on:4\r\n  south lights on  \r\n"]);
        let mut session = DeviceSession::establish(port, DEFAULT_GREETING).unwrap();

        let ack = session
            .set_group_state(&LightGroup::new("south", 4), SwitchState::On)
            .unwrap();

        assert_eq!(ack.group, "south");
        assert_eq!(ack.text, "south lights on");
    }

    #[test]
    fn test_set_fixture_state_on_issues_commands_in_order() {
        let port = ScriptedPort::new(&[
            GREETING_REPLY,
            "on:4\r\nOK\r\n",
            "on:12\r\nOK\r\n",
        ]);
        let writes = port.write_log();
        let mut session = DeviceSession::establish(port, DEFAULT_GREETING).unwrap();

        let acks = session
            .set_fixture_state(&Fixture::default(), SwitchState::On)
            .unwrap();

        assert_eq!(writes.lock().unwrap().as_slice(), ["\r", "on:4\r", "on:12\r"]);
        assert_eq!(acks.len(), 2);
        assert_eq!(acks[0].to_string(), "south:OK");
        assert_eq!(acks[1].to_string(), "north:OK");
        // Exactly two lines were consumed per command
        assert!(session.transport().is_drained());
    }

    #[test]
    fn test_set_fixture_state_off() {
        let port = ScriptedPort::new(&[GREETING_REPLY, "off:4\r\n\r\n", "off:12\r\n\r\n"]);
        let writes = port.write_log();
        let mut session = DeviceSession::establish(port, DEFAULT_GREETING).unwrap();

        let acks = session
            .set_fixture_state(&Fixture::default(), SwitchState::Off)
            .unwrap();

        assert_eq!(writes.lock().unwrap()[1..], ["off:4\r", "off:12\r"]);
        // A blank status line is passed through untouched
        assert_eq!(acks[0].text, "");
    }

    #[test]
    fn test_link_error_stops_fixture_update() {
        // North never answers
        let port = ScriptedPort::new(&[GREETING_REPLY, "on:4\r\nOK\r\n"]);
        let writes = port.write_log();
        let mut session = DeviceSession::establish(port, DEFAULT_GREETING).unwrap();

        let result = session.set_fixture_state(&Fixture::default(), SwitchState::On);

        assert!(matches!(result, Err(DeviceError::Link { .. })));
        assert_eq!(writes.lock().unwrap().len(), 3);
    }
}
