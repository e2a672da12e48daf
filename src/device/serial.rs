//! Opening the controller's serial port.

use serialport::SerialPort;

use super::{DeviceError, DeviceSession, LinkSettings};

/// A session over a real serial port.
pub type SerialSession = DeviceSession<Box<dyn SerialPort>>;

/// Open `port` and perform the controller handshake.
///
/// The port is configured with the settings' baud rate and read timeout; every later
/// read on the session is bounded by that timeout.
pub fn connect(port: &str, settings: &LinkSettings) -> Result<SerialSession, DeviceError> {
    let transport = serialport::new(port, settings.baud_rate)
        .timeout(settings.read_timeout)
        .open()
        .map_err(|source| DeviceError::Open {
            port: port.to_string(),
            source,
        })?;

    DeviceSession::establish(transport, &settings.greeting)
}
