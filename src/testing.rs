//! In-memory stand-ins for hardware, used by the test suites.
//!
//! Only compiled for tests and with the `testing-support` feature.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

/// Shared record of every write made to a [`ScriptedPort`], one entry per `write` call.
pub type WriteLog = Arc<Mutex<Vec<String>>>;

/// A fake controller that releases one scripted reply per host write.
///
/// Nothing is readable until the host writes, so a session that reads more lines than the
/// protocol allows runs into an empty buffer. An empty buffer behaves like a serial read
/// timeout, or like a closed port after [`ScriptedPort::closing_when_drained`].
pub struct ScriptedPort {
    replies: VecDeque<Vec<u8>>,
    readable: VecDeque<u8>,
    writes: WriteLog,
    eof_when_drained: bool,
}

impl ScriptedPort {
    /// `replies[n]` becomes readable after the n-th write.
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.as_bytes().to_vec()).collect(),
            readable: VecDeque::new(),
            writes: Arc::new(Mutex::new(Vec::new())),
            eof_when_drained: false,
        }
    }

    /// Report end-of-file instead of a timeout once the script runs out.
    pub fn closing_when_drained(mut self) -> Self {
        self.eof_when_drained = true;
        self
    }

    /// Handle on the write record that stays valid after the port is moved.
    pub fn write_log(&self) -> WriteLog {
        Arc::clone(&self.writes)
    }

    /// Whether every released reply byte has been consumed.
    pub fn is_drained(&self) -> bool {
        self.readable.is_empty()
    }
}

impl Read for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.readable.is_empty() {
            if self.eof_when_drained {
                return Ok(0);
            }
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "scripted controller has nothing more to say",
            ));
        }

        let count = buf.len().min(self.readable.len());
        for (slot, byte) in buf.iter_mut().zip(self.readable.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Write for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(buf).into_owned());

        if let Some(reply) = self.replies.pop_front() {
            self.readable.extend(reply);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
