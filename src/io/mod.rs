//! Process-level I/O concerns: OS signal handling.

pub mod signals;
