//! Shared buffer used as the writer of stream handlers in tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Thread-safe byte buffer implementing `Write`.
///
/// Clones share the same storage: hand one clone to the handler and read
/// the output from another.
#[derive(Clone, Default)]
pub struct SharedBuf {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    /// Return the buffer contents as UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8(self.buffer.lock().expect("SharedBuf mutex poisoned").clone())
            .expect("Buffer contains invalid UTF-8")
    }

    /// Parse every line of output as JSON.
    #[allow(dead_code)]
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.text()
            .lines()
            .map(|line| serde_json::from_str(line).expect("line is JSON"))
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("SharedBuf mutex poisoned")
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
