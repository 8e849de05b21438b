//! Test-only helpers shared across crate unit tests.

pub mod recording_delivery;

use std::sync::OnceLock;

use logtest::Logger;
use parking_lot::{Mutex, MutexGuard};

static CAPTURE: OnceLock<Mutex<Logger>> = OnceLock::new();

/// Access the process-wide capturing logger, starting it on first use.
///
/// `logtest` installs itself as the global `log` logger, which can happen
/// only once per process. Tests asserting on diagnostics share this
/// instance and run under `#[serial]`.
pub fn captured_logs() -> MutexGuard<'static, Logger> {
    CAPTURE.get_or_init(|| Mutex::new(Logger::start())).lock()
}

/// Drain every captured record and return the messages of warnings that
/// contain `needle`.
///
/// Records emitted by tests running in parallel may be interleaved;
/// filtering by content keeps assertions stable.
pub fn warnings_containing(logger: &mut Logger, needle: &str) -> Vec<String> {
    let mut matches = Vec::new();
    while let Some(record) = logger.pop() {
        if record.level() == log::Level::Warn && record.args().contains(needle) {
            matches.push(record.args().to_owned());
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;

    #[rstest]
    #[serial]
    fn capture_survives_repeated_use() {
        for round in 0..3 {
            let mut logger = captured_logs();
            warnings_containing(&mut logger, "");
            log::warn!("capture round {round}");
            let warnings = warnings_containing(&mut logger, &format!("capture round {round}"));
            assert_eq!(warnings.len(), 1);
        }
    }
}
