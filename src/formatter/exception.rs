//! Rendering of [`ErrorInfo`] into the text placed inside a code block.

use crate::log_record::ErrorInfo;

/// Format error details as `kind: traceback`.
///
/// When the traceback already ends with a line naming the error kind (as
/// tracebacks captured from other runtimes often do) the kind is not
/// repeated.
pub fn format_error_info(error: &ErrorInfo) -> String {
    let traceback = error.traceback.trim_end_matches('\n');
    if error.kind.is_empty() {
        return traceback.to_owned();
    }
    let names_kind = traceback
        .lines()
        .last()
        .is_some_and(|line| line.starts_with(&format!("{}:", error.kind)));
    if names_kind {
        traceback.to_owned()
    } else {
        format!("{}: {}", error.kind, traceback)
    }
}
