use crate::gateway::{Gateway, RunHandle};
use crate::utils::text;

/// Collects the tail of a failed run's output.
pub struct FailureReporter<'a> {
    gateway: &'a dyn Gateway,
    max_lines: usize,
    marker_prefixes: &'a [String],
}

impl<'a> FailureReporter<'a> {
    pub fn new(gateway: &'a dyn Gateway, max_lines: usize, marker_prefixes: &'a [String]) -> Self {
        Self {
            gateway,
            max_lines,
            marker_prefixes,
        }
    }

    /// Last cleaned output lines, most recent last. Empty if the output
    /// cannot be fetched.
    pub fn diagnostics(&self, handle: RunHandle) -> Vec<String> {
        match self.gateway.run_output(handle) {
            Ok(lines) => text::clean_output_lines(&lines, self.marker_prefixes, self.max_lines),
            Err(err) => {
                log_status!("diagnostics", "Could not fetch output of run {}: {}", handle, err);
                Vec::new()
            }
        }
    }
}
