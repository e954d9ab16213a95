//! Progress reporting sinks.
//!
//! When a reporter is verbose, every step with a non-empty label emits that
//! label once its computation has finished. This mirrors documentation-style
//! test output, where step progress is interleaved with example names.

use std::io::Write;

use parking_lot::Mutex;

/// Sink for human-readable step progress.
pub trait Reporter: Send + Sync {
    /// Whether labels should be emitted at all.
    fn is_verbose(&self) -> bool;

    /// Emit one line of progress text.
    fn emit(&self, text: &str);
}

/// Emit `text` if it is non-empty and the reporter is verbose.
pub(crate) fn report(reporter: &dyn Reporter, text: &str) {
    if text.is_empty() || !reporter.is_verbose() {
        return;
    }
    reporter.emit(text);
}

/// Reporter that never emits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn is_verbose(&self) -> bool {
        false
    }

    fn emit(&self, _text: &str) {}
}

/// Writes indented labels to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    verbose: bool,
    indent: usize,
}

impl ConsoleReporter {
    pub const DEFAULT_INDENT: usize = 4;

    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            indent: Self::DEFAULT_INDENT,
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    fn format(&self, text: &str) -> String {
        format!("{:indent$}{}", "", text, indent = self.indent)
    }
}

impl Reporter for ConsoleReporter {
    fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn emit(&self, text: &str) {
        let line = self.format(text);
        let mut out = std::io::stdout().lock();
        // Progress output is best effort.
        let _ = writeln!(out, "{}", line);
    }
}

/// Routes labels to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn is_verbose(&self) -> bool {
        tracing::enabled!(tracing::Level::INFO)
    }

    fn emit(&self, text: &str) {
        tracing::info!(target: "sequencing::report", "{}", text);
    }
}

/// Collects emitted lines in memory.
#[derive(Debug)]
pub struct MemoryReporter {
    verbose: bool,
    lines: Mutex<Vec<String>>,
}

impl MemoryReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every line emitted so far, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Default for MemoryReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reporter for MemoryReporter {
    fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn emit(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_skips_empty_text() {
        let reporter = MemoryReporter::new(true);
        report(&reporter, "");
        report(&reporter, "first");
        assert_eq!(reporter.lines(), vec!["first"]);
    }

    #[test]
    fn test_report_skips_when_not_verbose() {
        let reporter = MemoryReporter::new(false);
        report(&reporter, "first");
        assert!(reporter.lines().is_empty());
    }

    #[test]
    fn test_null_reporter_is_quiet() {
        assert!(!NullReporter.is_verbose());
    }

    #[test]
    fn test_console_indent() {
        let reporter = ConsoleReporter::new(true);
        assert_eq!(reporter.format("executed first task"), "    executed first task");
        let reporter = reporter.with_indent(2);
        assert_eq!(reporter.format("x"), "  x");
    }

    #[test]
    fn test_memory_reporter_clear() {
        let reporter = MemoryReporter::default();
        reporter.emit("a");
        reporter.clear();
        assert!(reporter.lines().is_empty());
    }
}
