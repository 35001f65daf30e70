//! Diagnostics for recoverable anomalies during load.
//!
//! The loader never aborts on a bad key or value. It records a
//! [`Diagnostic`] and reports it through a [`DiagnosticSink`]. The default
//! sink forwards to `tracing`, so an application that installs a subscriber
//! sees the messages with no extra wiring.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Warn,
}

/// One recorded anomaly.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted document path the anomaly concerns, if any.
    pub path: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn warn(path: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            path: path.map(str::to_string),
            message: message.into(),
        }
    }

    pub(crate) fn debug(path: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Debug,
            path: path.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{path}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Receiver for diagnostic messages.
pub trait DiagnosticSink {
    fn warn(&mut self, message: &str, cause: Option<&dyn Error>);
    fn debug(&mut self, message: &str);
}

/// Sink that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&mut self, message: &str, cause: Option<&dyn Error>) {
        match cause {
            Some(cause) => tracing::warn!(error = %cause, "{message}"),
            None => tracing::warn!("{message}"),
        }
    }

    fn debug(&mut self, message: &str) {
        tracing::debug!("{message}");
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    fn warn(&mut self, _message: &str, _cause: Option<&dyn Error>) {}
    fn debug(&mut self, _message: &str) {}
}

/// Collects diagnostics for one load while forwarding them to a sink.
pub(crate) struct Recorder<'a> {
    sink: &'a mut dyn DiagnosticSink,
    records: Vec<Diagnostic>,
}

impl<'a> Recorder<'a> {
    pub(crate) fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            sink,
            records: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        self.record_with_cause(diagnostic, None);
    }

    pub(crate) fn record_with_cause(&mut self, diagnostic: Diagnostic, cause: Option<&dyn Error>) {
        let text = diagnostic.to_string();
        match diagnostic.severity {
            Severity::Warn => self.sink.warn(&text, cause),
            Severity::Debug => self.sink.debug(&text),
        }
        self.records.push(diagnostic);
    }

    pub(crate) fn into_records(self) -> Vec<Diagnostic> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Capture {
        warns: Vec<String>,
        debugs: Vec<String>,
    }

    impl DiagnosticSink for Capture {
        fn warn(&mut self, message: &str, _cause: Option<&dyn Error>) {
            self.warns.push(message.to_string());
        }

        fn debug(&mut self, message: &str) {
            self.debugs.push(message.to_string());
        }
    }

    #[test]
    fn recorder_forwards_by_severity() {
        let mut capture = Capture::default();
        let mut recorder = Recorder::new(&mut capture);
        recorder.record(Diagnostic::warn(Some("a.b"), "failed to set option"));
        recorder.record(Diagnostic::debug(None, "skipped"));
        let records = recorder.into_records();

        assert_eq!(records.len(), 2);
        assert_eq!(capture.warns, vec!["a.b: failed to set option"]);
        assert_eq!(capture.debugs, vec!["skipped"]);
    }

    #[test]
    fn display_without_path() {
        let d = Diagnostic::warn(None, "plain");
        assert_eq!(d.to_string(), "plain");
    }

    #[test]
    fn tracing_sink_accepts_causes() {
        let mut sink = TracingSink;
        let cause = std::io::Error::other("disk");
        sink.warn("copy failed", Some(&cause));
        sink.debug("noop");
    }
}
