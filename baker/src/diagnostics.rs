//! Build diagnostics with optional source locations.
//!
//! Messages follow the `[program: ][kind: ][file(line): ]message` layout used
//! by compilers, so editors can jump to the reported location. Whether a
//! message aborts the build is decided by [`DiagnosticsConfig`]; the library
//! never exits the process itself but returns an [`Escalation`] for the
//! caller to act on.
//!
//! Every diagnostic is mirrored as a `trace` event. The sinks stay the only
//! user-facing output below `-vvv`.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Label printed before the message, if any.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Severity::Info => None,
            Severity::Warning => Some("warning"),
            Severity::Error => Some("error"),
            Severity::Fatal => Some("fatal"),
        }
    }
}

/// Source location attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: Option<u32>,
}

impl Location {
    /// A location naming only a file.
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    /// A location naming a file and line.
    pub fn line(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }
}

/// A diagnostic that requires the build to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escalation {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message.trim_end())
    }
}

impl std::error::Error for Escalation {}

/// Which diagnostics are shown and which abort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsConfig {
    /// Print info messages.
    pub verbose: bool,
    /// Print warnings.
    pub warnings: bool,
    /// Escalate printed warnings.
    pub fail_on_warning: bool,
    /// Do not escalate errors.
    pub ignore_errors: bool,
    /// Program name prefixed to every message.
    pub identify: Option<String>,
    /// Report actions instead of performing them.
    pub no_action: bool,
}

/// Format a diagnostic line, always ending in a newline.
pub fn format_message(
    identify: Option<&str>,
    severity: Severity,
    message: &str,
    location: Option<&Location>,
) -> String {
    let mut output = String::new();

    if let Some(program) = identify {
        output.push_str(program);
        output.push_str(": ");
    }

    if let Some(label) = severity.label() {
        output.push_str(label);
        output.push_str(": ");
    }

    if let Some(location) = location {
        output.push_str(&location.file);
        if let Some(line) = location.line {
            output.push_str(&format!("({})", line));
        }
        output.push_str(": ");
    }

    output.push_str(message);
    if !message.ends_with('\n') {
        output.push('\n');
    }

    output
}

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Diagnostics reporter writing to configurable sinks.
#[derive(Clone)]
pub struct Diagnostics {
    config: DiagnosticsConfig,
    out: Sink,
    err: Sink,
}

impl Diagnostics {
    /// Reporter writing info to stdout and everything else to stderr.
    pub fn new(config: DiagnosticsConfig) -> Self {
        Self::with_writers(config, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Reporter writing to the given sinks.
    pub fn with_writers(
        config: DiagnosticsConfig,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            config,
            out: Arc::new(Mutex::new(out)),
            err: Arc::new(Mutex::new(err)),
        }
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    /// Print an informational message when verbose.
    pub fn info(&self, message: &str, location: Option<&Location>) {
        tracing::trace!(severity = "info", "{}", message);
        if self.config.verbose {
            let line = self.format(Severity::Info, message, location);
            emit(&self.out, &line);
        }
    }

    /// Print a warning when warnings are enabled.
    ///
    /// Escalates if `fail_on_warning` is set and the warning was printed.
    pub fn warn(&self, message: &str, location: Option<&Location>) -> Result<(), Escalation> {
        tracing::trace!(severity = "warning", "{}", message);
        if !self.config.warnings {
            return Ok(());
        }

        let line = self.format(Severity::Warning, message, location);
        emit(&self.err, &line);

        if self.config.fail_on_warning {
            return Err(Escalation {
                severity: Severity::Warning,
                message: line,
            });
        }
        Ok(())
    }

    /// Print an error; escalates unless `ignore_errors` is set.
    pub fn error(&self, message: &str, location: Option<&Location>) -> Result<(), Escalation> {
        tracing::trace!(severity = "error", "{}", message);
        let line = self.format(Severity::Error, message, location);
        emit(&self.err, &line);

        if self.config.ignore_errors {
            return Ok(());
        }
        Err(Escalation {
            severity: Severity::Error,
            message: line,
        })
    }

    /// Print a fatal error; always escalates.
    pub fn fatal(&self, message: &str, location: Option<&Location>) -> Escalation {
        tracing::trace!(severity = "fatal", "{}", message);
        let line = self.format(Severity::Fatal, message, location);
        emit(&self.err, &line);

        Escalation {
            severity: Severity::Fatal,
            message: line,
        }
    }

    /// Gate a side-effecting action on the dry-run setting.
    ///
    /// Returns whether the action should be performed.
    pub fn take_action(&self, action: &str) -> bool {
        if self.config.no_action {
            emit(&self.out, &format!("Would {}\n", action));
            return false;
        }

        self.info(&format!("Will now {}", action), None);
        true
    }

    fn format(&self, severity: Severity, message: &str, location: Option<&Location>) -> String {
        format_message(self.config.identify.as_deref(), severity, message, location)
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("config", &self.config)
            .finish()
    }
}

fn emit(sink: &Sink, line: &str) {
    let mut writer = sink.lock();
    // Write failures are ignored
    let _ = writer.write_all(line.as_bytes());
    let _ = writer.flush();
}
