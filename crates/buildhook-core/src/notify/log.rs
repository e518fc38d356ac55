//! Build console sink

use std::io::Write;

use tracing::warn;

/// Where pipeline messages for one build are written.
///
/// This is the build's own console, separate from the process-wide tracing
/// output. Sinks move with the run, so they must be `Send`.
pub trait BuildLog: Send {
    /// Write an informational line
    fn info(&mut self, line: &str);

    /// Write an error line
    fn error(&mut self, line: &str);
}

/// A [`BuildLog`] over any writer. Error lines are prefixed with `ERROR: `.
#[derive(Debug)]
pub struct ConsoleLog<W: Write> {
    out: W,
}

impl<W: Write> ConsoleLog<W> {
    /// Wrap a writer
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            warn!("Failed to write to build log: {}", e);
        }
    }
}

impl<W: Write + Send> BuildLog for ConsoleLog<W> {
    fn info(&mut self, line: &str) {
        self.write_line(line);
    }

    fn error(&mut self, line: &str) {
        self.write_line(&format!("ERROR: {line}"));
    }
}
