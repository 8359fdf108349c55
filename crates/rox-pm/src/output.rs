//! Install-time output channels.

use std::io::Write;

use console::{style, Term};

/// Sink for user-facing install messages.
///
/// `say` is the normal channel: progress notices and post-install
/// messages. `warn` is the diagnostic channel: conditions worth surfacing
/// without failing the install, like platform fallbacks.
pub trait InstallOutput {
    fn say(&mut self, message: &str);
    fn warn(&mut self, message: &str);
}

/// Terminal-backed output.
pub struct ConsoleOutput {
    term: Term,
    err: Term,
}

impl ConsoleOutput {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            err: Term::stderr(),
        }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallOutput for ConsoleOutput {
    fn say(&mut self, message: &str) {
        let _ = writeln!(&self.term, "{}", message);
    }

    fn warn(&mut self, message: &str) {
        let _ = writeln!(&self.err, "{} {}", style("Warning:").yellow().bold(), message);
    }
}

/// Collects messages in memory, for tests and embedders that render
/// output themselves.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    said: Vec<String>,
    warned: Vec<String>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent to the normal channel, in order.
    pub fn said(&self) -> &[String] {
        &self.said
    }

    /// Messages sent to the diagnostic channel, in order.
    pub fn warned(&self) -> &[String] {
        &self.warned
    }
}

impl InstallOutput for MemoryOutput {
    fn say(&mut self, message: &str) {
        self.said.push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.warned.push(message.to_string());
    }
}
