//! Leveled diagnostic side channel.
//!
//! Every check in the pipeline reports through a [`DiagnosticSink`] so the
//! decision logic stays a pure function of its inputs. The CLI wires in
//! [`TerminalSink`]; tests assert on a [`MemorySink`] instead of console
//! output.

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Success,
    Error,
    Critical,
}

/// One emitted message, tagged with its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Output side channel. No return value is ever consulted by the pipeline.
pub trait DiagnosticSink {
    fn emit(&mut self, level: Level, message: &str);
}

/// Colored stdout/stderr sink for the CLI surface. Debug lines are
/// suppressed unless `INDEXGATE_DEBUG=1` is set.
pub struct TerminalSink {
    show_debug: bool,
}

impl TerminalSink {
    pub fn from_env() -> Self {
        Self {
            show_debug: std::env::var("INDEXGATE_DEBUG").ok().as_deref() == Some("1"),
        }
    }
}

impl DiagnosticSink for TerminalSink {
    fn emit(&mut self, level: Level, message: &str) {
        match level {
            Level::Debug => {
                if self.show_debug {
                    println!("{} {}", "debug:".dimmed(), message.dimmed());
                }
            }
            Level::Info => println!("{}", message),
            Level::Success => println!("{}", message.green()),
            Level::Error => eprintln!("{}", message.red()),
            Level::Critical => eprintln!("{}", message.red().bold()),
        }
    }
}

/// Captures everything emitted, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub diagnostics: Vec<Diagnostic>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages_at(&self, level: Level) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == level)
            .map(|d| d.message.as_str())
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&mut self, level: Level, message: &str) {
        self.diagnostics.push(Diagnostic::new(level, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_preserves_order_and_levels() {
        let mut sink = MemorySink::new();
        sink.emit(Level::Info, "first");
        sink.emit(Level::Error, "second");
        sink.emit(Level::Error, "third");

        assert_eq!(sink.diagnostics.len(), 3);
        assert_eq!(sink.diagnostics[0], Diagnostic::new(Level::Info, "first"));
        assert_eq!(sink.messages_at(Level::Error), vec!["second", "third"]);
        assert!(sink.messages_at(Level::Critical).is_empty());
    }
}
