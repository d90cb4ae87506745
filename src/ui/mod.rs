//! User-facing output and confirmation prompts.
//!
//! The install and sync engines never print directly; they report through
//! an [`OutputSink`] and ask questions through a [`Confirmer`]. The console
//! implementations here render with `colored`; tests substitute recording
//! and scripted doubles.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

/// Sink for user-facing messages, separated from the engine logic so the
/// engines are testable without capturing stdout.
pub trait OutputSink: Send + Sync {
    /// Neutral informational message.
    fn info(&self, message: &str);
    /// Positive completion message.
    fn success(&self, message: &str);
    /// Something was skipped or degraded but the run continues.
    fn warning(&self, message: &str);
    /// A failure the user must see.
    fn error(&self, message: &str);
    /// Secondary detail (counts, paths), rendered dimmed on terminals.
    fn meta(&self, message: &str);
    /// Raw line with no decoration.
    fn log(&self, message: &str);
}

/// Single-question confirmation prompt.
pub trait Confirmer: Send + Sync {
    /// Ask a yes/no question; `Ok(true)` means the user accepted.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Console output rendered with ANSI colors.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOutput;

impl OutputSink for ConsoleOutput {
    fn info(&self, message: &str) {
        println!("{} {message}", "ℹ".blue());
    }

    fn success(&self, message: &str) {
        println!("{} {message}", "✓".green());
    }

    fn warning(&self, message: &str) {
        println!("{} {}", "⚠".yellow(), message.yellow());
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message.red());
    }

    fn meta(&self, message: &str) {
        println!("  {}", message.dimmed());
    }

    fn log(&self, message: &str) {
        println!("{message}");
    }
}

/// Reads a one-character `y`/`n` answer from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("{prompt} [y/N] ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read confirmation from stdin")?;

        Ok(matches!(line.trim().chars().next(), Some('y' | 'Y')))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every message by severity for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingOutput {
        pub lines: Mutex<Vec<(&'static str, String)>>,
    }

    impl RecordingOutput {
        pub fn messages(&self) -> Vec<String> {
            self.lines.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.messages().iter().any(|m| m.contains(needle))
        }
    }

    impl OutputSink for RecordingOutput {
        fn info(&self, message: &str) {
            self.lines.lock().unwrap().push(("info", message.to_string()));
        }
        fn success(&self, message: &str) {
            self.lines.lock().unwrap().push(("success", message.to_string()));
        }
        fn warning(&self, message: &str) {
            self.lines.lock().unwrap().push(("warning", message.to_string()));
        }
        fn error(&self, message: &str) {
            self.lines.lock().unwrap().push(("error", message.to_string()));
        }
        fn meta(&self, message: &str) {
            self.lines.lock().unwrap().push(("meta", message.to_string()));
        }
        fn log(&self, message: &str) {
            self.lines.lock().unwrap().push(("log", message.to_string()));
        }
    }

    /// Answers every confirmation with a fixed response.
    #[derive(Debug)]
    pub struct ScriptedConfirmer {
        pub answer: bool,
        pub asked: Mutex<Vec<String>>,
    }

    impl ScriptedConfirmer {
        pub fn new(answer: bool) -> Self {
            Self {
                answer,
                asked: Mutex::new(Vec::new()),
            }
        }

        pub fn times_asked(&self) -> usize {
            self.asked.lock().unwrap().len()
        }
    }

    impl Confirmer for ScriptedConfirmer {
        fn confirm(&self, prompt: &str) -> Result<bool> {
            self.asked.lock().unwrap().push(prompt.to_string());
            Ok(self.answer)
        }
    }
}
