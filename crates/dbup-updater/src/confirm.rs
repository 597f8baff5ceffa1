//! Operator prompts used while resolving a missing baseline.

use std::io::{self, BufRead, IsTerminal, Write};

/// Source of operator answers.
///
/// Prompts block the calling task; the updater only asks when it is not
/// running in automatic mode.
pub trait ConfirmationProvider: Send + Sync {
    /// Ask a yes/no question
    fn confirm(&self, question: &str) -> bool;

    /// Ask for a filesystem path; `None` when the operator gives none
    fn ask_path(&self, question: &str) -> Option<String>;
}

/// Prompts on stderr and reads answers from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    /// Console prompts when stdin is a terminal, otherwise [`NonInteractive`].
    pub fn detect() -> Box<dyn ConfirmationProvider> {
        if io::stdin().is_terminal() {
            Box::new(ConsolePrompt)
        } else {
            Box::new(NonInteractive)
        }
    }

    fn prompt_line(prompt: &str) -> Option<String> {
        eprint!("{prompt}");
        io::stderr().flush().ok();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                log::warn!("Failed to read input: {e}");
                None
            }
        }
    }
}

impl ConfirmationProvider for ConsolePrompt {
    fn confirm(&self, question: &str) -> bool {
        Self::prompt_line(&format!("{question} [y/N]: "))
            .is_some_and(|answer| is_yes(&answer))
    }

    fn ask_path(&self, question: &str) -> Option<String> {
        Self::prompt_line(&format!("{question}: ")).filter(|p| !p.is_empty())
    }
}

/// Answers "no" to everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl ConfirmationProvider for NonInteractive {
    fn confirm(&self, question: &str) -> bool {
        log::debug!("Not interactive, answering no to: {question}");
        false
    }

    fn ask_path(&self, question: &str) -> Option<String> {
        log::debug!("Not interactive, no answer to: {question}");
        None
    }
}

/// Only an explicit `y`/`yes` counts; empty input is "no"
fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("Y"));
        assert!(is_yes(" yes "));
        assert!(!is_yes("no"));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn test_empty_answer_is_no() {
        assert!(!is_yes(""));
        assert!(!is_yes("   "));
    }

    #[test]
    fn test_non_interactive_declines() {
        let p = NonInteractive;
        assert!(!p.confirm("Create the database?"));
        assert_eq!(p.ask_path("Path"), None);
    }
}
