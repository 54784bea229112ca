//! Operator interaction seam. The workflow blocks on explicit operator
//! acknowledgment at two points (after a failed unattended remediation, and
//! at the very end); tests inject recording fakes instead of a console.

use std::io::{BufRead, Write};

/// Blocking operator prompts.
pub trait OperatorPrompt: Send + Sync {
    /// Print `message` and block until the operator presses Enter.
    fn acknowledge(&self, message: &str);

    /// Ask a yes/no question; default is no.
    fn confirm(&self, message: &str) -> bool;
}

/// Console-backed prompt reading from stdin.
pub struct ConsolePrompt;

impl OperatorPrompt for ConsolePrompt {
    fn acknowledge(&self, message: &str) {
        print!("{} ", message);
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    }

    fn confirm(&self, message: &str) -> bool {
        print!("{} (y/n): ", message);
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        line.trim().eq_ignore_ascii_case("y")
    }
}
