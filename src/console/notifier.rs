use std::io::{self, BufRead, Write};

/// Blocking user notifications raised by the console.
pub trait Notifier {
    /// Tell the user something and wait until it has been shown.
    fn alert(&mut self, message: &str);

    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Notifier for terminals: alerts go to stderr, confirmations read stdin.
#[derive(Debug, Clone, Default)]
pub struct TerminalNotifier {
    assume_yes: bool,
}

impl TerminalNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

/// Interpret a typed answer to a `y/N` prompt.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

impl Notifier for TerminalNotifier {
    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        eprint!("{question} [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&answer),
        }
    }
}
