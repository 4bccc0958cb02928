//! The interactive prompt session.

use anyhow::{Result, bail};
use console::Term;
use dialoguer::Input;
use std::io::BufRead;

pub const NAME_PROMPT: &str = "What will your lambda function be called?";

/// Source of free-text answers.
pub trait Prompter {
    fn input(&mut self, prompt: &str) -> Result<String>;

    /// Release the terminal. Called once when the session closes.
    fn close(&mut self) {}
}

/// Prompts on stdout with dialoguer.
///
/// When stdout is not a terminal the prompt is printed as a plain line and
/// the answer is read from stdin, so `echo name | lambda-factory` works.
pub struct TerminalPrompter {
    term: Term,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn input(&mut self, prompt: &str) -> Result<String> {
        if !self.term.is_term() {
            self.term.write_line(prompt)?;
            return read_answer(&mut std::io::stdin().lock());
        }
        let answer = Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text_on(&self.term)?;
        Ok(answer)
    }

    fn close(&mut self) {
        let _ = self.term.show_cursor();
        let _ = self.term.flush();
    }
}

/// Read one answer line without its line ending. End of input is an error.
fn read_answer(reader: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        bail!("input ended before a function name was given");
    }
    let len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(len);
    Ok(line)
}

/// An open prompt session.
///
/// Opened once per run and kept across re-prompts. Closing is idempotent
/// and also happens on drop, so every exit path releases the terminal.
pub struct Session<P: Prompter> {
    prompter: P,
    open: bool,
}

impl<P: Prompter> Session<P> {
    pub fn open(prompter: P) -> Self {
        Self {
            prompter,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Ask for a function name until a non-blank answer is given. The
    /// answer is returned as typed.
    pub fn ask_name(&mut self) -> Result<String> {
        if !self.open {
            bail!("prompt session is already closed");
        }

        loop {
            let answer = self.prompter.input(NAME_PROMPT)?;
            if !answer.trim().is_empty() {
                return Ok(answer);
            }
        }
    }

    pub fn close(&mut self) {
        if self.open {
            self.open = false;
            self.prompter.close();
        }
    }
}

impl<P: Prompter> Drop for Session<P> {
    fn drop(&mut self) {
        self.close();
    }
}
