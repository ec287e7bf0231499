//! Line-based terminal I/O
//!
//! The session never touches stdin/stdout directly; it goes through a
//! [`Console`]. [`TerminalConsole`] uses `dialoguer` prompts when attached to
//! a terminal (hidden password entry), [`LineConsole`] reads plain lines from
//! any reader, which covers piped input and tests.
//!
//! Typed prompts (`ask_int`, `ask_float`, `ask_date`) turn unparsable input
//! into [`NgoError::InvalidInput`] so an action can be abandoned without
//! leaving the menu.

use chrono::NaiveDate;
use dialoguer::{Input, Password};
use std::io::{BufRead, Write};

use crate::error::{NgoError, Result};

/// Prompt-and-print surface used by the session and the action catalog
pub trait Console {
    /// Read one line of free text (may be empty)
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Read a secret without echo where the console supports it
    fn read_secret(&mut self, prompt: &str) -> Result<String>;

    /// Print one line
    fn say(&mut self, text: &str);

    /// Read a whole number
    fn ask_int(&mut self, prompt: &str) -> Result<i64> {
        let text = self.read_line(prompt)?;
        text.trim()
            .parse()
            .map_err(|_| NgoError::invalid_input(format!("'{}' is not a whole number", text.trim())))
    }

    /// Read a decimal number
    fn ask_float(&mut self, prompt: &str) -> Result<f64> {
        let text = self.read_line(prompt)?;
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(NgoError::invalid_input(format!("'{}' is not a number", text.trim()))),
        }
    }

    /// Read a `YYYY-MM-DD` date, returned in canonical form
    fn ask_date(&mut self, prompt: &str) -> Result<String> {
        let text = self.read_line(prompt)?;
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(|date| date.format("%Y-%m-%d").to_string())
            .map_err(|_| {
                NgoError::invalid_input(format!("'{}' is not a date (YYYY-MM-DD)", text.trim()))
            })
    }

    /// Ask a yes/no question; only `y`/`yes` (any case) count as yes
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.read_line(prompt)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Interactive terminal console backed by `dialoguer`
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(terminal_error)
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(terminal_error)
    }

    fn say(&mut self, text: &str) {
        println!("{text}");
    }
}

fn terminal_error(err: dialoguer::Error) -> NgoError {
    let dialoguer::Error::IO(io) = err;
    NgoError::from(io)
}

/// Plain line console over any reader/writer pair
///
/// Prompts are written as `"<prompt>: "` without a newline, the way a shell
/// `read -p` would. End of input is reported as [`NgoError::InputClosed`].
pub struct LineConsole<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LineConsole<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Everything written so far
    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> Console for LineConsole<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.writer, "{prompt}: ")?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(NgoError::InputClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String> {
        self.read_line(prompt)
    }

    fn say(&mut self, text: &str) {
        // A closed stdout leaves nothing useful to report to
        let _ = writeln!(self.writer, "{text}");
    }
}
