//! Operator input
//!
//! Interactive flows (backup restore) talk to the operator through the
//! [`Prompt`] trait so they can run against a real terminal or a scripted
//! sequence of answers.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::{BsmError, BsmResult};

/// Operator input capability
pub trait Prompt {
    /// Show an informational line to the operator
    fn notify(&mut self, message: &str);

    /// Ask for a line of input; an empty answer yields `default`
    fn ask_line(&mut self, prompt: &str, default: &str) -> BsmResult<String>;

    /// Ask a yes/no question; only an explicit yes is affirmative
    fn ask_confirm(&mut self, prompt: &str) -> BsmResult<bool>;
}

/// Prompt backed by stdin/stdout
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }

    fn read_answer(prompt: &str) -> BsmResult<String> {
        print!("{}", prompt);
        io::stdout()
            .flush()
            .map_err(|e| BsmError::Io(e.to_string()))?;

        let mut input = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| BsmError::Io(format!("Failed to read operator input: {}", e)))?;
        if read == 0 {
            // EOF: nobody is there to answer
            return Err(BsmError::Cancelled("Input".into()));
        }
        Ok(input.trim().to_string())
    }
}

impl Prompt for TerminalPrompt {
    fn notify(&mut self, message: &str) {
        println!("{}", message);
    }

    fn ask_line(&mut self, prompt: &str, default: &str) -> BsmResult<String> {
        let answer = Self::read_answer(&format!("{} [{}]: ", prompt, default))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    fn ask_confirm(&mut self, prompt: &str) -> BsmResult<bool> {
        let answer = Self::read_answer(&format!("{} (y/n): ", prompt))?;
        Ok(is_affirmative(&answer))
    }
}

/// Interpret an answer as yes/no
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Prompt that replays prepared answers
///
/// Unanswered questions fall back to the default (lines) or "no" (confirms).
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    lines: VecDeque<String>,
    confirms: VecDeque<bool>,
    transcript: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for the next `ask_line`
    pub fn with_line(mut self, answer: impl Into<String>) -> Self {
        self.lines.push_back(answer.into());
        self
    }

    /// Queue an answer for the next `ask_confirm`
    pub fn with_confirm(mut self, answer: bool) -> Self {
        self.confirms.push_back(answer);
        self
    }

    /// Everything shown or asked so far, in order
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }
}

impl Prompt for ScriptedPrompt {
    fn notify(&mut self, message: &str) {
        self.transcript.push(message.to_string());
    }

    fn ask_line(&mut self, prompt: &str, default: &str) -> BsmResult<String> {
        self.transcript.push(prompt.to_string());
        Ok(self
            .lines
            .pop_front()
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    fn ask_confirm(&mut self, prompt: &str) -> BsmResult<bool> {
        self.transcript.push(prompt.to_string());
        Ok(self.confirms.pop_front().unwrap_or(false))
    }
}
