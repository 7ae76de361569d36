// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Interactive terminal prompts
//!
//! The device and adapter choices are read from the terminal when they are
//! not given on the command line. [`Prompter`] is generic over its reader and
//! writer so selection logic can be driven from in-memory buffers.

use crate::error::{BenchError, Result};
use std::io::{BufRead, Write};

/// Attempts allowed before a prompt gives up on unparseable answers.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Asks questions on `output` and reads answers line by line from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    max_attempts: usize,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Writer the questions go to. Used for listing choices before a prompt.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Consume the prompter, returning the writer
    pub fn into_output(self) -> W {
        self.output
    }

    /// Print `question` and parse the answer, re-asking when `parse` rejects it.
    ///
    /// End of input fails immediately; repeated rejections fail after
    /// `max_attempts` tries.
    pub fn ask<T, F>(&mut self, question: &str, parse: F) -> Result<T>
    where
        F: Fn(&str) -> std::result::Result<T, String>,
    {
        for attempt in 1..=self.max_attempts {
            write!(self.output, "{}", question)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(BenchError::InvalidInput(
                    "input closed while waiting for an answer".into(),
                ));
            }

            match parse(line.trim()) {
                Ok(value) => return Ok(value),
                Err(msg) => {
                    log::warn!("Rejected answer {:?} (attempt {}): {}", line.trim(), attempt, msg);
                    writeln!(self.output, "{}", msg)?;
                }
            }
        }

        Err(BenchError::InvalidInput(format!(
            "no valid answer after {} attempts",
            self.max_attempts
        )))
    }
}
