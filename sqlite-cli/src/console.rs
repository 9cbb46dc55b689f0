// Copyright (c) 2020-present, UMD Database Group.
//
// This program is free software: you can use, redistribute, and/or modify
// it under the terms of the GNU Affero General Public License, version 3
// or later ("AGPL"), as published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! A generic interactive console.
//!
//! The console reads lines, accumulates them in a buffer and, after every
//! line, asks [`InteractiveConsole::runsource`] whether the buffer is ready.
//! Implementors decide what "ready" means; the loop takes care of prompts,
//! interrupts, end of input and history.

use crate::error::Result;
use crate::theme::Theme;
use std::io::{BufRead, Write};

/// The answer of a console to a chunk of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// More lines are needed; the buffer is kept.
    Incomplete,
    /// The chunk was consumed; the buffer is cleared.
    Complete,
    /// The session is over.
    Quit,
}

/// One read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// The user pressed Ctrl-C.
    Interrupted,
    /// The user pressed Ctrl-D (Ctrl-Z on Windows), or the input ran out.
    Eof,
}

/// A source of input lines.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<Input>;

    /// Records a complete chunk of input.
    fn add_history(&mut self, _entry: &str) {}
}

/// The primary and continuation prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub primary:      String,
    pub continuation: String,
}

impl Prompts {
    /// Paints both prompts with the prompt style of `theme`.
    pub fn new(theme: &Theme, primary: &str, continuation: &str) -> Self {
        Prompts {
            primary: theme.syntax.prompt.paint(primary).to_string(),
            continuation: theme.syntax.prompt.paint(continuation).to_string(),
        }
    }
}

/// A read-eval-print loop over a buffer of lines.
pub trait InteractiveConsole {
    /// Decides what to do with the accumulated `source` (the buffered lines
    /// joined by newlines) and runs it if it is ready.
    fn runsource(&mut self, source: &str) -> Result<Verdict>;

    /// Writes to the error stream.
    fn write(&mut self, data: &str) -> Result<()>;

    /// Runs the loop until end of input or until `runsource` returns
    /// [`Verdict::Quit`]. Returns the verdict that ended the session.
    fn interact(
        &mut self,
        reader: &mut dyn LineReader,
        banner: &str,
        prompts: &Prompts,
    ) -> Result<Verdict> {
        if !banner.is_empty() {
            self.write(&format!("{}\n", banner))?;
        }

        let mut buffer: Vec<String> = Vec::new();
        loop {
            let prompt = if buffer.is_empty() {
                &prompts.primary
            } else {
                &prompts.continuation
            };

            match reader.read_line(prompt)? {
                Input::Line(line) => {
                    buffer.push(line);
                    let source = buffer.join("\n");
                    let verdict = self.runsource(&source)?;
                    if verdict == Verdict::Incomplete {
                        continue;
                    }
                    buffer.clear();
                    if !source.trim().is_empty() {
                        reader.add_history(&source);
                    }
                    if verdict == Verdict::Quit {
                        return Ok(Verdict::Quit);
                    }
                }
                Input::Interrupted => {
                    self.write("\nKeyboardInterrupt\n")?;
                    buffer.clear();
                }
                Input::Eof => {
                    self.write("\n")?;
                    return Ok(Verdict::Complete);
                }
            }
        }
    }
}

/// Reads lines from any buffered reader, writing prompts to `prompt_out`.
/// Used when line editing is not compiled in.
pub struct StdinReader<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StdinReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        StdinReader { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineReader for StdinReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Input::Eof);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Input::Line(line))
    }
}

#[cfg(feature = "cli")]
pub use self::editor::RustylineReader;

#[cfg(feature = "cli")]
mod editor {
    use super::{Input, LineReader};
    use crate::configs::SHELL_HISTORY_SIZE;
    use crate::error::Result;
    use log::{debug, warn};
    use rustyline::error::ReadlineError;
    use rustyline::{Config, Editor};
    use std::path::PathBuf;

    /// Line editing with persistent history.
    pub struct RustylineReader {
        editor: Editor<()>,
        history: PathBuf,
    }

    impl RustylineReader {
        /// Creates the editor and loads the history saved at `history`.
        pub fn new(history: PathBuf) -> Self {
            let config = Config::builder()
                .max_history_size(*SHELL_HISTORY_SIZE)
                .build();
            let mut editor = Editor::<()>::with_config(config);
            if let Err(err) = editor.load_history(&history) {
                debug!("no history loaded from {:?}: {}", history, err);
            }
            RustylineReader { editor, history }
        }
    }

    impl LineReader for RustylineReader {
        fn read_line(&mut self, prompt: &str) -> Result<Input> {
            match self.editor.readline(prompt) {
                Ok(line) => Ok(Input::Line(line)),
                Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
                Err(ReadlineError::Eof) => Ok(Input::Eof),
                Err(err) => Err(err.into()),
            }
        }

        fn add_history(&mut self, entry: &str) {
            self.editor.add_history_entry(entry);
        }
    }

    impl Drop for RustylineReader {
        fn drop(&mut self) {
            if let Err(err) = self.editor.save_history(&self.history) {
                warn!("failed to save history to {:?}: {}", self.history, err);
            }
        }
    }
}
