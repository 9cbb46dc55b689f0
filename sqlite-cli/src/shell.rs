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

//! The SQLite shell: an [`InteractiveConsole`] that runs SQL and dot-commands.

use crate::console::{InteractiveConsole, Verdict};
use crate::error::Result;
use crate::sql::{self, complete_statement, Cursor};
use crate::theme::Theme;
use log::debug;
use rusqlite::Connection;
use std::io::{self, Stderr, Stdout, Write};

/// A shell meta-command, typed as `.<name>` on a line of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotCommand<'a> {
    /// `.version`: prints the engine version.
    Version,
    /// `.help`: prints a usage hint.
    Help,
    /// `.quit`: ends the session.
    Quit,
    /// A lone `.`.
    Empty,
    Unknown(&'a str),
}

impl<'a> DotCommand<'a> {
    /// Parses the text following the dot.
    pub fn parse(input: &'a str) -> Self {
        match input.trim() {
            "version" => DotCommand::Version,
            "help" => DotCommand::Help,
            "quit" => DotCommand::Quit,
            "" => DotCommand::Empty,
            unknown => DotCommand::Unknown(unknown),
        }
    }
}

/// Returns true if the last line of `source` is `.quit`.
fn ends_with_quit(source: &str) -> bool {
    source
        .lines()
        .last()
        .and_then(|line| line.strip_prefix('.'))
        .map_or(false, |command| DotCommand::parse(command) == DotCommand::Quit)
}

/// The interactive SQLite shell.
///
/// Every statement runs through one cursor, owned for the whole session. Rows
/// go to `out`; errors, the banner and interrupt notices go to `err`.
pub struct SqliteConsole<'conn, W: Write = Stdout, E: Write = Stderr> {
    cursor: Cursor<'conn>,
    use_color: bool,
    out: W,
    err: E,
}

impl<'conn> SqliteConsole<'conn> {
    /// Creates a shell printing to stdout and stderr.
    pub fn new(conn: &'conn Connection, use_color: bool) -> Self {
        SqliteConsole::with_writers(conn, use_color, io::stdout(), io::stderr())
    }
}

impl<'conn, W: Write, E: Write> SqliteConsole<'conn, W, E> {
    pub fn with_writers(conn: &'conn Connection, use_color: bool, out: W, err: E) -> Self {
        SqliteConsole {
            cursor: Cursor::new(conn),
            use_color,
            out,
            err,
        }
    }

    pub fn cursor(&self) -> &Cursor<'conn> {
        &self.cursor
    }

    pub fn into_writers(self) -> (W, E) {
        (self.out, self.err)
    }

    fn dispatch(&mut self, command: DotCommand<'_>, theme: &Theme) -> Result<Verdict> {
        match command {
            DotCommand::Version => writeln!(self.out, "{}", rusqlite::version())?,
            DotCommand::Help => writeln!(self.out, "Enter SQL code and press enter.")?,
            DotCommand::Quit => return Ok(Verdict::Quit),
            DotCommand::Empty => {}
            DotCommand::Unknown(unknown) => {
                debug!("unknown dot-command: {:?}", unknown);
                let t = theme.traceback;
                self.write(&format!(
                    "{}:{}\n",
                    t.kind.paint("Error"),
                    t.message.paint(format!(
                        " unknown command or invalid arguments: \"{}\".",
                        unknown
                    ))
                ))?;
            }
        }
        self.out.flush()?;
        Ok(Verdict::Complete)
    }
}

impl<W: Write, E: Write> InteractiveConsole for SqliteConsole<'_, W, E> {
    /// Returns [`Verdict::Incomplete`] while the SQL in `source` is not a
    /// complete statement. Dot-commands are always complete. SQL errors are
    /// reported and never end the session.
    fn runsource(&mut self, source: &str) -> Result<Verdict> {
        let theme = Theme::resolve(!self.use_color);

        if source.trim().is_empty() {
            return Ok(Verdict::Complete);
        }
        if let Some(command) = source.strip_prefix('.') {
            return self.dispatch(DotCommand::parse(command), &theme);
        }
        if !complete_statement(source) {
            // `.quit` on a continuation line abandons the pending statement.
            if ends_with_quit(source) {
                return Ok(Verdict::Quit);
            }
            return Ok(Verdict::Incomplete);
        }

        sql::execute(
            &mut self.cursor,
            source,
            true,
            &theme,
            &mut self.out,
            &mut self.err,
        )?;
        Ok(Verdict::Complete)
    }

    fn write(&mut self, data: &str) -> Result<()> {
        self.err.write_all(data.as_bytes())?;
        self.err.flush()?;
        Ok(())
    }
}
