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

use crate::args::{get_logging, get_logging_args};
use crate::configs::SHELL_MEMORY_DATABASE;
use crate::console::{InteractiveConsole, LineReader, Prompts};
use crate::error::ShellError;
use crate::shell::SqliteConsole;
use crate::sql;
use crate::theme::Theme;
use anyhow::{anyhow, Context as _, Result};
use clap::{App, Arg};
use log::{debug, warn};
use rusqlite::Connection;
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

const PRIMARY_PROMPT: &str = "sqlite> ";
const CONTINUATION_PROMPT: &str = "    ... ";

/// The key that ends the input on this platform.
const EOF_KEY: &str = if cfg!(windows) { "CTRL-Z" } else { "CTRL-D" };

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// A one-shot statement failed.
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::from(1),
        }
    }
}

pub fn command_args() -> App<'static> {
    App::new("sqlite-cli")
        .about("Command Line Interactive Shell for SQLite")
        .author("UMD Database Group")
        .arg(
            Arg::new("filename")
                .value_name("FILENAME")
                .help(
                    "SQLite database to open (defaults to ':memory:'). \
                     A new database is created if the file does not previously exist.",
                )
                .default_value(SHELL_MEMORY_DATABASE.as_str()),
        )
        .arg(
            Arg::new("sql")
                .value_name("SQL")
                .help("An SQL query to execute. Any returned rows are printed to stdout."),
        )
        .arg(
            Arg::new("sqlite-version")
                .short('v')
                .long("version")
                .help("Print underlying SQLite library version"),
        )
        .args(get_logging_args())
}

pub fn main() -> Result<Status> {
    run(std::env::args_os())
}

/// Parses `args`, opens the database and either runs the one-shot statement
/// or starts the interactive shell. The connection is closed before
/// returning, whatever the outcome.
pub fn run<I, T>(args: I) -> Result<Status>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command_args().get_matches_from(args);

    if get_logging(&matches)?.try_init().is_err() {
        debug!("logger already initialized");
    }

    if matches.is_present("sqlite-version") {
        print_version(&mut io::stdout().lock())?;
        return Ok(Status::Success);
    }

    #[cfg(windows)]
    let _ = ansi_term::enable_ansi_support();

    let filename = matches
        .value_of("filename")
        .unwrap_or(SHELL_MEMORY_DATABASE.as_str());
    let db_name = database_name(filename);

    let mut conn = Connection::open(filename)
        .with_context(|| anyhow!("unable to open database {}", db_name))?;
    debug!("opened {}", db_name);

    let status = match matches.value_of("sql").filter(|sql| !sql.is_empty()) {
        Some(sql) => one_shot(&mut conn, sql),
        None => {
            let prompts = Prompts::new(&Theme::resolve(false), PRIMARY_PROMPT, CONTINUATION_PROMPT);
            let mut reader = line_reader();
            interactive(&conn, reader.as_mut(), &banner(&db_name), &prompts)
        }
    };

    close(conn);
    status
}

fn print_version<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "SQLite version {}", rusqlite::version())?;
    out.flush()
}

/// How the database is named in the banner.
fn database_name(filename: &str) -> String {
    if filename == SHELL_MEMORY_DATABASE.as_str() {
        "a transient in-memory database".to_string()
    } else {
        sql::Quoted(filename).to_string()
    }
}

fn banner(db_name: &str) -> String {
    format!(
        "sqlite3 shell, running on SQLite version {}\n\
         Connected to {}\n\
         \n\
         Each command will be run using execute() on the cursor.\n\
         Type \".help\" for more information; type \".quit\" or {} to quit.",
        rusqlite::version(),
        db_name,
        EOF_KEY
    )
}

/// Runs `sql` directly. A database error has already been reported when
/// `Status::Failure` is returned.
fn one_shot(conn: &mut Connection, sql: &str) -> Result<Status> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    match sql::execute(
        conn,
        sql,
        false,
        &Theme::no_color(),
        &mut stdout.lock(),
        &mut stderr.lock(),
    ) {
        Ok(()) => Ok(Status::Success),
        Err(ShellError::Sql(_)) => Ok(Status::Failure),
        Err(e) => Err(e).context("one-shot execution failed"),
    }
}

fn interactive(
    conn: &Connection,
    reader: &mut dyn LineReader,
    banner: &str,
    prompts: &Prompts,
) -> Result<Status> {
    let mut console = SqliteConsole::new(conn, true);
    let verdict = console
        .interact(reader, banner, prompts)
        .context("interactive session failed")?;
    debug!("session ended: {:?}", verdict);
    Ok(Status::Success)
}

#[cfg(feature = "cli")]
fn line_reader() -> Box<dyn LineReader> {
    Box::new(crate::console::RustylineReader::new(crate::configs::history_path()))
}

#[cfg(not(feature = "cli"))]
fn line_reader() -> Box<dyn LineReader> {
    Box::new(crate::console::StdinReader::new(io::stdin().lock(), io::stdout()))
}

fn close(conn: Connection) {
    match conn.close() {
        Ok(()) => debug!("database closed"),
        Err((_, err)) => warn!("failed to close the database: {}", err),
    }
}
