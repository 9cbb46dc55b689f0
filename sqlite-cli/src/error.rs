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

//! Shell error types

use crate::sql::SqlError;

use std::error;
use std::fmt::{Display, Formatter};
use std::io;
use std::result;

/// Result type for operations that could result in a [ShellError]
pub type Result<T> = result::Result<T, ShellError>;

/// Shell error
#[derive(Debug)]
pub enum ShellError {
    /// Error reported by the database engine (or the driver) while running a
    /// statement. By the time this error is returned it has already been
    /// printed to the user.
    Sql(SqlError),
    /// Error associated to I/O operations on the terminal.
    IoError(io::Error),
    /// Error returned by the line editor.
    Readline(String),
}

impl From<io::Error> for ShellError {
    fn from(e: io::Error) -> Self {
        ShellError::IoError(e)
    }
}

impl From<SqlError> for ShellError {
    fn from(e: SqlError) -> Self {
        ShellError::Sql(e)
    }
}

#[cfg(feature = "cli")]
impl From<rustyline::error::ReadlineError> for ShellError {
    fn from(e: rustyline::error::ReadlineError) -> Self {
        ShellError::Readline(e.to_string())
    }
}

impl Display for ShellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            ShellError::Sql(ref desc) => write!(f, "{}", desc),
            ShellError::IoError(ref desc) => write!(f, "IO error: {}", desc),
            ShellError::Readline(ref desc) => write!(f, "Line editor error: {}", desc),
        }
    }
}

impl error::Error for ShellError {}
