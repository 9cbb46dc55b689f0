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

//! Database errors as shown to the user.
//!
//! Every error coming out of the engine is reduced to a kind (the DB-API
//! exception class it corresponds to), an optional result code name, and the
//! engine's message. The label printed in front of the message is
//! `<Kind>` or `<Kind> (<SQLITE_CODE_NAME>)`.

use rusqlite::ffi;
use std::error;
use std::fmt::{Display, Formatter};
use std::os::raw::c_int;

/// The class of a database error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Errors related to the database itself, e.g. a corrupt file.
    Database,
    /// Errors in the database's operation, e.g. a syntax error, a locked or
    /// read-only database, a failed I/O.
    Operational,
    /// A constraint of the schema was violated.
    Integrity,
    /// The engine hit an internal error.
    Internal,
    /// The statement is being misused, e.g. more than one statement at a time
    /// or a wrong number of bindings.
    Programming,
    /// The interface to the engine was misused.
    Interface,
    /// A value is too big for the engine.
    Data,
    /// The engine ran out of memory.
    Memory,
}

impl ErrorKind {
    /// Maps an engine result code (primary or extended) to an error kind.
    pub fn from_code(code: c_int) -> Self {
        match code & 0xff {
            ffi::SQLITE_INTERNAL | ffi::SQLITE_NOTFOUND => ErrorKind::Internal,
            ffi::SQLITE_NOMEM => ErrorKind::Memory,
            ffi::SQLITE_ERROR
            | ffi::SQLITE_PERM
            | ffi::SQLITE_ABORT
            | ffi::SQLITE_BUSY
            | ffi::SQLITE_LOCKED
            | ffi::SQLITE_READONLY
            | ffi::SQLITE_INTERRUPT
            | ffi::SQLITE_IOERR
            | ffi::SQLITE_FULL
            | ffi::SQLITE_CANTOPEN
            | ffi::SQLITE_PROTOCOL
            | ffi::SQLITE_EMPTY
            | ffi::SQLITE_SCHEMA => ErrorKind::Operational,
            ffi::SQLITE_CORRUPT => ErrorKind::Database,
            ffi::SQLITE_TOOBIG => ErrorKind::Data,
            ffi::SQLITE_CONSTRAINT | ffi::SQLITE_MISMATCH => ErrorKind::Integrity,
            ffi::SQLITE_MISUSE | ffi::SQLITE_RANGE => ErrorKind::Interface,
            _ => ErrorKind::Database,
        }
    }

    /// The name shown to the user.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Database => "DatabaseError",
            ErrorKind::Operational => "OperationalError",
            ErrorKind::Integrity => "IntegrityError",
            ErrorKind::Internal => "InternalError",
            ErrorKind::Programming => "ProgrammingError",
            ErrorKind::Interface => "InterfaceError",
            ErrorKind::Data => "DataError",
            ErrorKind::Memory => "MemoryError",
        }
    }
}

/// Result code names, extended codes first.
const CODE_NAMES: &[(c_int, &str)] = &[
    (257, "SQLITE_ERROR_MISSING_COLLSEQ"),
    (513, "SQLITE_ERROR_RETRY"),
    (769, "SQLITE_ERROR_SNAPSHOT"),
    (266, "SQLITE_IOERR_READ"),
    (522, "SQLITE_IOERR_SHORT_READ"),
    (778, "SQLITE_IOERR_WRITE"),
    (1034, "SQLITE_IOERR_FSYNC"),
    (1290, "SQLITE_IOERR_DIR_FSYNC"),
    (1546, "SQLITE_IOERR_TRUNCATE"),
    (1802, "SQLITE_IOERR_FSTAT"),
    (2058, "SQLITE_IOERR_UNLOCK"),
    (2314, "SQLITE_IOERR_RDLOCK"),
    (2570, "SQLITE_IOERR_DELETE"),
    (2826, "SQLITE_IOERR_BLOCKED"),
    (3082, "SQLITE_IOERR_NOMEM"),
    (3338, "SQLITE_IOERR_ACCESS"),
    (3594, "SQLITE_IOERR_CHECKRESERVEDLOCK"),
    (3850, "SQLITE_IOERR_LOCK"),
    (4106, "SQLITE_IOERR_CLOSE"),
    (4362, "SQLITE_IOERR_DIR_CLOSE"),
    (4618, "SQLITE_IOERR_SHMOPEN"),
    (4874, "SQLITE_IOERR_SHMSIZE"),
    (5130, "SQLITE_IOERR_SHMLOCK"),
    (5386, "SQLITE_IOERR_SHMMAP"),
    (5642, "SQLITE_IOERR_SEEK"),
    (5898, "SQLITE_IOERR_DELETE_NOENT"),
    (6154, "SQLITE_IOERR_MMAP"),
    (6410, "SQLITE_IOERR_GETTEMPPATH"),
    (6666, "SQLITE_IOERR_CONVPATH"),
    (6922, "SQLITE_IOERR_VNODE"),
    (7178, "SQLITE_IOERR_AUTH"),
    (7434, "SQLITE_IOERR_BEGIN_ATOMIC"),
    (7690, "SQLITE_IOERR_COMMIT_ATOMIC"),
    (7946, "SQLITE_IOERR_ROLLBACK_ATOMIC"),
    (8202, "SQLITE_IOERR_DATA"),
    (8458, "SQLITE_IOERR_CORRUPTFS"),
    (262, "SQLITE_LOCKED_SHAREDCACHE"),
    (518, "SQLITE_LOCKED_VTAB"),
    (261, "SQLITE_BUSY_RECOVERY"),
    (517, "SQLITE_BUSY_SNAPSHOT"),
    (773, "SQLITE_BUSY_TIMEOUT"),
    (270, "SQLITE_CANTOPEN_NOTEMPDIR"),
    (526, "SQLITE_CANTOPEN_ISDIR"),
    (782, "SQLITE_CANTOPEN_FULLPATH"),
    (1038, "SQLITE_CANTOPEN_CONVPATH"),
    (1294, "SQLITE_CANTOPEN_DIRTYWAL"),
    (1550, "SQLITE_CANTOPEN_SYMLINK"),
    (267, "SQLITE_CORRUPT_VTAB"),
    (523, "SQLITE_CORRUPT_SEQUENCE"),
    (779, "SQLITE_CORRUPT_INDEX"),
    (264, "SQLITE_READONLY_RECOVERY"),
    (520, "SQLITE_READONLY_CANTLOCK"),
    (776, "SQLITE_READONLY_ROLLBACK"),
    (1032, "SQLITE_READONLY_DBMOVED"),
    (1288, "SQLITE_READONLY_CANTINIT"),
    (1544, "SQLITE_READONLY_DIRECTORY"),
    (516, "SQLITE_ABORT_ROLLBACK"),
    (275, "SQLITE_CONSTRAINT_CHECK"),
    (531, "SQLITE_CONSTRAINT_COMMITHOOK"),
    (787, "SQLITE_CONSTRAINT_FOREIGNKEY"),
    (1043, "SQLITE_CONSTRAINT_FUNCTION"),
    (1299, "SQLITE_CONSTRAINT_NOTNULL"),
    (1555, "SQLITE_CONSTRAINT_PRIMARYKEY"),
    (1811, "SQLITE_CONSTRAINT_TRIGGER"),
    (2067, "SQLITE_CONSTRAINT_UNIQUE"),
    (2323, "SQLITE_CONSTRAINT_VTAB"),
    (2579, "SQLITE_CONSTRAINT_ROWID"),
    (2835, "SQLITE_CONSTRAINT_PINNED"),
    (3091, "SQLITE_CONSTRAINT_DATATYPE"),
    (283, "SQLITE_NOTICE_RECOVER_WAL"),
    (539, "SQLITE_NOTICE_RECOVER_ROLLBACK"),
    (795, "SQLITE_NOTICE_RBU"),
    (284, "SQLITE_WARNING_AUTOINDEX"),
    (279, "SQLITE_AUTH_USER"),
    (256, "SQLITE_OK_LOAD_PERMANENTLY"),
    (512, "SQLITE_OK_SYMLINK"),
    (1, "SQLITE_ERROR"),
    (2, "SQLITE_INTERNAL"),
    (3, "SQLITE_PERM"),
    (4, "SQLITE_ABORT"),
    (5, "SQLITE_BUSY"),
    (6, "SQLITE_LOCKED"),
    (7, "SQLITE_NOMEM"),
    (8, "SQLITE_READONLY"),
    (9, "SQLITE_INTERRUPT"),
    (10, "SQLITE_IOERR"),
    (11, "SQLITE_CORRUPT"),
    (12, "SQLITE_NOTFOUND"),
    (13, "SQLITE_FULL"),
    (14, "SQLITE_CANTOPEN"),
    (15, "SQLITE_PROTOCOL"),
    (16, "SQLITE_EMPTY"),
    (17, "SQLITE_SCHEMA"),
    (18, "SQLITE_TOOBIG"),
    (19, "SQLITE_CONSTRAINT"),
    (20, "SQLITE_MISMATCH"),
    (21, "SQLITE_MISUSE"),
    (22, "SQLITE_NOLFS"),
    (23, "SQLITE_AUTH"),
    (24, "SQLITE_FORMAT"),
    (25, "SQLITE_RANGE"),
    (26, "SQLITE_NOTADB"),
    (27, "SQLITE_NOTICE"),
    (28, "SQLITE_WARNING"),
];

/// Returns the symbolic name of a result code. Unknown extended codes fall
/// back to the name of their primary code.
pub fn code_name(code: c_int) -> Option<&'static str> {
    let lookup = |c: c_int| {
        CODE_NAMES
            .iter()
            .find(|(value, _)| *value == c)
            .map(|(_, name)| *name)
    };
    lookup(code).or_else(|| lookup(code & 0xff))
}

/// A database error, ready to be displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlError {
    kind: ErrorKind,
    code_name: Option<&'static str>,
    message: String,
}

impl SqlError {
    /// Creates a new error.
    pub fn new(kind: ErrorKind, code_name: Option<&'static str>, message: impl Into<String>) -> Self {
        SqlError {
            kind,
            code_name,
            message: message.into(),
        }
    }

    /// A misuse detected by the shell itself rather than by the engine.
    pub fn programming(message: impl Into<String>) -> Self {
        SqlError::new(ErrorKind::Programming, None, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code_name(&self) -> Option<&'static str> {
        self.code_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The kind name, followed by the result code name when there is one.
    pub fn label(&self) -> String {
        match self.code_name {
            Some(name) => format!("{} ({})", self.kind.name(), name),
            None => self.kind.name().to_string(),
        }
    }
}

impl Display for SqlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label(), self.message)
    }
}

impl error::Error for SqlError {}

impl From<rusqlite::Error> for SqlError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(err, msg) => {
                let message = msg.unwrap_or_else(|| err.to_string());
                SqlError::new(
                    ErrorKind::from_code(err.extended_code),
                    code_name(err.extended_code),
                    message,
                )
            }
            // Prepare failures carry the statement text and the error offset
            // on top of the engine message.
            rusqlite::Error::SqlInputError { error, msg, .. } => SqlError::new(
                ErrorKind::from_code(error.extended_code),
                code_name(error.extended_code),
                msg,
            ),
            rusqlite::Error::InvalidParameterCount(given, expected) => {
                SqlError::programming(bindings_message(expected, given))
            }
            rusqlite::Error::MultipleStatement => {
                SqlError::programming("You can only execute one statement at a time.")
            }
            rusqlite::Error::NulError(_) => {
                SqlError::programming("the query contains a null character")
            }
            rusqlite::Error::Utf8Error(_) => {
                SqlError::new(ErrorKind::Operational, None, "Could not decode to UTF-8")
            }
            other => SqlError::new(ErrorKind::Interface, None, other.to_string()),
        }
    }
}

/// The message of a statement executed with the wrong number of bindings.
pub fn bindings_message(expected: usize, given: usize) -> String {
    format!(
        "Incorrect number of bindings supplied. The current statement uses {}, and there are {} supplied.",
        expected, given
    )
}
