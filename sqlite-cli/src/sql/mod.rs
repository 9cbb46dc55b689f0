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

//! Runs SQL against the database and prints the outcome.
//!
//! [`execute`] is shared by the one-shot mode of the command line and by the
//! interactive shell. It accepts anything that implements [`Executor`]: the
//! connection itself, or a [`Cursor`] that keeps per-session bookkeeping.

mod error;
mod row;

pub use error::{bindings_message, ErrorKind, SqlError};
pub use row::{Quoted, Row};

use crate::error::{Result, ShellError};
use crate::theme::Theme;
use log::{debug, trace};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{ffi, Batch, Connection};
use std::io::Write;
use std::os::raw::c_char;

/// Returns true if `sql` forms one or more complete statements: the text ends
/// with a semicolon that is outside string literals, quoted identifiers and
/// comments, and every trigger body is closed by `END;`.
pub fn complete_statement(sql: &str) -> bool {
    // The engine reads the text as a C string and stops at the first NUL.
    let sql = match sql.find('\0') {
        Some(nul) => &sql[..nul],
        None => sql,
    };
    let mut c_sql = Vec::with_capacity(sql.len() + 1);
    c_sql.extend_from_slice(sql.as_bytes());
    c_sql.push(0);
    // SAFETY: `c_sql` is NUL-terminated, has no interior NUL and outlives the
    // call, which only reads it.
    unsafe { ffi::sqlite3_complete(c_sql.as_ptr() as *const c_char) != 0 }
}

/// What the engine reported about a statement that ran to completion.
#[derive(Debug, Clone, Copy)]
pub struct Executed {
    /// True for INSERT, UPDATE, DELETE and REPLACE.
    pub is_dml: bool,
    /// Number of result columns.
    pub columns: usize,
}

/// A handle that can run SQL.
pub trait Executor {
    /// The connection statements run on.
    fn connection(&self) -> &Connection;

    /// Runs a single statement, handing every result row to `on_row` in the
    /// order the engine yields them. Engine errors are returned as
    /// [`ShellError::Sql`]; errors from `on_row` are returned unchanged.
    fn run(&mut self, sql: &str, on_row: &mut dyn FnMut(Row) -> Result<()>) -> Result<()> {
        run_statement(self.connection(), sql, on_row).map(|_| ())
    }
}

impl Executor for Connection {
    fn connection(&self) -> &Connection {
        self
    }
}

/// A cursor over a borrowed connection.
///
/// Keeps the row count and the last inserted row id of the most recent
/// statement, like a DB-API cursor.
pub struct Cursor<'conn> {
    conn: &'conn Connection,
    rowcount: i64,
    lastrowid: i64,
}

impl<'conn> Cursor<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Cursor {
            conn,
            rowcount: -1,
            lastrowid: 0,
        }
    }

    /// Rows changed by the last DML statement, or -1.
    pub fn rowcount(&self) -> i64 {
        self.rowcount
    }

    /// Row id of the most recent successful INSERT on the connection.
    pub fn lastrowid(&self) -> i64 {
        self.lastrowid
    }
}

impl Executor for Cursor<'_> {
    fn connection(&self) -> &Connection {
        self.conn
    }

    fn run(&mut self, sql: &str, on_row: &mut dyn FnMut(Row) -> Result<()>) -> Result<()> {
        self.rowcount = -1;
        if let Some(executed) = run_statement(self.conn, sql, on_row)? {
            if executed.is_dml {
                self.rowcount = self.conn.changes() as i64;
            }
            self.lastrowid = self.conn.last_insert_rowid();
            debug!(
                "statement done: columns={}, rowcount={}, lastrowid={}",
                executed.columns, self.rowcount, self.lastrowid
            );
        }
        Ok(())
    }
}

/// Prepares and steps exactly one statement. Returns `None` if `sql` holds no
/// statement at all (only whitespace or comments).
fn run_statement(
    conn: &Connection,
    sql: &str,
    on_row: &mut dyn FnMut(Row) -> Result<()>,
) -> Result<Option<Executed>> {
    let mut batch = Batch::new(conn, sql);
    let mut stmt = match batch.next().map_err(SqlError::from)? {
        Some(stmt) => stmt,
        None => return Ok(None),
    };
    // Anything after the first statement, even if it does not compile.
    if !matches!(batch.next(), Ok(None)) {
        return Err(SqlError::programming("You can only execute one statement at a time.").into());
    }

    let expected = stmt.parameter_count();
    if expected != 0 {
        return Err(SqlError::programming(bindings_message(expected, 0)).into());
    }

    let executed = Executed {
        is_dml: is_dml(sql),
        columns: stmt.column_count(),
    };
    trace!("running statement: {}", sql.trim());

    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next().map_err(SqlError::from)? {
        let values = (0..executed.columns)
            .map(|i| column_value(row, i))
            .collect::<Result<Vec<_>>>()?;
        on_row(Row::new(values))?;
    }

    Ok(Some(executed))
}

/// Reads column `i` of `row`. Text that is not valid UTF-8 is an
/// operational error instead of a panic.
fn column_value(row: &rusqlite::Row<'_>, i: usize) -> Result<Value> {
    let value = match row.get_ref(i).map_err(SqlError::from)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::Text(text.to_owned()),
            Err(_) => {
                let column = row.as_ref().column_name(i).unwrap_or_default();
                let message = format!(
                    "Could not decode to UTF-8 column '{}' with text '{}'",
                    column,
                    String::from_utf8_lossy(bytes)
                );
                return Err(SqlError::new(ErrorKind::Operational, None, message).into());
            }
        },
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    };
    Ok(value)
}

/// Drops leading whitespace and comments.
fn skip_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.split_once('\n').map_or("", |(_, rest)| rest);
        } else if let Some(rest) = sql.strip_prefix("/*") {
            sql = rest.split_once("*/").map_or("", |(_, rest)| rest);
        } else {
            return sql;
        }
    }
}

/// Leading keyword check for data-modifying statements.
fn is_dml(sql: &str) -> bool {
    let keyword = skip_comments(sql)
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    ["INSERT", "UPDATE", "DELETE", "REPLACE"]
        .iter()
        .any(|dml| keyword.eq_ignore_ascii_case(dml))
}

/// Runs `sql` on `c` and prints every result row to `out`, one per line.
///
/// A database error is printed to `err` as `<label>: <message>`, painted with
/// the traceback styles of `theme`. When `suppress_errors` is false the error
/// is then returned, so that the caller can end the process with a failure
/// status; otherwise the call succeeds.
///
/// # Arguments
/// * `c` - The connection or cursor to run the statement on.
/// * `sql` - The SQL text.
/// * `suppress_errors` - Whether a database error is reported only.
/// * `theme` - The color theme of the error message.
/// * `out` - Where rows are printed.
/// * `err` - Where errors are printed.
pub fn execute<E, W, R>(
    c: &mut E,
    sql: &str,
    suppress_errors: bool,
    theme: &Theme,
    out: &mut W,
    err: &mut R,
) -> Result<()>
where
    E: Executor + ?Sized,
    W: Write + ?Sized,
    R: Write + ?Sized,
{
    let outcome = c.run(sql, &mut |row: Row| -> Result<()> {
        writeln!(out, "{}", row)?;
        Ok(())
    });
    out.flush()?;

    match outcome {
        Err(ShellError::Sql(e)) => {
            let t = theme.traceback;
            writeln!(err, "{}: {}", t.kind.paint(e.label()), t.message.paint(e.message()))?;
            err.flush()?;
            debug!("statement failed: {}", e);
            if suppress_errors {
                Ok(())
            } else {
                Err(ShellError::Sql(e))
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(conn: &mut Connection, sql: &str, suppress: bool) -> (Result<()>, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = execute(conn, sql, suppress, &Theme::no_color(), &mut out, &mut err);
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn select_one() {
        let mut conn = Connection::open_in_memory().unwrap();
        let (result, out, err) = run(&mut conn, "SELECT 1;", false);
        assert!(result.is_ok());
        assert_eq!(out, "(1,)\n");
        assert_eq!(err, "");
    }

    #[test]
    fn no_rows_prints_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        let (result, out, err) = run(&mut conn, "CREATE TABLE t(x);", false);
        assert!(result.is_ok());
        assert_eq!(out, "");
        assert_eq!(err, "");
    }

    #[test]
    fn rows_keep_engine_order() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(x); INSERT INTO t VALUES (3), (1), (2), (1);")
            .unwrap();
        let (result, out, _) = run(&mut conn, "SELECT x FROM t;", false);
        assert!(result.is_ok());
        assert_eq!(out, "(3,)\n(1,)\n(2,)\n(1,)\n");
    }

    #[test]
    fn mixed_value_types() {
        let mut conn = Connection::open_in_memory().unwrap();
        let (_, out, _) = run(&mut conn, "SELECT NULL, 'it''s', x'00ff', 1.5, 'a';", false);
        assert_eq!(out, "(None, \"it's\", b'\\x00\\xff', 1.5, 'a')\n");
    }

    #[test]
    fn syntax_error_suppressed() {
        let mut conn = Connection::open_in_memory().unwrap();
        let (result, out, err) = run(&mut conn, "SELEC 1;", true);
        assert!(result.is_ok());
        assert_eq!(out, "");
        assert_eq!(err, "OperationalError (SQLITE_ERROR): near \"SELEC\": syntax error\n");
    }

    #[test]
    fn syntax_error_not_suppressed() {
        let mut conn = Connection::open_in_memory().unwrap();
        let (result, _, err) = run(&mut conn, "SELEC 1;", false);
        match result {
            Err(ShellError::Sql(e)) => assert_eq!(e.kind(), ErrorKind::Operational),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(err.starts_with("OperationalError"));
    }

    #[test]
    fn constraint_violation() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(a UNIQUE); INSERT INTO t VALUES (1);")
            .unwrap();
        let (_, _, err) = run(&mut conn, "INSERT INTO t VALUES (1);", true);
        assert_eq!(
            err,
            "IntegrityError (SQLITE_CONSTRAINT_UNIQUE): UNIQUE constraint failed: t.a\n"
        );
    }

    #[test]
    fn one_statement_at_a_time() {
        let mut conn = Connection::open_in_memory().unwrap();
        let (result, out, err) = run(&mut conn, "CREATE TABLE t(x); SELECT 1;", true);
        assert!(result.is_ok());
        assert_eq!(out, "");
        assert_eq!(err, "ProgrammingError: You can only execute one statement at a time.\n");
        // Nothing ran.
        let (_, _, err) = run(&mut conn, "SELECT * FROM t;", true);
        assert!(err.contains("no such table: t"));
    }

    #[test]
    fn trailing_comment_is_not_a_statement() {
        let mut conn = Connection::open_in_memory().unwrap();
        let (_, out, err) = run(&mut conn, "SELECT 2; -- two\n", false);
        assert_eq!(out, "(2,)\n");
        assert_eq!(err, "");

        let (result, out, _) = run(&mut conn, "-- nothing here;", false);
        assert!(result.is_ok());
        assert_eq!(out, "");
    }

    #[test]
    fn unbound_parameters() {
        let mut conn = Connection::open_in_memory().unwrap();
        let (_, _, err) = run(&mut conn, "SELECT ?, ?;", true);
        assert_eq!(
            err,
            "ProgrammingError: Incorrect number of bindings supplied. \
             The current statement uses 2, and there are 0 supplied.\n"
        );
    }

    #[test]
    fn colored_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        execute(&mut conn, "SELEC 1;", true, &Theme::colored(), &mut out, &mut err).unwrap();
        let err = String::from_utf8(err).unwrap();
        assert!(err.starts_with("\x1b["));
        assert!(err.contains("OperationalError (SQLITE_ERROR)"));
        assert!(err.contains("syntax error"));
    }

    #[test]
    fn cursor_bookkeeping() -> Result<()> {
        let conn = Connection::open_in_memory().unwrap();
        let mut cursor = Cursor::new(&conn);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let theme = Theme::no_color();

        execute(&mut cursor, "CREATE TABLE t(x);", false, &theme, &mut out, &mut err)?;
        assert_eq!(cursor.rowcount(), -1);

        execute(&mut cursor, "INSERT INTO t VALUES (1), (2);", false, &theme, &mut out, &mut err)?;
        assert_eq!(cursor.rowcount(), 2);
        assert_eq!(cursor.lastrowid(), 2);

        execute(&mut cursor, "select count(*) from t;", false, &theme, &mut out, &mut err)?;
        assert_eq!(cursor.rowcount(), -1);
        assert_eq!(String::from_utf8(out).unwrap(), "(2,)\n");
        Ok(())
    }

    #[test]
    fn completeness() {
        assert!(!complete_statement("SELECT 1"));
        assert!(complete_statement("SELECT 1;"));
        assert!(complete_statement("SELECT 1\n;"));
        assert!(!complete_statement("SELECT ';"));
        assert!(complete_statement("SELECT ';';"));
        assert!(!complete_statement("SELECT 1 /* ; */"));
        assert!(complete_statement("SELECT 1; -- done"));
        assert!(!complete_statement(
            "CREATE TRIGGER tr AFTER INSERT ON t BEGIN SELECT 1;"
        ));
        assert!(complete_statement(
            "CREATE TRIGGER tr AFTER INSERT ON t BEGIN SELECT 1; END;"
        ));
        assert!(!complete_statement("SELECT 1\0;"));
    }

    #[test]
    fn dml_keywords() {
        assert!(is_dml("  insert into t values (1)"));
        assert!(is_dml("REPLACE INTO t VALUES (1)"));
        assert!(!is_dml("SELECT 1"));
        assert!(!is_dml("CREATE TABLE t(x)"));
        assert!(is_dml("-- note\n  /* more */ DELETE FROM t"));
        assert!(!is_dml("-- INSERT\nSELECT 1"));
        assert!(!is_dml("/* unterminated INSERT"));
    }

    #[test]
    fn commented_dml_counts_rows() -> Result<()> {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(x);").unwrap();
        let mut cursor = Cursor::new(&conn);
        let (mut out, mut err) = (Vec::new(), Vec::new());
        execute(
            &mut cursor,
            "-- seed\nINSERT INTO t VALUES (1), (2), (3);",
            false,
            &Theme::no_color(),
            &mut out,
            &mut err,
        )?;
        assert_eq!(cursor.rowcount(), 3);
        Ok(())
    }

    #[test]
    fn invalid_utf8_text_is_reported() {
        let mut conn = Connection::open_in_memory().unwrap();
        let (result, out, err) = run(&mut conn, "SELECT CAST(x'ff' AS TEXT);", true);
        assert!(result.is_ok());
        assert_eq!(out, "");
        assert!(err.starts_with("OperationalError: Could not decode to UTF-8 column "));

        let (result, _, _) = run(&mut conn, "SELECT CAST(x'ff' AS TEXT);", false);
        match result {
            Err(ShellError::Sql(e)) => assert_eq!(e.kind(), ErrorKind::Operational),
            other => panic!("unexpected outcome: {:?}", other),
        }

        // The connection is still usable.
        let (_, out, _) = run(&mut conn, "SELECT 2;", false);
        assert_eq!(out, "(2,)\n");
    }

    #[test]
    fn strict_table_datatype() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(x INTEGER) STRICT;").unwrap();
        let (_, _, err) = run(&mut conn, "INSERT INTO t VALUES ('a');", true);
        assert_eq!(
            err,
            "IntegrityError (SQLITE_CONSTRAINT_DATATYPE): \
             cannot store TEXT value in INTEGER column t.x\n"
        );
    }
}
