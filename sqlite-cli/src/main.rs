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

//! A command-line shell for SQLite databases.

mod args;
mod configs;
mod console;
mod error;
mod repl;
mod shell;
mod sql;
mod theme;

use std::process::ExitCode;

pub fn main() -> ExitCode {
    match repl::main() {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::FAILURE
        }
    }
}
