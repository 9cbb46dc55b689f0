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

//! Configuration settings that affect the whole shell.

use ini::Ini;
use lazy_static::lazy_static;
use std::env;
use std::path::PathBuf;

lazy_static! {
    /// Global settings.
    pub static ref SHELL_CONF: Ini = Ini::load_from_str(include_str!("./config.toml")).unwrap();

    /// History file name.
    pub static ref SHELL_HISTORY_FILE: String = SHELL_CONF["shell"]["history_file"].to_string();
    /// Maximum number of history entries.
    pub static ref SHELL_HISTORY_SIZE: usize = SHELL_CONF["shell"]["history_size"].parse::<usize>().unwrap();
    /// Default log level.
    pub static ref SHELL_LOG_LEVEL: String = SHELL_CONF["shell"]["log_level"].to_string();

    /// The filename of a transient in-memory database.
    pub static ref SHELL_MEMORY_DATABASE: String = SHELL_CONF["database"]["memory"].to_string();
}

/// Environment variable overriding the history file location.
pub const HISTORY_ENV: &str = "SQLITE_CLI_HISTORY";

/// Resolves the history file: `$SQLITE_CLI_HISTORY`, then `$HOME/<history_file>`,
/// then `<history_file>` in the working directory.
pub fn history_path() -> PathBuf {
    if let Some(path) = env::var_os(HISTORY_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    match env::var_os("HOME").filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join(SHELL_HISTORY_FILE.as_str()),
        None => PathBuf::from(SHELL_HISTORY_FILE.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_shows() {
        let conf = Ini::load_from_str(include_str!("./config.toml")).unwrap();

        for (sec, prop) in &conf {
            println!("Section: {:?}", sec);
            for (key, value) in prop.iter() {
                println!("{:?}:{:?}", key, value);
            }
        }

        assert_eq!(":memory:", &conf["database"]["memory"]);
        assert_eq!(1000, conf["shell"]["history_size"].parse::<usize>().unwrap());
        assert_eq!("warn", &conf["shell"]["log_level"]);
    }

    #[test]
    fn lazy_settings_parse() {
        assert_eq!(*SHELL_MEMORY_DATABASE, ":memory:");
        assert_eq!(*SHELL_HISTORY_FILE, ".sqlite_cli_history");
        assert!(*SHELL_HISTORY_SIZE > 0);
    }

    #[test]
    fn history_path_ends_with_file_name() {
        // The override is only honored when set; the default always names the
        // configured file.
        if env::var_os(HISTORY_ENV).is_none() {
            assert!(history_path().ends_with(SHELL_HISTORY_FILE.as_str()));
        }
    }
}
