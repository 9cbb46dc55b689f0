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

use crate::configs::SHELL_LOG_LEVEL;
use anyhow::Result;
use clap::{Arg, ArgMatches};
use log::LevelFilter;
use std::io::Write;

pub fn get_logging_args() -> Vec<Arg<'static>> {
    [
        Arg::new("log-level")
            .short('L')
            .long("log-level")
            .possible_values(["error", "warn", "info", "debug", "trace", "off"])
            .help("Log level [default: warn]")
            .takes_value(true),
        Arg::new("trace")
            .long("trace")
            .help("Log ultra-verbose (trace level) information")
            .takes_value(false),
        Arg::new("silent")
            .long("silent")
            .help("Suppress all log output")
            .takes_value(false),
    ]
    .to_vec()
}

/// Picks the log level: `--trace`, then `--silent`, then `--log-level`, then
/// the configured default.
pub fn log_level(matches: &ArgMatches) -> LevelFilter {
    if matches.is_present("trace") {
        LevelFilter::Trace
    } else if matches.is_present("silent") {
        LevelFilter::Off
    } else {
        matches
            .value_of("log-level")
            .unwrap_or(SHELL_LOG_LEVEL.as_str())
            .parse::<LevelFilter>()
            .unwrap_or(LevelFilter::Warn)
    }
}

pub fn get_logging(matches: &ArgMatches) -> Result<env_logger::Builder> {
    let mut builder = env_logger::Builder::new();

    let level = log_level(matches);
    builder.filter(None, level);
    builder.filter_module("rustyline", LevelFilter::Warn);

    if level == LevelFilter::Trace {
        builder.format_timestamp_secs();
    } else {
        builder.format(|f, record| {
            writeln!(
                f,
                "[{}] {}",
                record.level().to_string().to_lowercase(),
                record.args()
            )
        });
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::App;

    fn matches(args: &[&str]) -> ArgMatches {
        App::new("test")
            .args(get_logging_args())
            .get_matches_from(args.iter().copied())
    }

    #[test]
    fn default_level_comes_from_config() {
        assert_eq!(log_level(&matches(&["test"])), LevelFilter::Warn);
    }

    #[test]
    fn explicit_levels() {
        assert_eq!(log_level(&matches(&["test", "-L", "debug"])), LevelFilter::Debug);
        assert_eq!(
            log_level(&matches(&["test", "--log-level", "off"])),
            LevelFilter::Off
        );
    }

    #[test]
    fn trace_wins_over_silent() {
        assert_eq!(
            log_level(&matches(&["test", "--silent", "--trace"])),
            LevelFilter::Trace
        );
        assert_eq!(log_level(&matches(&["test", "--silent"])), LevelFilter::Off);
    }

    #[test]
    fn rejects_unknown_level() {
        let result = App::new("test")
            .args(get_logging_args())
            .try_get_matches_from(["test", "-L", "loud"]);
        assert!(result.is_err());
    }
}
