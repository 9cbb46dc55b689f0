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

//! Terminal color theme of the shell.
//!
//! A theme is a plain value. The no-color theme is made of default
//! [`Style`]s, which paint text without any escape sequence, so callers never
//! branch on whether colors are enabled.

use ansi_term::Colour::Purple;
use ansi_term::Style;
use std::env;
use std::io::IsTerminal;

/// Styles used when reporting errors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Traceback {
    /// The error kind label, e.g. `OperationalError (SQLITE_ERROR)`.
    pub kind:    Style,
    /// The error text.
    pub message: Style,
}

/// Styles used by the line editor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Syntax {
    /// The primary and continuation prompts.
    pub prompt: Style,
}

/// The color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Theme {
    pub traceback: Traceback,
    pub syntax:    Syntax,
}

impl Theme {
    /// The colored theme.
    pub fn colored() -> Self {
        Theme {
            traceback: Traceback {
                kind: Purple.bold(),
                message: Purple.normal(),
            },
            syntax: Syntax {
                prompt: Purple.bold(),
            },
        }
    }

    /// The theme that emits no escape sequences at all.
    pub fn no_color() -> Self {
        Theme::default()
    }

    /// Picks the theme for the current process. Colors are used only when
    /// they are not forced off and the terminal can display them.
    pub fn resolve(force_no_color: bool) -> Self {
        if !force_no_color && can_colorize() {
            Theme::colored()
        } else {
            Theme::no_color()
        }
    }
}

/// Returns true if stdout can display colors, honoring `NO_COLOR`,
/// `FORCE_COLOR` and `TERM=dumb`.
pub fn can_colorize() -> bool {
    colors_allowed(
        non_empty_var("NO_COLOR"),
        non_empty_var("FORCE_COLOR"),
        env::var("TERM").ok().as_deref(),
        std::io::stdout().is_terminal(),
    )
}

fn non_empty_var(key: &str) -> bool {
    env::var_os(key).map_or(false, |v| !v.is_empty())
}

fn colors_allowed(no_color: bool, force_color: bool, term: Option<&str>, is_tty: bool) -> bool {
    if no_color {
        return false;
    }
    if force_color {
        return true;
    }
    if term == Some("dumb") {
        return false;
    }
    is_tty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_color_paints_plain_text() {
        let theme = Theme::no_color();
        assert_eq!(theme.traceback.kind.paint("Error").to_string(), "Error");
        assert_eq!(theme.syntax.prompt.paint("sqlite> ").to_string(), "sqlite> ");
    }

    #[test]
    fn colored_paints_escape_sequences() {
        let theme = Theme::colored();
        let painted = theme.traceback.kind.paint("Error").to_string();
        assert!(painted.starts_with("\x1b["));
        assert!(painted.contains("Error"));
        assert!(painted.ends_with("\x1b[0m"));
    }

    #[test]
    fn forced_off_is_always_plain() {
        assert_eq!(Theme::resolve(true), Theme::no_color());
    }

    #[test]
    fn color_capability_rules() {
        assert!(!colors_allowed(true, true, None, true));
        assert!(colors_allowed(false, true, Some("dumb"), false));
        assert!(!colors_allowed(false, false, Some("dumb"), true));
        assert!(colors_allowed(false, false, Some("xterm-256color"), true));
        assert!(!colors_allowed(false, false, None, false));
    }
}
