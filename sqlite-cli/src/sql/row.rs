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

//! Textual representation of result rows.
//!
//! A row prints as a tuple literal: `(1,)`, `(1, 'a', None)`, `(b'\x00',)`.

use rusqlite::types::Value;
use std::fmt::{self, Display, Formatter, Write};

/// One result row, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row(values)
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char('(')?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_value(f, value)?;
        }
        if self.0.len() == 1 {
            f.write_char(',')?;
        }
        f.write_char(')')
    }
}

/// Displays a string as a quoted literal, escaped the same way as text
/// values in a row.
pub struct Quoted<'a>(pub &'a str);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_text(f, self.0)
    }
}

fn write_value(f: &mut Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("None"),
        Value::Integer(i) => write!(f, "{}", i),
        Value::Real(r) => f.write_str(&float_repr(*r)),
        Value::Text(s) => write_text(f, s),
        Value::Blob(b) => write_blob(f, b),
    }
}

/// Shortest round-trip representation with a signed, two-digit exponent.
fn float_repr(r: f64) -> String {
    if r.is_nan() {
        return "nan".to_string();
    }
    if r.is_infinite() {
        return if r > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = format!("{:?}", r);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => s,
    }
}

/// Single quotes, unless the text holds a single quote and no double quote.
fn pick_quote(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double {
        '"'
    } else {
        '\''
    }
}

fn write_text(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    let quote = pick_quote(s.contains('\''), s.contains('"'));
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c if !is_printable(c) => match c as u32 {
                n @ 0..=0xff => write!(f, "\\x{:02x}", n)?,
                n @ 0x100..=0xffff => write!(f, "\\u{:04x}", n)?,
                n => write!(f, "\\U{:08x}", n)?,
            },
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

/// Whether `c` is shown as is inside a text literal. Control and format
/// characters, separators other than the ASCII space, private use code points
/// and noncharacters are escaped.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c as u32,
        0xad
            | 0x600..=0x605
            | 0x61c
            | 0x6dd
            | 0x70f
            | 0x890..=0x891
            | 0x8e2
            | 0x180e
            | 0x200b..=0x200f
            | 0x202a..=0x202e
            | 0x2060..=0x2064
            | 0x2066..=0x206f
            | 0xe000..=0xf8ff
            | 0xfdd0..=0xfdef
            | 0xfeff
            | 0xfff9..=0xfffb
            | 0x110bd
            | 0x110cd
            | 0x13430..=0x1343f
            | 0x1bca0..=0x1bca3
            | 0x1d173..=0x1d17a
            | 0xe0001
            | 0xe0020..=0xe007f
            | 0xf0000..=0x10ffff
    ) && (c as u32) & 0xfffe != 0xfffe
}

fn write_blob(f: &mut Formatter<'_>, b: &[u8]) -> fmt::Result {
    let quote = pick_quote(b.contains(&b'\''), b.contains(&b'"'));
    f.write_char('b')?;
    f.write_char(quote)?;
    for &byte in b {
        match byte {
            b'\\' => f.write_str("\\\\")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\t' => f.write_str("\\t")?,
            byte if byte as char == quote => write!(f, "\\{}", quote)?,
            0x20..=0x7e => f.write_char(byte as char)?,
            byte => write!(f, "\\x{:02x}", byte)?,
        }
    }
    f.write_char(quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(values: Vec<Value>) -> String {
        Row::new(values).to_string()
    }

    #[test]
    fn single_column_has_trailing_comma() {
        assert_eq!(render(vec![Value::Integer(1)]), "(1,)");
    }

    #[test]
    fn mixed_columns() {
        let row = render(vec![
            Value::Integer(-7),
            Value::Text("a".into()),
            Value::Null,
            Value::Real(1.5),
        ]);
        assert_eq!(row, "(-7, 'a', None, 1.5)");
    }

    #[test]
    fn text_quoting() {
        assert_eq!(render(vec![Value::Text("it's".into())]), "(\"it's\",)");
        assert_eq!(
            render(vec![Value::Text("'\"".into())]),
            "('\\'\"',)"
        );
        assert_eq!(render(vec![Value::Text("a\nb\\".into())]), "('a\\nb\\\\',)");
        assert_eq!(render(vec![Value::Text("\u{1}é".into())]), "('\\x01é',)");
    }

    #[test]
    fn non_printable_text_is_escaped() {
        assert_eq!(render(vec![Value::Text("a\u{a0}b".into())]), "('a\\xa0b',)");
        assert_eq!(render(vec![Value::Text("\u{200b}".into())]), "('\\u200b',)");
        assert_eq!(render(vec![Value::Text("\u{2028}".into())]), "('\\u2028',)");
        assert_eq!(render(vec![Value::Text("\u{e0001}".into())]), "('\\U000e0001',)");
        assert_eq!(render(vec![Value::Text("héllo 世界 🙂".into())]), "('héllo 世界 🙂',)");
    }

    #[test]
    fn quoted_strings() {
        assert_eq!(Quoted("data.db").to_string(), "'data.db'");
        assert_eq!(Quoted("it's.db").to_string(), "\"it's.db\"");
        assert_eq!(Quoted("C:\\data\\x.db").to_string(), "'C:\\\\data\\\\x.db'");
    }

    #[test]
    fn blobs() {
        assert_eq!(render(vec![Value::Blob(vec![0x00, 0xff, b'A'])]), "(b'\\x00\\xffA',)");
        assert_eq!(render(vec![Value::Blob(vec![])]), "(b'',)");
    }

    #[test]
    fn floats() {
        assert_eq!(float_repr(2.0), "2.0");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(1e20), "1e+20");
        assert_eq!(float_repr(1e-7), "1e-07");
        assert_eq!(float_repr(-2.5e300), "-2.5e+300");
        assert_eq!(float_repr(f64::INFINITY), "inf");
        assert_eq!(float_repr(f64::NAN), "nan");
    }
}
