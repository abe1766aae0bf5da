// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Line and field tokenization of timeline files

use crate::error::{CompileError, Location, Result};
use serde::Serialize;
use std::iter::Enumerate;
use std::str::Lines;

/// One comma separated field, trimmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub text: String,
    /// Field was written between double quotes
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub quoted: bool,
}

impl Field {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }
}

/// A non-empty line of a timeline file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    /// 1-based line number in the source file
    pub number: usize,
    pub fields: Vec<Field>,
}

impl Line {
    /// First field, used to recognize keywords and line kinds
    pub fn keyword(&self) -> &str {
        self.fields.first().map(|f| f.text.as_str()).unwrap_or("")
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|f| f.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields joined back together, for diagnostics
    pub fn joined(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lazy tokenizer over the lines of a timeline source
///
/// Blank and comment-only lines are skipped, so every yielded line carries at
/// least one field.
pub struct Tokenizer<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().enumerate(),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, raw) in self.lines.by_ref() {
            let number = index + 1;
            match split_line(raw) {
                Ok(fields) if fields.is_empty() => continue,
                Ok(fields) => return Some(Ok(Line { number, fields })),
                Err(message) => {
                    return Some(Err(CompileError::MalformedLine {
                        location: Location::at_line(number),
                        message,
                    }))
                }
            }
        }
        None
    }
}

/// Split one raw line into trimmed fields
///
/// A `#` outside quotes ends the line. Returns an empty vector for blank and
/// comment-only lines.
pub fn split_line(raw: &str) -> std::result::Result<Vec<Field>, String> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut closed = false;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            '#' => break,
            ',' => {
                fields.push(finish_field(&current, quoted));
                current.clear();
                quoted = false;
                closed = false;
            }
            '"' if !quoted && current.trim().is_empty() => {
                current.clear();
                quoted = true;
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.clone().next() == Some('"') {
                                chars.next();
                                current.push('"');
                            } else {
                                closed = true;
                                break;
                            }
                        }
                        Some(other) => current.push(other),
                        None => return Err(format!("unterminated quote in field {}", fields.len() + 1)),
                    }
                }
            }
            '"' => return Err(format!("unexpected quote in field {}", fields.len() + 1)),
            c if closed => {
                if !c.is_whitespace() {
                    return Err(format!("text after closing quote in field {}", fields.len() + 1));
                }
            }
            c => current.push(c),
        }
    }
    fields.push(finish_field(&current, quoted));

    if fields.iter().all(|f| f.text.is_empty() && !f.quoted) {
        if fields.len() > 1 {
            return Err("line contains only separators".to_string());
        }
        return Ok(Vec::new());
    }
    if let Some(position) = fields.iter().position(|f| f.text.is_empty() && !f.quoted) {
        return Err(format!("empty field {}", position + 1));
    }
    Ok(fields)
}

fn finish_field(current: &str, quoted: bool) -> Field {
    Field {
        text: if quoted {
            current.to_string()
        } else {
            current.trim().to_string()
        },
        quoted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(raw: &str) -> Vec<String> {
        split_line(raw)
            .unwrap()
            .into_iter()
            .map(|f| f.text)
            .collect()
    }

    #[test]
    fn test_split_trims_fields() {
        assert_eq!(texts("  circle ,0,  0 , $r  "), vec!["circle", "0", "0", "$r"]);
    }

    #[test]
    fn test_comments_are_stripped() {
        assert!(split_line("# whole line comment").unwrap().is_empty());
        assert!(split_line("   ").unwrap().is_empty());
        assert_eq!(texts("r, 10  # radius"), vec!["r", "10"]);
    }

    #[test]
    fn test_quoted_fields() {
        let fields = split_line(r#"echo, "a, b # c", "say ""hi""""#).unwrap();
        assert_eq!(fields[1].text, "a, b # c");
        assert!(fields[1].quoted);
        assert_eq!(fields[2].text, r#"say "hi""#);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(split_line(r#"echo, "open"#).is_err());
        assert!(split_line("a, , b").is_err());
        assert!(split_line("a, b,").is_err());
        assert!(split_line(",,").is_err());
        assert!(split_line(r#"a, "b" c"#).is_err());
        assert!(split_line(r#"a, b"c"#).is_err());
    }

    #[test]
    fn test_tokenizer_keeps_line_numbers() {
        let source = "# header\n\nparameters\n  r, 10\n";
        let lines: Vec<Line> = Tokenizer::new(source).collect::<Result<_>>().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 3);
        assert_eq!(lines[1].number, 4);
        assert_eq!(lines[1].keyword(), "r");
    }

    #[test]
    fn test_tokenizer_reports_malformed_line() {
        let mut tokens = Tokenizer::new("sketch, a, b\nline,,\n");
        assert!(tokens.next().unwrap().is_ok());
        match tokens.next().unwrap() {
            Err(CompileError::MalformedLine { location, .. }) => assert_eq!(location.line, 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
