// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSV rendering and writing of action files

use crate::error::{CompileError, Result};
use crate::schema::{Action, Preamble, Record, Schema, Value};
use serde::Serialize;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Field separator used by the CAD-side readers
pub const SEPARATOR: &str = ", ";

/// Plain decimal, shortest round-trip form, never scientific notation
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // also covers -0
        "0".to_string()
    } else {
        format!("{}", value)
    }
}

/// Quote text that would otherwise be split or stripped on re-read
pub fn quote_text(text: &str) -> Cow<'_, str> {
    let needs_quotes = text.is_empty()
        || text.contains([',', '"', '#'])
        || text.trim() != text;
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(text)
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(v) => format_number(*v),
        Value::Integer(v) => v.to_string(),
        Value::Text(s) => quote_text(s).into_owned(),
    }
}

fn push_line<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(SEPARATOR);
        }
        out.push_str(field.as_ref());
    }
    out.push('\n');
}

/// Lines of a record: the keyed line, then its data rows
pub fn render_record(out: &mut String, record: &Record) {
    let mut fields: Vec<String> = Vec::new();
    if record.emit_key {
        fields.extend(record.key.iter().map(|k| quote_text(k).into_owned()));
    }
    fields.extend(record.values.iter().map(format_value));
    if !fields.is_empty() {
        push_line(out, &fields);
    }
    for row in &record.rows {
        let row: Vec<String> = row.iter().map(format_value).collect();
        push_line(out, &row);
    }
}

/// Full CSV content of an action file
pub fn render_action(action: &Action, schema: &Schema) -> String {
    let mut out = String::new();
    let keyword = action.file_type.keyword();
    let quoted_name = quote_text(&action.location.name);
    let name: &str = &quoted_name;
    let quoted_group = action.location.group().map(quote_text);
    let group: Option<&str> = quoted_group.as_deref();

    match schema.preamble {
        Preamble::Keyword => push_line(&mut out, &[keyword]),
        Preamble::KeywordName => push_line(&mut out, &[keyword, name]),
        Preamble::KeywordNameGroup => match group {
            Some(group) => push_line(&mut out, &[keyword, name, group]),
            None => push_line(&mut out, &[keyword, name]),
        },
        Preamble::KeywordThenName => {
            push_line(&mut out, &[keyword]);
            push_line(&mut out, &[name]);
        }
        Preamble::KeywordThenGroup => {
            push_line(&mut out, &[keyword]);
            push_line(&mut out, &[group.unwrap_or(name)]);
        }
    }
    if schema.unit_line {
        push_line(&mut out, &[action.unit.as_str()]);
    }
    for record in &action.records {
        render_record(&mut out, record);
    }
    out
}

/// Outcome of writing one CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStatus {
    Created,
    Updated,
    Unchanged,
}

/// Write `contents` to `path`, creating parent folders as needed
///
/// Files whose content is already identical are left untouched.
pub fn write_csv(path: &Path, contents: &str) -> Result<WriteStatus> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CompileError::io(parent, e))?;
    }

    let status = match fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => WriteStatus::Unchanged,
        Ok(_) => WriteStatus::Updated,
        Err(_) => WriteStatus::Created,
    };
    if status != WriteStatus::Unchanged {
        let mut file = File::create(path).map_err(|e| CompileError::io(path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| CompileError::io(path, e))?;
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Unit;
    use crate::output::BlockLocation;
    use crate::schema::schema_for;
    use crate::timeline::FileType;
    use tempfile::TempDir;

    fn record(key: &[&str], values: Vec<Value>, rows: Vec<Vec<Value>>, emit_key: bool) -> Record {
        Record {
            key: key.iter().map(|k| k.to_string()).collect(),
            values,
            rows,
            annotations: Vec::new(),
            emit_key,
            line: 1,
        }
    }

    fn location(name: &str, component: &[&str]) -> BlockLocation {
        BlockLocation {
            folder: vec!["out".to_string()],
            name: name.to_string(),
            component: component.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e21), "1000000000000000000000");
        assert_eq!(format_number(1e-7), "0.0000001");
    }

    #[test]
    fn test_quote_text() {
        assert_eq!(quote_text("body"), "body");
        assert_eq!(quote_text("a, b"), "\"a, b\"");
        assert_eq!(quote_text("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_text("#1"), "\"#1\"");
    }

    #[test]
    fn test_render_sketch() {
        let action = Action {
            file_type: FileType::Sketch,
            location: location("c", &[]),
            unit: Unit::Mm,
            records: vec![
                record(&["offset_plane"], vec![Value::from("z"), Value::Number(0.0)], vec![], false),
                record(
                    &["circle"],
                    vec![],
                    vec![vec![Value::Number(0.0), Value::Number(0.0), Value::Number(10.0)]],
                    true,
                ),
            ],
            line: 1,
        };
        let schema = schema_for(FileType::Sketch).unwrap();
        assert_eq!(render_action(&action, schema), "sketch\nmm\nz, 0\ncircle\n0, 0, 10\n");
    }

    #[test]
    fn test_render_preambles() {
        let combine = Action {
            file_type: FileType::Combine,
            location: location("joined", &["assy", "left"]),
            unit: Unit::Cm,
            records: vec![
                record(&["join"], vec![], vec![], true),
                record(&["target_body"], vec![Value::from("a")], vec![], true),
                record(&["tool_bodies"], vec![], vec![vec![Value::from("b")]], true),
            ],
            line: 1,
        };
        let schema = schema_for(FileType::Combine).unwrap();
        assert_eq!(
            render_action(&combine, schema),
            "combine\njoined\njoin\ntarget_body, a\ntool_bodies\nb\n"
        );

        let loft = Action {
            file_type: FileType::Loft,
            location: location("wing", &["assy", "left"]),
            unit: Unit::Mm,
            records: vec![record(
                &["profiles"],
                vec![],
                vec![vec![Value::from("a")], vec![Value::from("b"), Value::Integer(1)]],
                true,
            )],
            line: 1,
        };
        let schema = schema_for(FileType::Loft).unwrap();
        assert_eq!(render_action(&loft, schema), "loft, wing, left\nprofiles\na\nb, 1\n");
    }

    #[test]
    fn test_write_csv_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/a.csv");
        assert_eq!(write_csv(&path, "sketch\n").unwrap(), WriteStatus::Created);
        assert_eq!(write_csv(&path, "sketch\n").unwrap(), WriteStatus::Unchanged);
        assert_eq!(write_csv(&path, "plane\n").unwrap(), WriteStatus::Updated);
        assert_eq!(fs::read_to_string(&path).unwrap(), "plane\n");
    }
}
