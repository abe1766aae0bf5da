// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Validation of block bodies against their schema

use super::fields::{plural, Value};
use super::registry::{LineSpec, RowSpec, Schema};
use crate::error::{CompileError, Location, Result};
use crate::params::Evaluator;
use crate::timeline::{Block, Field, Line};
use serde::Serialize;

const CO_RAIL: &str = "co_rail";
const CROSS_RAILS: &str = "cross_rails";

/// Rail membership declared on a sketch segment line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "names", rename_all = "snake_case")]
pub enum Annotation {
    CoRail(String),
    CrossRails(Vec<String>),
}

/// One validated line of a block with the data rows it owns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub key: Vec<String>,
    pub values: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Vec<Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(skip)]
    pub emit_key: bool,
    pub line: usize,
}

impl Record {
    /// First key word, e.g. `spline` or `extent_type`
    pub fn kind(&self) -> &str {
        self.key.first().map(String::as_str).unwrap_or("")
    }

    pub fn co_rail(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::CoRail(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn on_cross_rail(&self, rail: &str) -> bool {
        self.annotations.iter().any(|a| match a {
            Annotation::CrossRails(names) => names.iter().any(|n| n == rail),
            _ => false,
        })
    }
}

/// Validate and convert the body lines of `block`
///
/// Numeric fields go through `evaluator`; literal fields pass through with
/// `$name` substitution.
pub fn validate_body(
    block: &Block,
    schema: &Schema,
    evaluator: &Evaluator,
    file: &str,
) -> Result<Vec<Record>> {
    let label = block.label();
    let at = |line: usize| Location::new(file, line, label.clone());

    let mut records: Vec<Record> = Vec::new();
    let mut slot_counts = vec![0usize; schema.slots.len()];
    let mut last_slot: Option<usize> = None;
    let mut open_rows: Option<RowSpec> = schema.leading_rows;

    if schema.leading_rows.is_some() {
        records.push(Record {
            key: Vec::new(),
            values: Vec::new(),
            rows: Vec::new(),
            annotations: Vec::new(),
            emit_key: false,
            line: block.line(),
        });
    }

    for line in &block.body {
        if let Some((slot_index, kind)) = schema.line_kind(line) {
            if let Some(record) = records.last() {
                check_row_count(record, open_rows, at(record.line))?;
            }

            let slot = &schema.slots[slot_index];
            if slot_counts[slot_index] > 0 && !slot.occurs.repeatable() {
                return Err(CompileError::schema(
                    at(line.number),
                    format!("duplicate `{}` line", slot.name),
                ));
            }
            if schema.ordered && last_slot.map_or(false, |last| slot_index < last) {
                let previous = last_slot.map(|i| schema.slots[i].name).unwrap_or("");
                return Err(CompileError::schema(
                    at(line.number),
                    format!("`{}` line must come before `{}`", slot.name, previous),
                ));
            }
            slot_counts[slot_index] += 1;
            last_slot = Some(slot_index);

            records.push(parse_line(kind, line, evaluator, at(line.number))?);
            open_rows = kind.rows;
            continue;
        }

        match (open_rows, records.last_mut()) {
            (Some(rows), Some(record)) => {
                if rows.max.map_or(false, |max| record.rows.len() >= max) {
                    return Err(CompileError::schema(
                        at(line.number),
                        format!(
                            "too many rows for {}, expected {}",
                            describe(record),
                            rows.expected()
                        ),
                    ));
                }
                if !rows.fields.accepts(line.len()) {
                    return Err(CompileError::schema(
                        at(line.number),
                        format!(
                            "row of {} expects {}, found {}",
                            describe(record),
                            rows.fields.arity(),
                            line.len()
                        ),
                    ));
                }
                let values = rows.fields.convert(&line.fields, evaluator, &at(line.number))?;
                record.rows.push(values);
            }
            _ => {
                return Err(CompileError::schema(
                    at(line.number),
                    format!(
                        "unexpected line `{}`, expected one of: {}",
                        line.joined(),
                        schema.expected_keys()
                    ),
                ))
            }
        }
    }

    if let Some(record) = records.last() {
        check_row_count(record, open_rows, at(record.line))?;
    }

    for (slot, count) in schema.slots.iter().zip(&slot_counts) {
        if !slot.occurs.allows(*count) {
            let kinds: Vec<String> = slot.kinds.iter().map(LineSpec::name).collect();
            return Err(CompileError::schema(
                at(block.line()),
                format!("missing `{}` line", kinds.join("` or `")),
            ));
        }
    }

    Ok(records)
}

fn describe(record: &Record) -> String {
    if record.key.is_empty() {
        "the block".to_string()
    } else {
        format!("`{}`", record.key.join(", "))
    }
}

fn check_row_count(record: &Record, rows: Option<RowSpec>, location: Location) -> Result<()> {
    match rows {
        Some(rows) if !rows.accepts(record.rows.len()) => Err(CompileError::schema(
            location,
            format!(
                "{} expects {}, found {}",
                describe(record),
                rows.expected(),
                record.rows.len()
            ),
        )),
        _ => Ok(()),
    }
}

fn parse_line(kind: &LineSpec, line: &Line, evaluator: &Evaluator, location: Location) -> Result<Record> {
    let mut fields: &[Field] = &line.fields[kind.key.len()..];
    let mut annotations = Vec::new();

    if kind.rail_annotations {
        if let Some(position) = fields
            .iter()
            .position(|f| !f.quoted && (f.text == CO_RAIL || f.text == CROSS_RAILS))
        {
            annotations = parse_annotations(&fields[position..], evaluator, &location)?;
            fields = &fields[..position];
        }
    }

    if !kind.fields.accepts(fields.len()) {
        return Err(CompileError::schema(
            location,
            format!(
                "`{}` expects {} after the key, found {}",
                kind.name(),
                kind.fields.arity(),
                fields.len()
            ),
        ));
    }

    let values = kind.fields.convert(fields, evaluator, &location)?;
    Ok(Record {
        key: kind.key.iter().map(|k| k.to_string()).collect(),
        values,
        rows: Vec::new(),
        annotations,
        emit_key: kind.emit_key,
        line: line.number,
    })
}

fn parse_annotations(fields: &[Field], evaluator: &Evaluator, location: &Location) -> Result<Vec<Annotation>> {
    let mut annotations = Vec::new();
    let mut index = 0;
    while index < fields.len() {
        let rail_type = fields[index].text.as_str();
        let names_end = fields[index + 1..]
            .iter()
            .position(|f| !f.quoted && (f.text == CO_RAIL || f.text == CROSS_RAILS))
            .map_or(fields.len(), |p| index + 1 + p);
        let names = fields[index + 1..names_end]
            .iter()
            .map(|f| {
                evaluator
                    .substitute(&f.text)
                    .map_err(|e| e.at(location.clone(), &f.text))
            })
            .collect::<Result<Vec<_>>>()?;

        let annotation = match (rail_type, names.len()) {
            (CO_RAIL, 1) => names.into_iter().next().map(Annotation::CoRail),
            (CROSS_RAILS, n) if n > 0 => Some(Annotation::CrossRails(names)),
            _ => None,
        };
        match annotation {
            Some(annotation) => annotations.push(annotation),
            None => {
                let expected = if rail_type == CO_RAIL { "1 rail name" } else { "at least 1 rail name" };
                return Err(CompileError::schema(
                    location.clone(),
                    format!(
                        "`{}` expects {}, found {}",
                        rail_type,
                        expected,
                        plural(names_end - index - 1, "name")
                    ),
                ));
            }
        }
        index = names_end;
    }
    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BareNames, ParameterTable};
    use crate::schema::schema_for;
    use crate::timeline::{parse_timeline, FileType};

    fn validate(source: &str) -> Result<Vec<Record>> {
        let mut table = ParameterTable::new();
        table.define("r", "10", &Location::at_line(0)).unwrap();
        let evaluator = Evaluator::new(&table, BareNames::ConstantsOnly);
        let blocks = parse_timeline(source).unwrap();
        let schema = schema_for(blocks[0].file_type).unwrap();
        validate_body(&blocks[0], schema, &evaluator, "test.txt")
    }

    fn message(error: CompileError) -> String {
        match error {
            CompileError::SchemaValidation { message, .. } => message,
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_sketch_circle() {
        let records = validate("sketch, out, c\noffset_plane, z, 0\ncircle\n0, 0, $r\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].values, vec![Value::from("z"), Value::Number(0.0)]);
        assert!(!records[0].emit_key);
        assert_eq!(records[1].kind(), "circle");
        assert_eq!(records[1].rows, vec![vec![Value::Number(0.0), Value::Number(0.0), Value::Number(10.0)]]);
    }

    #[test]
    fn test_quoted_row_is_not_a_key() {
        let records = validate("loft, out, skin\nprofiles\na\n\"rails\"\nrails\nguide\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rows, vec![vec![Value::from("a")], vec![Value::from("rails")]]);
        assert_eq!(records[1].kind(), "rails");
        assert_eq!(records[1].rows, vec![vec![Value::from("guide")]]);

        let error = validate("loft, out, skin\nprofiles\na\nrails\nguide\n").unwrap_err();
        assert!(message(error).contains("expects at least 2 rows, found 1"));
    }

    #[test]
    fn test_spline_rows_keep_their_width() {
        let records =
            validate("sketch, out, s\noffset_plane, x, 5\nspline\n0, 0\n10, 5, 45, 2\n20, 0, 30\n").unwrap();
        let widths: Vec<usize> = records[1].rows.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![2, 4, 3]);
    }

    #[test]
    fn test_row_arity_mismatch() {
        let error = validate("sketch, out, s\noffset_plane, z, 0\nline\n0, 0, 1, 2, 3\n1, 1\n").unwrap_err();
        assert!(message(error).contains("expects 2 fields, found 5"));
    }

    #[test]
    fn test_row_count_limits() {
        let error = validate("sketch, out, s\noffset_plane, z, 0\narc\n0, 0\n1, 1\n").unwrap_err();
        assert!(message(error).contains("expects 3 rows, found 2"));
        let error = validate("sketch, out, s\noffset_plane, z, 0\narc\n0, 0\n1, 1\n2, 0\n3, 3\n").unwrap_err();
        assert!(message(error).contains("too many rows"));
    }

    #[test]
    fn test_rail_annotations() {
        let records = validate(
            "sketch, out, s\noffset_plane, z, 0\nspline, co_rail, top, cross_rails, a, b\n0, 0\n1, 1\n",
        )
        .unwrap();
        assert!(records[1].values.is_empty());
        assert_eq!(records[1].co_rail(), Some("top"));
        assert!(records[1].on_cross_rail("b"));
        assert!(!records[1].on_cross_rail("top"));

        let error = validate("sketch, out, s\noffset_plane, z, 0\nline, co_rail\n0, 0\n1, 1\n").unwrap_err();
        assert!(message(error).contains("co_rail"));
    }

    #[test]
    fn test_missing_and_duplicate_lines() {
        let error = validate("combine, out, c\njoin\ntool_bodies\nb\n").unwrap_err();
        assert!(message(error).contains("missing `target_body`"));

        let error = validate("combine, out, c\njoin\ncut\ntarget_body, a\ntool_bodies\nb\n").unwrap_err();
        assert!(message(error).contains("duplicate `operation`"));
    }

    #[test]
    fn test_ordering() {
        let error = validate("sketch, out, s\nline\n0, 0\n1, 1\noffset_plane, z, 0\n").unwrap_err();
        assert!(message(error).contains("must come before"));
    }

    #[test]
    fn test_unknown_line() {
        let error = validate("loft, out, l\nprofile\na\nb\n").unwrap_err();
        assert!(message(error).contains("unexpected line `profile`"));
    }

    #[test]
    fn test_plane_leading_rows() {
        let records = validate("plane, out, p\n0, 0, $r\n1, 0, $r\n0, 1, $r\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rows.len(), 3);
        assert!(validate("plane, out, p\n0, 0, 0\n1, 0, 0\n").is_err());
    }

    #[test]
    fn test_extrude() {
        let source = "extrude, out, e\nprofile, s, 0, 1\noffset, 0\ntaper_angle, 0\n\
                      extent_type, distance, $r * 2\noperation, new_body\nextrude_results, body_a\n";
        let records = validate(source).unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].values, vec![Value::from("s"), Value::Integer(0), Value::Integer(1)]);
        assert_eq!(records[3].key, vec!["extent_type", "distance"]);
        assert_eq!(records[3].values, vec![Value::Number(20.0)]);
        assert_eq!(schema_for(FileType::Extrude).map(|s| s.unit_line), Some(true));
    }
}
