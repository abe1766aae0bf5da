// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Typed fields and their conversion from source text

use crate::error::{CompileError, Location, Result};
use crate::params::Evaluator;
use crate::timeline::Field;
use serde::Serialize;
use std::fmt;

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Routed through the expression evaluator
    Number,
    /// Evaluated, must be a whole number
    Integer,
    /// Literal text, `$name` references substituted
    Text,
    /// Literal text restricted to a fixed set of words
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

pub const fn number(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Number,
    }
}

pub const fn integer(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Integer,
    }
}

pub const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
    }
}

pub const fn choice(name: &'static str, words: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Choice(words),
    }
}

/// Field layout of a line: required, then optional, then a repeated tail
#[derive(Debug, Clone, Copy)]
pub struct Fields {
    pub required: &'static [FieldSpec],
    pub optional: &'static [FieldSpec],
    pub repeat: Option<(FieldSpec, usize)>,
}

impl Fields {
    pub const NONE: Fields = Fields::fixed(&[]);

    pub const fn fixed(required: &'static [FieldSpec]) -> Self {
        Self {
            required,
            optional: &[],
            repeat: None,
        }
    }

    pub const fn optional(required: &'static [FieldSpec], optional: &'static [FieldSpec]) -> Self {
        Self {
            required,
            optional,
            repeat: None,
        }
    }

    /// `field` repeated at least `min` times after `required`
    pub const fn repeated(required: &'static [FieldSpec], field: FieldSpec, min: usize) -> Self {
        Self {
            required,
            optional: &[],
            repeat: Some((field, min)),
        }
    }

    pub fn min_len(&self) -> usize {
        self.required.len() + self.repeat.map(|(_, min)| min).unwrap_or(0)
    }

    pub fn max_len(&self) -> Option<usize> {
        match self.repeat {
            Some(_) => None,
            None => Some(self.required.len() + self.optional.len()),
        }
    }

    pub fn spec(&self, index: usize) -> Option<FieldSpec> {
        let optional_end = self.required.len() + self.optional.len();
        if index < self.required.len() {
            Some(self.required[index])
        } else if index < optional_end {
            Some(self.optional[index - self.required.len()])
        } else {
            self.repeat.map(|(field, _)| field)
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_len() && self.max_len().map_or(true, |max| count <= max)
    }

    /// Human readable arity, e.g. `2 to 4 fields`
    pub fn arity(&self) -> String {
        let min = self.min_len();
        match self.max_len() {
            Some(max) if max == min => plural(min, "field"),
            Some(max) => format!("{} to {} fields", min, max),
            None => format!("at least {}", plural(min, "field")),
        }
    }

    /// Convert source fields to typed values
    pub fn convert(
        &self,
        fields: &[Field],
        evaluator: &Evaluator,
        location: &Location,
    ) -> Result<Vec<Value>> {
        fields
            .iter()
            .enumerate()
            .map(|(i, field)| match self.spec(i) {
                Some(spec) => spec.convert(field, evaluator, location),
                None => Err(CompileError::schema(
                    location.clone(),
                    format!("unexpected field {} `{}`", i + 1, field.text),
                )),
            })
            .collect()
    }
}

pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

impl FieldSpec {
    pub fn convert(&self, field: &Field, evaluator: &Evaluator, location: &Location) -> Result<Value> {
        match self.kind {
            FieldKind::Number => evaluator
                .evaluate_str(&field.text)
                .map(Value::Number)
                .map_err(|e| e.at(location.clone(), &field.text)),
            FieldKind::Integer => {
                let value = evaluator
                    .evaluate_str(&field.text)
                    .map_err(|e| e.at(location.clone(), &field.text))?;
                if value.fract() != 0.0 {
                    return Err(CompileError::schema(
                        location.clone(),
                        format!("`{}` must be a whole number, got {}", self.name, value),
                    ));
                }
                // i64::MAX as f64 rounds up to 2^63
                if value < i64::MIN as f64 || value >= i64::MAX as f64 {
                    return Err(CompileError::schema(
                        location.clone(),
                        format!("`{}` is out of integer range, got {}", self.name, field.text),
                    ));
                }
                Ok(Value::Integer(value as i64))
            }
            FieldKind::Text => evaluator
                .substitute(&field.text)
                .map(Value::Text)
                .map_err(|e| e.at(location.clone(), &field.text)),
            FieldKind::Choice(words) => {
                let word = evaluator
                    .substitute(&field.text)
                    .map_err(|e| e.at(location.clone(), &field.text))?;
                if words.contains(&word.as_str()) {
                    Ok(Value::Text(word))
                } else {
                    Err(CompileError::schema(
                        location.clone(),
                        format!(
                            "invalid {} `{}`, expected one of: {}",
                            self.name,
                            word,
                            words.join(", ")
                        ),
                    ))
                }
            }
        }
    }
}

/// A validated field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => f.write_str(&crate::output::format_number(*v)),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
        }
    }
}
