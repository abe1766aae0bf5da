// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Safe evaluation of parsed expressions

use super::expression::{parse_expression, BinaryOp, Expr};
use super::table::ParameterTable;
use crate::error::ExpressionError;
use crate::output::format_number;

/// Functions callable from expressions
pub const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "sqrt", "degrees", "radians", "fabs",
    "abs", "power", "pow", "exp", "log", "log10", "floor", "ceil", "hypot",
];

/// Named constants available everywhere
pub const CONSTANTS: &[(&str, f64)] = &[
    ("pi", std::f64::consts::PI),
    ("e", std::f64::consts::E),
    ("tau", std::f64::consts::TAU),
];

/// How bare identifiers resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BareNames {
    /// Inside a parameters block: constants, then defined parameters
    Parameters,
    /// In action fields: constants only, parameters need `$`
    ConstantsOnly,
}

pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

/// Expression evaluator bound to a parameter table
pub struct Evaluator<'a> {
    table: &'a ParameterTable,
    bare_names: BareNames,
}

impl<'a> Evaluator<'a> {
    pub fn new(table: &'a ParameterTable, bare_names: BareNames) -> Self {
        Self { table, bare_names }
    }

    /// Parse and evaluate source text, rejecting non-finite results
    pub fn evaluate_str(&self, source: &str) -> Result<f64, ExpressionError> {
        let expr = parse_expression(source)?;
        let value = self.evaluate(&expr)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ExpressionError::Syntax(format!(
                "does not evaluate to a finite number ({})",
                value
            )))
        }
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<f64, ExpressionError> {
        match expr {
            Expr::Number(v) => Ok(*v),
            Expr::Parameter(name) => self
                .table
                .get(name)
                .ok_or_else(|| ExpressionError::Undefined(name.clone())),
            Expr::Identifier(name) => {
                if let Some(value) = constant(name) {
                    return Ok(value);
                }
                match self.bare_names {
                    BareNames::Parameters => self.table.get(name),
                    BareNames::ConstantsOnly => None,
                }
                .ok_or_else(|| ExpressionError::Undefined(name.clone()))
            }
            Expr::Neg(inner) => Ok(-self.evaluate(inner)?),
            Expr::Binary { op, lhs, rhs } => {
                let a = self.evaluate(lhs)?;
                let b = self.evaluate(rhs)?;
                Ok(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                })
            }
            Expr::Call { name, args } => {
                if !is_function(name) {
                    return Err(ExpressionError::Disallowed(name.clone()));
                }
                let args = args
                    .iter()
                    .map(|a| self.evaluate(a))
                    .collect::<Result<Vec<_>, _>>()?;
                call(name, &args)
            }
        }
    }

    /// Replace `$name` references in literal text with formatted values
    pub fn substitute(&self, text: &str) -> Result<String, ExpressionError> {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find('$') {
            result.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let starts_name = after
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
            let end = if starts_name {
                after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len())
            } else {
                0
            };
            let name = &after[..end];
            if name.is_empty() {
                // `$5`, `$ 5` and a trailing `$` are literal
                result.push('$');
            } else {
                let value = self
                    .table
                    .get(name)
                    .ok_or_else(|| ExpressionError::Undefined(name.to_string()))?;
                result.push_str(&format_number(value));
            }
            rest = &after[end..];
        }
        result.push_str(rest);
        Ok(result)
    }
}

fn call(name: &str, args: &[f64]) -> Result<f64, ExpressionError> {
    let value = match (name, args) {
        ("sin", [x]) => x.sin(),
        ("cos", [x]) => x.cos(),
        ("tan", [x]) => x.tan(),
        ("asin", [x]) => x.asin(),
        ("acos", [x]) => x.acos(),
        ("atan", [x]) => x.atan(),
        ("atan2", [y, x]) => y.atan2(*x),
        ("sqrt", [x]) => x.sqrt(),
        ("degrees", [x]) => x.to_degrees(),
        ("radians", [x]) => x.to_radians(),
        ("fabs" | "abs", [x]) => x.abs(),
        ("power" | "pow", [x, y]) => x.powf(*y),
        ("exp", [x]) => x.exp(),
        ("log", [x]) => x.ln(),
        ("log", [x, base]) => x.ln() / base.ln(),
        ("log10", [x]) => x.log10(),
        ("floor", [x]) => x.floor(),
        ("ceil", [x]) => x.ceil(),
        ("hypot", [x, y]) => x.hypot(*y),
        _ => {
            return Err(ExpressionError::Syntax(format!(
                "wrong number of arguments for `{}`: {}",
                name,
                args.len()
            )))
        }
    };
    Ok(value)
}

/// Evaluate an action field against a table, parameters referenced as `$name`
pub fn evaluate(source: &str, table: &ParameterTable) -> Result<f64, ExpressionError> {
    Evaluator::new(table, BareNames::ConstantsOnly).evaluate_str(source)
}
