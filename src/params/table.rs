// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ordered, write-once parameter table

use super::evaluator::{constant, is_function, BareNames, Evaluator};
use crate::error::{CompileError, Location, Result};
use indexmap::IndexMap;
use serde::Serialize;

/// A named value defined in a parameters block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    pub expression: String,
    pub line: usize,
}

/// Parameters in definition order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ParameterTable {
    parameters: IndexMap<String, Parameter>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).map(|p| p.value)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Evaluate `expression` and bind it to `name`
    ///
    /// The expression may use earlier parameters by bare name or as `$name`.
    /// Names are write-once.
    pub fn define(&mut self, name: &str, expression: &str, location: &Location) -> Result<f64> {
        validate_name(name).map_err(|message| CompileError::schema(location.clone(), message))?;
        if let Some(existing) = self.parameters.get(name) {
            return Err(CompileError::schema(
                location.clone(),
                format!(
                    "parameter `{}` is already defined on line {}",
                    name, existing.line
                ),
            ));
        }

        let value = Evaluator::new(self, BareNames::Parameters)
            .evaluate_str(expression)
            .map_err(|e| e.at(location.clone(), expression))?;

        tracing::debug!(name, value, "defined parameter");
        self.parameters.insert(
            name.to_string(),
            Parameter {
                name: name.to_string(),
                value,
                expression: expression.to_string(),
                line: location.line,
            },
        );
        Ok(value)
    }
}

/// Check that `name` is usable as a parameter name
pub fn validate_name(name: &str) -> std::result::Result<(), String> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!(
            "invalid parameter name `{}`, use letters, digits and `_`",
            name
        ));
    }
    if name.contains("__") {
        return Err(format!("parameter name `{}` must not contain `__`", name));
    }
    if is_function(name) || constant(name).is_some() {
        return Err(format!(
            "parameter name `{}` is reserved for a math function or constant",
            name
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize) -> Location {
        Location::new("t.txt", line, "parameters")
    }

    #[test]
    fn test_chained_definitions() {
        let mut table = ParameterTable::new();
        table.define("a", "2", &at(1)).unwrap();
        assert_eq!(table.define("b", "a*3+1", &at(2)).unwrap(), 7.0);
        assert_eq!(table.define("c", "$b - a", &at(3)).unwrap(), 5.0);

        let names: Vec<&str> = table.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(table.parameter("b").map(|p| p.expression.as_str()), Some("a*3+1"));
    }

    #[test]
    fn test_forward_reference_is_undefined() {
        let mut table = ParameterTable::new();
        let error = table.define("a", "b + 1", &at(1)).unwrap_err();
        assert!(matches!(error, CompileError::UndefinedParameter { ref name, .. } if name == "b"));
    }

    #[test]
    fn test_redefinition_rejected() {
        let mut table = ParameterTable::new();
        table.define("a", "1", &at(1)).unwrap();
        let error = table.define("a", "2", &at(5)).unwrap_err();
        assert!(matches!(error, CompileError::SchemaValidation { .. }));
        assert_eq!(table.get("a"), Some(1.0));
    }

    #[test]
    fn test_invalid_names() {
        for name in ["1a", "a-b", "a__b", "sin", "pi", "", "a b"] {
            assert!(validate_name(name).is_err(), "{}", name);
        }
        for name in ["a", "_a", "width_2", "Height"] {
            assert!(validate_name(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_failed_definition_leaves_table_unchanged() {
        let mut table = ParameterTable::new();
        assert!(table.define("x", "1/0", &at(1)).is_err());
        assert!(table.is_empty());
    }
}
