// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error taxonomy for timeline compilation

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where in a timeline file something went wrong
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub block: String,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, block: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            block: block.into(),
        }
    }

    /// Location known only by line number, file and block are filled in later
    pub fn at_line(line: usize) -> Self {
        Self {
            line,
            ..Self::default()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = if self.file.is_empty() { "<input>" } else { &self.file };
        write!(f, "{}:{}", file, self.line)?;
        if !self.block.is_empty() {
            write!(f, " in block `{}`", self.block)?;
        }
        Ok(())
    }
}

/// Failure while compiling a timeline
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{location}: malformed line: {message}")]
    MalformedLine { location: Location, message: String },

    #[error("{location}: undefined parameter `{name}`")]
    UndefinedParameter { location: Location, name: String },

    #[error("{location}: invalid expression `{expression}`: {message}")]
    ExpressionSyntax {
        location: Location,
        expression: String,
        message: String,
    },

    #[error("{location}: function `{name}` is not allowed in `{expression}`")]
    DisallowedFunction {
        location: Location,
        name: String,
        expression: String,
    },

    #[error("{location}: {message}")]
    SchemaValidation { location: Location, message: String },

    #[error("output file {} is written by both {first} and {second}", path.display())]
    PathCollision {
        path: PathBuf,
        first: Location,
        second: Location,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub fn schema(location: Location, message: impl Into<String>) -> Self {
        CompileError::SchemaValidation {
            location,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    /// Location of the offending line, if the error has one
    pub fn location(&self) -> Option<&Location> {
        match self {
            CompileError::MalformedLine { location, .. }
            | CompileError::UndefinedParameter { location, .. }
            | CompileError::ExpressionSyntax { location, .. }
            | CompileError::DisallowedFunction { location, .. }
            | CompileError::SchemaValidation { location, .. } => Some(location),
            CompileError::PathCollision { second, .. } => Some(second),
            CompileError::Io { .. } => None,
        }
    }

    /// Attach the input file name to errors raised before it was known
    pub fn in_file(mut self, file: &str) -> Self {
        if let CompileError::MalformedLine { location, .. }
        | CompileError::UndefinedParameter { location, .. }
        | CompileError::ExpressionSyntax { location, .. }
        | CompileError::DisallowedFunction { location, .. }
        | CompileError::SchemaValidation { location, .. } = &mut self
        {
            if location.file.is_empty() {
                location.file = file.to_string();
            }
        }
        self
    }

    /// Short category name used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::MalformedLine { .. } => "MalformedLineError",
            CompileError::UndefinedParameter { .. } => "UndefinedParameterError",
            CompileError::ExpressionSyntax { .. } => "ExpressionSyntaxError",
            CompileError::DisallowedFunction { .. } => "DisallowedFunctionError",
            CompileError::SchemaValidation { .. } => "SchemaValidationError",
            CompileError::PathCollision { .. } => "PathCollisionError",
            CompileError::Io { .. } => "IOError",
        }
    }
}

/// Expression failure before it is tied to a line
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("undefined parameter `{0}`")]
    Undefined(String),

    #[error("{0}")]
    Syntax(String),

    #[error("function `{0}` is not allowed")]
    Disallowed(String),
}

impl ExpressionError {
    /// Tie the failure to the line and field text it came from
    pub fn at(self, location: Location, expression: &str) -> CompileError {
        match self {
            ExpressionError::Undefined(name) => CompileError::UndefinedParameter { location, name },
            ExpressionError::Syntax(message) => CompileError::ExpressionSyntax {
                location,
                expression: expression.to_string(),
                message,
            },
            ExpressionError::Disallowed(name) => CompileError::DisallowedFunction {
                location,
                name,
                expression: expression.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let location = Location::new("design.txt", 12, "sketch circle");
        assert_eq!(location.to_string(), "design.txt:12 in block `sketch circle`");
        assert_eq!(Location::at_line(3).to_string(), "<input>:3");
    }

    #[test]
    fn test_in_file_fills_missing_file() {
        let error = CompileError::MalformedLine {
            location: Location::at_line(4),
            message: "unterminated quote".to_string(),
        }
        .in_file("a.txt");
        assert_eq!(error.location().map(|l| l.file.as_str()), Some("a.txt"));
        assert_eq!(error.kind(), "MalformedLineError");
    }

    #[test]
    fn test_expression_error_mapping() {
        let error = ExpressionError::Disallowed("open".into()).at(Location::at_line(1), "open(1)");
        assert!(matches!(error, CompileError::DisallowedFunction { ref name, .. } if name == "open"));
    }
}
