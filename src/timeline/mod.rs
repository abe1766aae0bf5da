// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Timeline file reading: tokenizer and block grouping

pub mod block;
pub mod tokenizer;

pub use block::{Block, BlockReader, FileType};
pub use tokenizer::{split_line, Field, Line, Tokenizer};

use crate::error::{CompileError, Result};
use std::fs;
use std::path::Path;

/// Tokenize and group a timeline source into blocks
pub fn parse_timeline(source: &str) -> Result<Vec<Block>> {
    BlockReader::new(Tokenizer::new(source)).collect()
}

/// Read a timeline file from disk
pub fn read_timeline_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| CompileError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_timeline_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "parameters\nr, 10").unwrap();

        let source = read_timeline_file(file.path()).unwrap();
        let blocks = parse_timeline(&source).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body[0].text(1), Some("10"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let error = read_timeline_file("/nonexistent/timeline.txt").unwrap_err();
        assert!(matches!(error, CompileError::Io { .. }));
    }
}
