// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Timeline360 compiler
//!
//! Turns human-written timeline files into the per-action CSV files read by
//! the CAD-side importers. Parameters are evaluated once, every block is
//! checked against its file-type schema, and output paths are tracked so two
//! blocks never write the same file.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod params;
pub mod rails;
pub mod schema;
pub mod timeline;

pub use compiler::{analyze, CompiledFile, Compiler, FileReport, RunReport, WrittenFile};
pub use config::{CompilerConfig, Unit};
pub use error::{CompileError, Location, Result};
pub use params::ParameterTable;
pub use timeline::{parse_timeline, Block, FileType};

use std::path::Path;

/// Compile one timeline file into CSV files below `output_dir`
pub fn compile_file(path: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Result<FileReport> {
    let config = CompilerConfig::with_output_dir(output_dir.as_ref());
    Compiler::new(config).compile_file(path)
}

/// Compile timeline source text into CSV files below `output_dir`
pub fn compile_source(source: &str, output_dir: impl AsRef<Path>) -> Result<FileReport> {
    let config = CompilerConfig::with_output_dir(output_dir.as_ref());
    Compiler::new(config).compile_source("<input>", source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_sketch() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = compile_source(
            "sketch, parts, disc\noffset_plane, z, 0\ncircle\n0, 0, 5\n",
            dir.path(),
        )
        .unwrap();
        assert_eq!(report.written.len(), 1);
        assert!(dir.path().join("parts/disc.csv").exists());
    }
}
