// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Timeline compiler: validation of a whole file, then CSV emission

use crate::config::{CompilerConfig, Unit};
use crate::error::{CompileError, Location, Result};
use crate::output::{
    action_file_name, render_action, sketch_file_name, write_csv, BlockLocation, OutputRegistry,
    WriteStatus,
};
use crate::params::{BareNames, Evaluator, ParameterTable};
use crate::rails::{co_rail_sketches, rail_location, CrossRails, RailSketch};
use crate::schema::{schema_for, validate_body, Action};
use crate::timeline::{parse_timeline, read_timeline_file, Block, FileType};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Validated content of one timeline file; nothing written yet
#[derive(Debug, Clone, Serialize)]
pub struct CompiledFile {
    pub file: String,
    pub parameters: ParameterTable,
    pub actions: Vec<Action>,
    #[serde(skip)]
    pub cross_rails: Vec<(CrossRails, Unit)>,
    pub echoes: Vec<String>,
}

impl CompiledFile {
    fn sketches(&self) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.file_type == FileType::Sketch)
            .collect()
    }
}

/// A CSV file produced by the compiler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub file_type: FileType,
    /// Header line of the block that produced the file
    pub line: usize,
    pub status: WriteStatus,
}

/// Result of compiling one timeline file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub written: Vec<WrittenFile>,
    pub echoes: Vec<String>,
    pub parameters: ParameterTable,
}

/// Result of compiling all timeline files of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub output_dir: PathBuf,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn total_written(&self) -> usize {
        self.files.iter().map(|f| f.written.len()).sum()
    }

    pub fn total_changed(&self) -> usize {
        self.files
            .iter()
            .flat_map(|f| f.written.iter())
            .filter(|w| w.status != WriteStatus::Unchanged)
            .count()
    }
}

/// Parse and validate a timeline source without writing anything
///
/// Parameters are scoped to `source`; a `units` block changes the unit of
/// the action blocks that follow it.
pub fn analyze(file: &str, source: &str, default_unit: Unit) -> Result<CompiledFile> {
    let blocks = parse_timeline(source).map_err(|e| e.in_file(file))?;

    let mut compiled = CompiledFile {
        file: file.to_string(),
        parameters: ParameterTable::new(),
        actions: Vec::new(),
        cross_rails: Vec::new(),
        echoes: Vec::new(),
    };
    let mut unit = default_unit;

    for block in &blocks {
        debug!(file, line = block.line(), block = %block.label(), "validating block");
        match block.file_type {
            FileType::Parameters => define_parameters(block, &mut compiled.parameters, file)?,
            FileType::Units => unit = read_units(block, &compiled.parameters, file)?,
            FileType::Echo => {
                let message = read_echo(block, &compiled.parameters, file)?;
                if message.trim().is_empty() {
                    warn!(file, line = block.line(), "empty echo");
                } else {
                    info!(file, line = block.line(), "echo: {}", message);
                }
                compiled.echoes.push(message);
            }
            FileType::CrossRails => {
                let evaluator = Evaluator::new(&compiled.parameters, BareNames::ConstantsOnly);
                let rails = CrossRails::from_block(block, &evaluator, file)?;
                compiled.cross_rails.push((rails, unit));
            }
            _ => {
                let action = build_action(block, &compiled.parameters, unit, file)?;
                compiled.actions.push(action);
            }
        }
    }

    Ok(compiled)
}

fn expect_empty_body(block: &Block, file: &str) -> Result<()> {
    match block.body.first() {
        Some(line) => Err(CompileError::schema(
            block.location(file, line.number),
            format!("unexpected line `{}` in `{}` block", line.joined(), block.file_type),
        )),
        None => Ok(()),
    }
}

fn define_parameters(block: &Block, table: &mut ParameterTable, file: &str) -> Result<()> {
    if block.header.len() != 1 {
        return Err(CompileError::schema(
            block.location(file, block.line()),
            "`parameters` takes no fields, definitions follow on the next lines",
        ));
    }
    for line in &block.body {
        let location = block.location(file, line.number);
        match line.fields.as_slice() {
            [name, expression] => {
                table.define(&name.text, &expression.text, &location)?;
            }
            fields => {
                return Err(CompileError::schema(
                    location,
                    format!(
                        "parameter line expects `name, expression`, found {} fields \
                         (quote expressions that contain commas)",
                        fields.len()
                    ),
                ))
            }
        }
    }
    Ok(())
}

fn read_units(block: &Block, table: &ParameterTable, file: &str) -> Result<Unit> {
    let location = block.location(file, block.line());
    expect_empty_body(block, file)?;
    if block.header.len() != 2 {
        return Err(CompileError::schema(location, "`units` expects `units, <mm|cm|m>`"));
    }
    let text = block.header.text(1).unwrap_or("");
    let unit = Evaluator::new(table, BareNames::ConstantsOnly)
        .substitute(text)
        .map_err(|e| e.at(location.clone(), text))?;
    unit.parse().map_err(|message: String| CompileError::schema(location, message))
}

fn read_echo(block: &Block, table: &ParameterTable, file: &str) -> Result<String> {
    expect_empty_body(block, file)?;
    let location = block.location(file, block.line());
    let evaluator = Evaluator::new(table, BareNames::ConstantsOnly);
    let parts = block.header.fields[1..]
        .iter()
        .map(|f| evaluator.substitute(&f.text).map_err(|e| e.at(location.clone(), &f.text)))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(", "))
}

fn build_action(block: &Block, table: &ParameterTable, unit: Unit, file: &str) -> Result<Action> {
    let location = block.location(file, block.line());
    let schema = schema_for(block.file_type).ok_or_else(|| {
        CompileError::schema(location.clone(), format!("no schema for `{}`", block.file_type))
    })?;
    let evaluator = Evaluator::new(table, BareNames::ConstantsOnly);
    let destination = BlockLocation::from_header(&block.header, &evaluator, &location)?;
    let records = validate_body(block, schema, &evaluator, file)?;

    Ok(Action {
        file_type: block.file_type,
        location: destination,
        unit,
        records,
        line: block.line(),
    })
}

/// Compiles timeline files into CSV action files below one output root
///
/// Output paths are tracked across every file compiled by the same compiler,
/// so two blocks writing the same file fail with a path collision.
pub struct Compiler {
    config: CompilerConfig,
    registry: OutputRegistry,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            registry: OutputRegistry::new(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile files in order, stopping at the first error
    pub fn compile_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<RunReport> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(self.compile_file(path)?);
        }
        Ok(RunReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            output_dir: self.config.output_dir.clone(),
            files,
        })
    }

    pub fn compile_file(&mut self, path: impl AsRef<Path>) -> Result<FileReport> {
        let path = path.as_ref();
        let source = read_timeline_file(path)?;
        self.compile_source(&path.display().to_string(), &source)
    }

    /// Validate `source` completely, then write its CSV files
    pub fn compile_source(&mut self, file: &str, source: &str) -> Result<FileReport> {
        let compiled = analyze(file, source, self.config.default_units)?;
        let root = self.config.output_dir.clone();
        let families = sketch_families(&compiled.actions, &root);
        let mut written = Vec::new();

        for action in &compiled.actions {
            let directory = action.location.directory(&root);
            let file_name = match action.sketch_plane() {
                Some((axis, offset))
                    if families
                        .get(&(directory.clone(), action.location.name.clone()))
                        .map_or(false, |count| *count > 1) =>
                {
                    sketch_file_name(axis, offset, &action.location.name)
                }
                _ => action_file_name(&action.location.name),
            };
            let path = directory.join(file_name);
            let location = Location::new(
                file,
                action.line,
                format!("{} {}", action.file_type, action.location.name),
            );
            let schema = schema_for(action.file_type).ok_or_else(|| {
                CompileError::schema(location.clone(), format!("no schema for `{}`", action.file_type))
            })?;

            self.registry.claim(&path, location)?;
            let status = write_csv(&path, &render_action(action, schema))?;
            info!(path = %path.display(), ?status, "wrote {}", action.file_type);
            written.push(WrittenFile {
                path,
                file_type: action.file_type,
                line: action.line,
                status,
            });

            for rail in co_rail_sketches(action, &root) {
                written.push(self.write_rail(file, action.line, rail)?);
            }
        }

        let sketches = compiled.sketches();
        for (cross_rails, unit) in &compiled.cross_rails {
            for rail in cross_rails.sketches(&sketches, &root, *unit) {
                written.push(self.write_rail(file, cross_rails.line, rail)?);
            }
        }

        info!(file, files = written.len(), "compiled timeline");
        Ok(FileReport {
            file: file.to_string(),
            written,
            echoes: compiled.echoes,
            parameters: compiled.parameters,
        })
    }

    fn write_rail(&mut self, file: &str, line: usize, rail: RailSketch) -> Result<WrittenFile> {
        self.registry
            .claim(&rail.path, rail_location(file, line, &rail.path))?;
        let status = write_csv(&rail.path, &rail.contents)?;
        info!(path = %rail.path.display(), ?status, "wrote rail sketch");
        Ok(WrittenFile {
            path: rail.path,
            file_type: FileType::Sketch,
            line,
            status,
        })
    }
}

/// Number of sketch blocks per output directory and base name
fn sketch_families(actions: &[Action], root: &Path) -> HashMap<(PathBuf, String), usize> {
    let mut families = HashMap::new();
    for action in actions.iter().filter(|a| a.file_type == FileType::Sketch) {
        *families
            .entry((action.location.directory(root), action.location.name.clone()))
            .or_insert(0) += 1;
    }
    families
}
