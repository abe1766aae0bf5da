// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Declarative record schemas and validated actions

pub mod fields;
pub mod registry;
pub mod validate;

pub use fields::{FieldKind, FieldSpec, Fields, Value};
pub use registry::{schema_for, LineSpec, Occurs, Preamble, RowSpec, Schema, Slot};
pub use validate::{validate_body, Annotation, Record};

use crate::config::Unit;
use crate::output::BlockLocation;
use crate::timeline::FileType;
use serde::Serialize;

/// A validated action block, ready to be written as CSV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub file_type: FileType,
    pub location: BlockLocation,
    pub unit: Unit,
    pub records: Vec<Record>,
    /// Header line number in the source file
    pub line: usize,
}

impl Action {
    /// Plane normal and offset of a sketch
    pub fn sketch_plane(&self) -> Option<(&str, f64)> {
        if self.file_type != FileType::Sketch {
            return None;
        }
        let record = self.records.iter().find(|r| r.kind() == "offset_plane")?;
        match record.values.as_slice() {
            [axis, offset] => Some((axis.as_text()?, offset.as_f64()?)),
            _ => None,
        }
    }

    /// Sketch segment records, in order
    pub fn segments(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.kind() != "offset_plane")
    }
}
