// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rail sketches derived from profile sketches
//!
//! A sketch segment tagged `co_rail, <name>` is also written as a sketch of
//! its own. Segments tagged `cross_rails, <names>` contribute points to rails
//! that run across a family of parallel profile sketches; a `cross_rails`
//! block selects which rails to write and in which planes.

use crate::config::Unit;
use crate::error::{CompileError, Location, Result};
use crate::output::{format_number, rail_file_name, sketch_file_name, split_segments};
use crate::output::csv::render_record;
use crate::params::Evaluator;
use crate::schema::{schema_for, validate_body, Action, Record};
use crate::timeline::{Block, FileType};
use std::path::{Path, PathBuf};

/// A derived sketch file
#[derive(Debug, Clone, PartialEq)]
pub struct RailSketch {
    pub path: PathBuf,
    pub contents: String,
}

fn sketch_preamble(unit: Unit, axis: &str, offset: f64) -> String {
    format!("sketch\n{}\n{}, {}\n", unit, axis, format_number(offset))
}

/// Sketches for segments of `action` tagged with a co rail
pub fn co_rail_sketches(action: &Action, root: &Path) -> Vec<RailSketch> {
    let Some((axis, offset)) = action.sketch_plane() else {
        return Vec::new();
    };
    let directory = action.location.rails_directory(root);

    action
        .segments()
        .filter_map(|segment| {
            let rail = segment.co_rail()?;
            let mut contents = sketch_preamble(action.unit, axis, offset);
            render_record(&mut contents, segment);
            let stem = format!("{}_{}", action.location.name, rail);
            Some(RailSketch {
                path: directory.join(sketch_file_name(axis, offset, &stem)),
                contents,
            })
        })
        .collect()
}

/// A validated `cross_rails` block
#[derive(Debug, Clone, PartialEq)]
pub struct CrossRails {
    pub folder: Vec<String>,
    pub prefix: Option<String>,
    pub rail_names: Vec<String>,
    pub profile_normal: String,
    pub rail_normal: String,
    pub offsets: Vec<f64>,
    pub segment_type: String,
    pub line: usize,
}

impl CrossRails {
    /// Read `cross_rails, <folder>[, <prefix>]` and its definition lines
    pub fn from_block(block: &Block, evaluator: &Evaluator, file: &str) -> Result<Self> {
        let location = block.location(file, block.line());
        let header = &block.header;
        if !(2..=3).contains(&header.len()) {
            return Err(CompileError::schema(
                location,
                format!(
                    "`cross_rails` header expects `cross_rails, <folder>[, <prefix>]`, found {} fields",
                    header.len()
                ),
            ));
        }
        let substitute = |text: &str| {
            evaluator
                .substitute(text)
                .map_err(|e| e.at(location.clone(), text))
        };
        let folder = split_segments(&substitute(header.text(1).unwrap_or(""))?, "folder", &location)?;
        let prefix = header.text(2).map(substitute).transpose()?;

        let schema = schema_for(FileType::CrossRails)
            .ok_or_else(|| CompileError::schema(location.clone(), "no schema for cross_rails"))?;
        let records = validate_body(block, schema, evaluator, file)?;
        let find = |kind: &str| records.iter().find(|r| r.kind() == kind);
        let texts = |record: Option<&Record>| -> Vec<String> {
            record
                .map(|r| r.values.iter().filter_map(|v| v.as_text().map(str::to_string)).collect())
                .unwrap_or_default()
        };
        let first_text = |kind: &str| texts(find(kind)).into_iter().next().unwrap_or_default();

        let rails = CrossRails {
            folder,
            prefix,
            rail_names: texts(find("rail_names")),
            profile_normal: first_text("profile_plane_normal"),
            rail_normal: first_text("rail_plane_normal"),
            offsets: find("rail_plane_offsets")
                .map(|r| r.values.iter().filter_map(|v| v.as_f64()).collect())
                .unwrap_or_default(),
            segment_type: first_text("rail_segment_type"),
            line: block.line(),
        };

        if rails.profile_normal == rails.rail_normal {
            return Err(CompileError::schema(
                location,
                format!(
                    "rail_plane_normal must differ from profile_plane_normal `{}`",
                    rails.profile_normal
                ),
            ));
        }
        Ok(rails)
    }

    pub fn directory(&self, root: &Path) -> PathBuf {
        self.folder.iter().fold(root.to_path_buf(), |dir, s| dir.join(s))
    }

    /// Rail sketches with at least two points, per offset then per rail name
    pub fn sketches(&self, profiles: &[&Action], root: &Path, unit: Unit) -> Vec<RailSketch> {
        let directory = self.directory(root);
        let mut sketches = Vec::new();
        for &offset in &self.offsets {
            for rail in &self.rail_names {
                let points = self.points(profiles, rail, offset);
                if points.len() < 2 {
                    tracing::debug!(rail = rail.as_str(), offset, "skipping cross rail with fewer than 2 points");
                    continue;
                }
                let mut contents = sketch_preamble(unit, &self.rail_normal, offset);
                contents.push_str(&self.segment_type);
                contents.push('\n');
                for point in &points {
                    let (a, b) = project(&self.rail_normal, *point);
                    contents.push_str(&format!("{}, {}\n", format_number(round_cents(a)), format_number(round_cents(b))));
                }
                sketches.push(RailSketch {
                    path: directory.join(rail_file_name(self.prefix.as_deref(), &self.rail_normal, offset, rail)),
                    contents,
                });
            }
        }
        sketches
    }

    /// Distinct 3D points of `rail` in the rail plane at `offset`, in sketch order
    pub fn points(&self, profiles: &[&Action], rail: &str, offset: f64) -> Vec<[f64; 3]> {
        let mut points: Vec<[f64; 3]> = Vec::new();
        for profile in profiles {
            let Some((axis, profile_offset)) = profile.sketch_plane() else {
                continue;
            };
            if axis != self.profile_normal {
                continue;
            }
            for segment in profile.segments().filter(|s| s.on_cross_rail(rail)) {
                for row in &segment.rows {
                    let (Some(a), Some(b)) = (row.first().and_then(|v| v.as_f64()), row.get(1).and_then(|v| v.as_f64()))
                    else {
                        continue;
                    };
                    if let Some(point) = rail_point(axis, profile_offset, &self.rail_normal, offset, a, b) {
                        if !points.contains(&point) {
                            points.push(point);
                        }
                    }
                }
            }
        }
        points
    }
}

/// 3D point of sketch point `(a, b)` when it lies in the rail plane
pub fn rail_point(
    profile_normal: &str,
    profile_offset: f64,
    rail_normal: &str,
    rail_offset: f64,
    a: f64,
    b: f64,
) -> Option<[f64; 3]> {
    let on = |v: f64| (v - rail_offset).abs() < 1e-9;
    match (profile_normal, rail_normal) {
        ("x", "y") if on(a) => Some([profile_offset, a, b]),
        ("x", "z") if on(b) => Some([profile_offset, a, b]),
        ("y", "x") if on(a) => Some([a, profile_offset, b]),
        ("y", "z") if on(b) => Some([a, profile_offset, b]),
        ("z", "x") if on(a) => Some([a, b, profile_offset]),
        ("z", "y") if on(b) => Some([a, b, profile_offset]),
        _ => None,
    }
}

/// 2D coordinates of a 3D point in a plane with the given normal
fn project(normal: &str, [x, y, z]: [f64; 3]) -> (f64, f64) {
    match normal {
        "x" => (y, z),
        "y" => (x, z),
        _ => (x, y),
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Location used when a rail file collides with another output
pub fn rail_location(file: &str, line: usize, rail: &Path) -> Location {
    Location::new(file, line, format!("rail {}", rail.display()))
}
