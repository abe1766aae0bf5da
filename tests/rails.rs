// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Co rail and cross rail sketch generation

use anyhow::Result;
use std::fs;
use tempfile::TempDir;
use timeline360::{Compiler, CompilerConfig};

const RIBS: &str = "\
parameters
chord, 100

sketch, csv/wing, rib
offset_plane, z, 0
spline, cross_rails, lead, trail
0, 0
$chord, 0
line, co_rail, spar
30, -5
30, 5

sketch, csv/wing, rib
offset_plane, z, 50
spline, cross_rails, lead
0, 0
$chord/2, 0

cross_rails, csv/wing/rails, wing
rail_names, lead, trail
profile_plane_normal, z
rail_plane_normal, y
rail_plane_offsets, 0
rail_segment_type, spline
";

#[test]
fn test_co_rail_sketch_is_written() -> Result<()> {
    let dir = TempDir::new()?;
    let mut compiler = Compiler::new(CompilerConfig::with_output_dir(dir.path()));
    compiler.compile_source("ribs.txt", RIBS)?;

    let rail = fs::read_to_string(dir.path().join("csv/wing_rails/z_0_rib_spar.csv"))?;
    assert_eq!(rail, "sketch\nmm\nz, 0\nline\n30, -5\n30, 5\n");

    // annotations never reach the profile sketch itself
    let rib = fs::read_to_string(dir.path().join("csv/wing/z_0_rib.csv"))?;
    assert_eq!(rib, "sketch\nmm\nz, 0\nspline\n0, 0\n100, 0\nline\n30, -5\n30, 5\n");
    Ok(())
}

#[test]
fn test_cross_rail_collects_points_across_profiles() -> Result<()> {
    let dir = TempDir::new()?;
    let mut compiler = Compiler::new(CompilerConfig::with_output_dir(dir.path()));
    let report = compiler.compile_source("ribs.txt", RIBS)?;

    let lead = fs::read_to_string(dir.path().join("csv/wing/rails/wing_y_0_lead.csv"))?;
    assert_eq!(lead, "sketch\nmm\ny, 0\nspline\n0, 0\n100, 0\n0, 50\n50, 50\n");

    // `trail` only has points on the first rib
    assert!(fs::read_to_string(dir.path().join("csv/wing/rails/wing_y_0_trail.csv")).is_ok());
    assert_eq!(report.written.len(), 5);
    Ok(())
}

#[test]
fn test_rail_paths_take_part_in_collision_checks() {
    let dir = TempDir::new().unwrap();
    let source = format!(
        "{}\nsketch, csv/wing/rails, wing_y_0_lead\noffset_plane, x, 0\npoint\n1, 1\n",
        RIBS
    );
    let mut compiler = Compiler::new(CompilerConfig::with_output_dir(dir.path()));
    let error = compiler.compile_source("ribs.txt", &source).unwrap_err();
    assert_eq!(error.kind(), "PathCollisionError");
}
