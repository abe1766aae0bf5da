// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Output folder and file name resolution

use super::csv::format_number;
use crate::error::{CompileError, Location, Result};
use crate::params::Evaluator;
use crate::timeline::Line;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Destination of an action block: `<keyword>, <folder>, <name>[, <component path>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockLocation {
    pub folder: Vec<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub component: Vec<String>,
}

impl BlockLocation {
    /// Read the destination from an action block header line
    pub fn from_header(header: &Line, evaluator: &Evaluator, location: &Location) -> Result<Self> {
        if !(3..=4).contains(&header.len()) {
            return Err(CompileError::schema(
                location.clone(),
                format!(
                    "`{}` header expects `{}, <folder>, <name>[, <component path>]`, found {} fields",
                    header.keyword(),
                    header.keyword(),
                    header.len()
                ),
            ));
        }

        let field = |index: usize| -> Result<String> {
            let text = header.text(index).unwrap_or("");
            evaluator
                .substitute(text)
                .map_err(|e| e.at(location.clone(), text))
        };

        let folder = split_segments(&field(1)?, "folder", location)?;
        let name = field(2)?;
        validate_file_stem(&name, location)?;
        let component = match header.len() {
            4 => {
                let segments = split_segments(&field(3)?, "component path", location)?;
                if segments.is_empty() {
                    return Err(CompileError::schema(location.clone(), "empty component path"));
                }
                segments
            }
            _ => Vec::new(),
        };

        Ok(Self {
            folder,
            name,
            component,
        })
    }

    /// Output directory: root, then folder segments, then component segments
    pub fn directory(&self, root: &Path) -> PathBuf {
        self.segments().fold(root.to_path_buf(), |dir, s| dir.join(s))
    }

    /// Sibling directory holding co rail sketches, `<directory>_rails`
    pub fn rails_directory(&self, root: &Path) -> PathBuf {
        let mut segments: Vec<String> = self.segments().map(str::to_string).collect();
        match segments.last_mut() {
            Some(last) => last.push_str("_rails"),
            None => segments.push("rails".to_string()),
        }
        segments.iter().fold(root.to_path_buf(), |dir, s| dir.join(s))
    }

    /// Group component written into CSV files, the last component segment
    pub fn group(&self) -> Option<&str> {
        self.component.last().map(String::as_str)
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.folder.iter().chain(self.component.iter()).map(String::as_str)
    }
}

/// Split a `/` separated relative path into segments
///
/// `.` segments are dropped. Absolute paths and `..` are rejected so output
/// stays below the output root.
pub fn split_segments(path: &str, what: &str, location: &Location) -> Result<Vec<String>> {
    let absolute = path.starts_with('/')
        || path.starts_with('\\')
        || path.chars().nth(1) == Some(':');
    if absolute {
        return Err(CompileError::schema(
            location.clone(),
            format!("{} `{}` must be a relative path", what, path),
        ));
    }

    let mut segments = Vec::new();
    for segment in path.split('/').map(str::trim) {
        match segment {
            "." => continue,
            "" | ".." => {
                return Err(CompileError::schema(
                    location.clone(),
                    format!("invalid segment `{}` in {} `{}`", segment, what, path),
                ))
            }
            s if s.contains('\\') => {
                return Err(CompileError::schema(
                    location.clone(),
                    format!("use `/` to separate {} `{}`", what, path),
                ))
            }
            s => segments.push(s.to_string()),
        }
    }
    Ok(segments)
}

fn validate_file_stem(name: &str, location: &Location) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(CompileError::schema(
            location.clone(),
            format!("invalid name `{}`", name),
        ));
    }
    Ok(())
}

/// Plane offset as used in file names: `12.5` becomes `12_5`, `-5` becomes `5`
pub fn value_to_str(value: f64) -> String {
    let text = format_number(value.abs()).replace('.', "_");
    match text.strip_suffix("_0") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => text,
    }
}

/// `<name>.csv`
pub fn action_file_name(name: &str) -> String {
    format!("{}.csv", name)
}

/// `<axis>_<offset>_<name>.csv`, for a sketch in a family of parallel sketches
pub fn sketch_file_name(axis: &str, offset: f64, name: &str) -> String {
    format!("{}_{}_{}.csv", axis, value_to_str(offset), name)
}

/// `[<prefix>_]<axis>_<offset>_<rail>.csv`
pub fn rail_file_name(prefix: Option<&str>, axis: &str, offset: f64, rail: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}_{}", prefix, sketch_file_name(axis, offset, rail)),
        None => sketch_file_name(axis, offset, rail),
    }
}

/// Output paths claimed during one compiler run
#[derive(Debug, Default)]
pub struct OutputRegistry {
    claims: IndexMap<PathBuf, Location>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `path` for the block at `location`
    pub fn claim(&mut self, path: &Path, location: Location) -> Result<()> {
        if let Some(first) = self.claims.get(path) {
            return Err(CompileError::PathCollision {
                path: path.to_path_buf(),
                first: first.clone(),
                second: location,
            });
        }
        self.claims.insert(path.to_path_buf(), location);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BareNames, ParameterTable};
    use crate::timeline::split_line;

    fn header(raw: &str) -> Result<BlockLocation> {
        let mut table = ParameterTable::new();
        table.define("n", "3", &Location::at_line(0)).unwrap();
        let evaluator = Evaluator::new(&table, BareNames::ConstantsOnly);
        let line = Line {
            number: 1,
            fields: split_line(raw).unwrap(),
        };
        BlockLocation::from_header(&line, &evaluator, &Location::at_line(1))
    }

    #[test]
    fn test_value_to_str() {
        assert_eq!(value_to_str(12.5), "12_5");
        assert_eq!(value_to_str(-5.0), "5");
        assert_eq!(value_to_str(0.0), "0");
        assert_eq!(value_to_str(-0.0), "0");
        assert_eq!(value_to_str(100.0), "100");
        assert_eq!(value_to_str(0.25), "0_25");
    }

    #[test]
    fn test_file_names() {
        assert_eq!(sketch_file_name("z", 12.5, "rib"), "z_12_5_rib.csv");
        assert_eq!(rail_file_name(Some("wing"), "y", -20.0, "top"), "wing_y_20_top.csv");
        assert_eq!(rail_file_name(None, "y", 0.0, "top"), "y_0_top.csv");
        assert_eq!(action_file_name("body"), "body.csv");
    }

    #[test]
    fn test_header_location() {
        let location = header("extrude, parts/wing, rib_$n, assy/left").unwrap();
        assert_eq!(location.folder, vec!["parts", "wing"]);
        assert_eq!(location.name, "rib_3");
        assert_eq!(location.group(), Some("left"));
        assert_eq!(
            location.directory(Path::new("out")),
            PathBuf::from("out/parts/wing/assy/left")
        );
        assert_eq!(
            location.rails_directory(Path::new("out")),
            PathBuf::from("out/parts/wing/assy/left_rails")
        );
    }

    #[test]
    fn test_header_rejects_escaping_paths() {
        assert!(header("sketch, ../up, a").is_err());
        assert!(header("sketch, /abs, a").is_err());
        assert!(header("sketch, a//b, a").is_err());
        assert!(header("sketch, a, b/c").is_err());
        assert!(header("sketch, a").is_err());
        assert_eq!(header("sketch, ., a").unwrap().directory(Path::new("out")), PathBuf::from("out"));
    }

    #[test]
    fn test_registry_detects_collision() {
        let mut registry = OutputRegistry::new();
        assert!(registry.is_empty());
        let path = Path::new("out/a.csv");
        registry.claim(path, Location::new("f.txt", 1, "sketch a")).unwrap();
        let error = registry.claim(path, Location::new("f.txt", 9, "extrude a")).unwrap_err();
        match error {
            CompileError::PathCollision { first, second, .. } => {
                assert_eq!(first.line, 1);
                assert_eq!(second.line, 9);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(registry.len(), 1);
    }
}
