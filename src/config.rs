// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Compiler configuration system

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Length unit written into action files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Mm,
    Cm,
    M,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::M => "m",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mm" => Ok(Unit::Mm),
            "cm" => Ok(Unit::Cm),
            "m" => Ok(Unit::M),
            other => Err(format!("unknown unit `{}`, expected mm, cm or m", other)),
        }
    }
}

/// Compiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Root directory for emitted CSV files
    pub output_dir: PathBuf,
    /// Unit used until a `units` block changes it
    pub default_units: Unit,
    /// Print the parameter table after each file
    pub print_parameters: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            default_units: Unit::Mm,
            print_parameters: false,
        }
    }
}

impl CompilerConfig {
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: CompilerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    ///
    /// Without an explicit path, `timeline360.toml` in the working directory
    /// is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new("timeline360.toml").exists() => Self::from_file("timeline360.toml")?,
            None => Self::default(),
        };

        if let Ok(output_dir) = std::env::var("TIMELINE360_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(output_dir);
        }

        if let Ok(units) = std::env::var("TIMELINE360_UNITS") {
            config.default_units = match units.parse() {
                Ok(unit) => unit,
                Err(message) => bail!("TIMELINE360_UNITS: {}", message),
            };
        }

        if let Ok(print) = std::env::var("TIMELINE360_PRINT_PARAMETERS") {
            config.print_parameters = print.parse().unwrap_or(false);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.default_units, Unit::Mm);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timeline360.toml");
        let config = CompilerConfig {
            output_dir: PathBuf::from("build/csv"),
            default_units: Unit::Cm,
            print_parameters: true,
        };
        config.save(&path).unwrap();
        assert_eq!(CompilerConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "default_units = \"m\"\n").unwrap();
        let config = CompilerConfig::from_file(&path).unwrap();
        assert_eq!(config.default_units, Unit::M);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("cm".parse::<Unit>(), Ok(Unit::Cm));
        assert!("inch".parse::<Unit>().is_err());
        assert_eq!(Unit::M.to_string(), "m");
    }
}
