// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::compiler::{FileReport, RunReport};
use crate::error::CompileError;
use crate::output::{format_number, WriteStatus};
use crate::params::ParameterTable;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report the files written for one timeline file
    pub fn report_file(report: &FileReport, verbose: bool) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Timeline:".bold(), report.file.cyan());
        println!("{}", "━".repeat(80).bright_black());

        for message in &report.echoes {
            println!("  {} {}", "echo".bright_blue(), message);
        }

        let changed = report
            .written
            .iter()
            .filter(|w| w.status != WriteStatus::Unchanged)
            .count();
        println!(
            "  {} {} ({} changed)",
            "Files:".bright_black(),
            report.written.len().to_string().cyan(),
            changed
        );

        if verbose {
            for written in &report.written {
                let status = match written.status {
                    WriteStatus::Created => "created".green(),
                    WriteStatus::Updated => "updated".yellow(),
                    WriteStatus::Unchanged => "unchanged".bright_black(),
                };
                println!(
                    "    {:>9} {} {}",
                    status,
                    written.path.display(),
                    format!("(line {})", written.line).bright_black()
                );
            }
        }
    }

    /// Print the evaluated parameters in definition order
    pub fn report_parameters(file: &str, table: &ParameterTable) {
        println!("\n{} {}", "Parameters:".bold(), file.cyan());
        if table.is_empty() {
            println!("  {}", "(none)".bright_black());
            return;
        }
        let width = table.iter().map(|p| p.name.len()).max().unwrap_or(0);
        for parameter in table.iter() {
            println!(
                "  {:<width$} = {} {}",
                parameter.name,
                format_number(parameter.value).cyan(),
                format!("({})", parameter.expression).bright_black(),
                width = width
            );
        }
    }

    /// Report totals for the whole run
    pub fn report_summary(report: &RunReport, duration: Duration) {
        println!("\n{}", "═".repeat(80).bright_black());
        println!("{}", "Compile Summary".bold());
        println!("{}", "═".repeat(80).bright_black());
        println!(
            "  {} {}",
            "Timelines:".bright_black(),
            report.files.len().to_string().cyan()
        );
        println!(
            "  {} {}",
            "CSV files:".bright_black(),
            report.total_written().to_string().cyan()
        );
        println!(
            "  {} {}",
            "Changed:".bright_black(),
            report.total_changed().to_string().yellow()
        );
        println!(
            "  {} {}",
            "Output:".bright_black(),
            report.output_dir.display().to_string().cyan()
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "═".repeat(80).bright_black());
    }

    /// Report a compile error with its kind and source location
    pub fn report_compile_error(error: &CompileError) {
        eprintln!("\n{} {}", format!("❌ {}:", error.kind()).red().bold(), error);
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}
