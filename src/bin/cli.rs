// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Timeline360 CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use timeline360::cli::{split_inputs, Reporter};
use timeline360::logging::init_logging;
use timeline360::{analyze, Compiler, CompilerConfig, Unit};

#[derive(Parser)]
#[command(name = "timeline360")]
#[command(about = "Compile CAD timeline files into per-action CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Timeline files, repeated or comma separated
    #[arg(value_name = "FILES")]
    inputs: Vec<String>,

    /// Output root directory
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Configuration file (defaults to ./timeline360.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Default units (mm, cm, m)
    #[arg(long)]
    units: Option<Unit>,

    /// Print the parameter table of each file
    #[arg(short, long)]
    print_parameters: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile timeline files to CSV
    Compile {
        /// Timeline files, repeated or comma separated
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Validate a timeline file and output its actions as JSON
    Parse {
        /// Input timeline file
        input: String,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Evaluate and print the parameters of timeline files
    Params {
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Write the effective configuration to a TOML file
    InitConfig {
        #[arg(default_value = "timeline360.toml")]
        path: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("warning: {}", e);
    }

    if let Err(e) = run(&cli) {
        match e.downcast_ref::<timeline360::CompileError>() {
            Some(error) => Reporter::report_compile_error(error),
            None => Reporter::report_error(&format!("{:#}", e)),
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = CompilerConfig::load(cli.config.as_deref())?;
    if let Some(out_dir) = &cli.out_dir {
        config.output_dir = out_dir.clone();
    }
    if let Some(units) = cli.units {
        config.default_units = units;
    }
    config.print_parameters |= cli.print_parameters;

    match &cli.command {
        Some(Commands::Compile { inputs }) => compile_command(inputs, config, cli),
        Some(Commands::Parse { input, output }) => parse_command(input, output.as_deref(), &config, cli.verbose),
        Some(Commands::Params { inputs }) => params_command(inputs, &config),
        Some(Commands::InitConfig { path }) => {
            config.save(path)?;
            Reporter::success(&format!("Configuration written to {}", path.display()));
            Ok(())
        }
        Some(Commands::Version) => {
            println!("Timeline360 v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None if !cli.inputs.is_empty() => compile_command(&cli.inputs, config, cli),
        None => {
            eprintln!("Error: at least one timeline file is required");
            eprintln!("Usage: timeline360 <FILES>... [--out-dir <DIR>]");
            std::process::exit(1);
        }
    }
}

fn compile_command(inputs: &[String], config: CompilerConfig, cli: &Cli) -> Result<()> {
    let files = split_inputs(inputs);
    for file in &files {
        if !Path::new(file).exists() {
            anyhow::bail!("Input file not found: {}", file);
        }
    }

    let mut compiler = Compiler::new(config);
    let start = std::time::Instant::now();
    let report = compiler.compile_files(&files)?;
    let duration = start.elapsed();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for file in &report.files {
        Reporter::report_file(file, cli.verbose);
        if file.written.is_empty() {
            Reporter::report_warning(&format!("{} produced no CSV files", file.file));
        }
        if compiler.config().print_parameters {
            Reporter::report_parameters(&file.file, &file.parameters);
        }
    }
    Reporter::report_summary(&report, duration);
    Reporter::success(&format!(
        "Compiled {} timeline(s) into {} CSV file(s)",
        report.files.len(),
        report.total_written()
    ));

    Ok(())
}

fn parse_command(input: &str, output: Option<&str>, config: &CompilerConfig, verbose: bool) -> Result<()> {
    if verbose {
        Reporter::report_info(&format!("Parsing: {}", input));
    }

    let source = timeline360::timeline::read_timeline_file(input)?;
    let compiled = analyze(input, &source, config.default_units)?;
    let json = serde_json::to_string_pretty(&compiled)?;

    if let Some(output_path) = output {
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write {}", output_path))?;
        if verbose {
            Reporter::report_info(&format!("Actions written to: {}", output_path));
        }
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn params_command(inputs: &[String], config: &CompilerConfig) -> Result<()> {
    for input in split_inputs(inputs) {
        let source = timeline360::timeline::read_timeline_file(&input)?;
        let compiled = analyze(&input, &source, config.default_units)?;
        Reporter::report_parameters(&input, &compiled.parameters);
    }
    Ok(())
}
