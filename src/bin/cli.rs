// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Scadforge CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use scadforge::compile::ProcessEngineFactory;
use scadforge::diagnostics::{create_report, format_for_console};
use scadforge::manifest::{serialize_manifest, ParamValue, ParameterDef, ParameterSet};
use scadforge::mesh::{compute_bounding_box, parse_binary, validate_mesh};
use scadforge::scad::CylinderArgs;
use scadforge::{CompileOptions, CompileResult, ModelDescriptor, Pipeline};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "scadforge")]
#[command(about = "Parametric OpenSCAD generation and compilation pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a SCAD file with the system OpenSCAD and report diagnostics
    Compile {
        /// Input SCAD file
        input: PathBuf,

        /// Output STL file
        #[arg(short, long, default_value = "output.stl")]
        output: PathBuf,

        /// Compile timeout in seconds
        #[arg(short, long, default_value_t = 30)]
        timeout: u64,

        /// name=value overrides passed to the compiler
        #[arg(short = 'D', long = "define")]
        defines: Vec<String>,
    },

    /// Decode a binary STL file and print mesh statistics
    Inspect {
        /// Input STL file
        input: PathBuf,
    },

    /// Run the built-in demo model through the full pipeline
    Demo {
        /// Output STL file
        #[arg(short, long, default_value = "demo.stl")]
        output: PathBuf,

        /// name=value parameter overrides for the demo model
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Compile {
            input,
            output,
            timeout,
            defines,
        } => compile_command(input, output, *timeout, defines, cli.verbose),
        Commands::Inspect { input } => inspect_command(input),
        Commands::Demo { output, params } => demo_command(output, params, cli.verbose),
    }
}

fn require_openscad() {
    if !ProcessEngineFactory::default().is_available() {
        eprintln!("{} OpenSCAD is not installed or not in PATH", "Error:".red());
        std::process::exit(1);
    }
}

fn parse_pairs(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|p| {
            p.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("Invalid argument {:?}, expected name=value", p))
        })
        .collect()
}

fn compile_command(
    input: &Path,
    output: &Path,
    timeout_secs: u64,
    defines: &[String],
    verbose: bool,
) -> Result<()> {
    require_openscad();

    let source = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let options = CompileOptions {
        timeout: Duration::from_secs(timeout_secs),
        overrides: parse_pairs(defines)?,
    };

    let model_id = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scad".to_string());

    match scadforge::compile_source(&source, &options) {
        CompileResult::Success {
            stl,
            raw_output,
            digest,
        } => {
            std::fs::write(output, &stl)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            let report = create_report(&model_id, &raw_output, &source, true, None);
            println!("{}", format_for_console(&report));
            if verbose {
                println!(
                    "  artifact: {} ({} bytes, sha256 {})",
                    output.display(),
                    stl.len(),
                    digest
                );
            }
            Ok(())
        }
        CompileResult::Failure { error, raw_output } => {
            let report = create_report(&model_id, &raw_output, &source, false, None);
            println!("{}", format_for_console(&report));
            eprintln!("{} {}", "Error:".red(), error);
            std::process::exit(1);
        }
    }
}

fn inspect_command(input: &Path) -> Result<()> {
    let buffer =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let mesh = parse_binary(&buffer)?;

    println!("Triangles: {}", mesh.triangle_count);
    let bbox = compute_bounding_box(&mesh);
    if bbox.is_empty() {
        println!("Bounding box: (empty)");
    } else {
        println!(
            "Bounding box: min [{:.3}, {:.3}, {:.3}] max [{:.3}, {:.3}, {:.3}]",
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z
        );
    }

    let issues = validate_mesh(&mesh);
    if issues.is_empty() {
        println!("{}", "No mesh issues found".green());
    } else {
        println!("{}", "Mesh issues:".yellow());
        for issue in &issues {
            println!("  - {}", issue);
        }
    }

    Ok(())
}

/// A cube with a cylindrical bore, enough to exercise every pipeline stage
fn demo_descriptor() -> ModelDescriptor {
    ModelDescriptor {
        id: "cube-with-hole".to_string(),
        revision: 1,
        generator_version: env!("CARGO_PKG_VERSION").to_string(),
        parameter_defs: vec![
            ParameterDef::number("size", 20.0)
                .with_bounds(1.0, 200.0)
                .with_description("Cube edge length"),
            ParameterDef::number("bore", 4.0)
                .with_bounds(0.5, 90.0)
                .with_description("Bore radius"),
        ],
        libraries: Vec::new(),
        generator: Arc::new(|params, s| {
            let size = params
                .get("size")
                .and_then(ParamValue::as_number)
                .unwrap_or(20.0);
            let bore = params
                .get("bore")
                .and_then(ParamValue::as_number)
                .unwrap_or(4.0);
            s.comment("demo: cube with a cylindrical bore");
            s.difference(|s| {
                s.cube([size, size, size], true);
                s.cylinder(&CylinderArgs {
                    h: size * 2.0,
                    r: Some(bore),
                    center: Some(true),
                    fn_: Some(64),
                    ..Default::default()
                });
            });
            Ok(())
        }),
    }
}

fn demo_command(output: &Path, params: &[String], verbose: bool) -> Result<()> {
    require_openscad();

    let mut params_set = ParameterSet::new();
    for (name, value) in parse_pairs(params)? {
        let parsed = value
            .parse::<f64>()
            .map(ParamValue::Number)
            .unwrap_or(ParamValue::Str(value));
        params_set.insert(name, parsed);
    }

    let model = demo_descriptor();
    let pipeline = Pipeline::with_openscad();
    let outcome = pipeline.run(&model, &params_set, &CompileOptions::default())?;

    println!("{}", format_for_console(&outcome.report));
    if verbose {
        println!("{}", serialize_manifest(&outcome.manifest)?);
        println!("--- generated SCAD ---\n{}", outcome.scad_source);
    }

    match (&outcome.stl, &outcome.mesh) {
        (Some(stl), Some(mesh)) => {
            std::fs::write(output, stl)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Decoded {} triangles -> {}", mesh.triangle_count, output.display());
            for issue in &outcome.mesh_issues {
                println!("  {} {}", "warning:".yellow(), issue);
            }
            Ok(())
        }
        _ => std::process::exit(1),
    }
}
