// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Scadforge
//!
//! Generates OpenSCAD programs from typed parameter sets, compiles them
//! with an external geometry compiler, decodes the binary STL result, and
//! turns raw compiler output into structured, source-mapped diagnostics.

pub mod compile;
pub mod diagnostics;
pub mod manifest;
pub mod mesh;
pub mod pipeline;
pub mod registry;
pub mod scad;

pub use compile::{Bridge, CompileError, CompileOptions, CompileResult, Engine, EngineFactory};
pub use diagnostics::{Diagnostic, DiagnosticsReport, Severity};
pub use manifest::{ModelManifest, ParamValue, ParameterDef, ParameterSet};
pub use mesh::{BoundingBox, DecodeError, ParsedMesh};
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome, RecompileQueue};
pub use registry::{GenerationError, ModelDescriptor, ModelRegistry};
pub use scad::{ScadBuilder, ScadValue, SourceMapEntry};

/// Compile a SCAD source string with the system OpenSCAD installation
pub fn compile_source(source: &str, options: &CompileOptions) -> CompileResult {
    Bridge::with_openscad().compile(source, &[], options)
}
