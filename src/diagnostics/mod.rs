// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Structured diagnostics from raw compiler output

mod parse;
mod report;

pub use parse::{parse_raw_output, Diagnostic, GeneratorLocation, ScadLocation, Severity};
pub use report::{
    add_suggestions, create_report, format_for_console, format_for_ui, map_to_source,
    DiagnosticsReport, UiDiagnostic, UiReport,
};
