// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Source mapping, remediation hints, and report formatting

use super::parse::{parse_raw_output, Diagnostic, GeneratorLocation, Severity};
use crate::scad::SourceMapEntry;
use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Full record of one compile attempt. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub model: String,
    pub timestamp: String,
    pub diagnostics: Vec<Diagnostic>,
    pub scad_source: String,
    pub success: bool,
}

/// Attach generator locations by predecessor search: the source-map entry
/// with the largest `emitted_line` at or before the diagnostic's SCAD
/// line. Diagnostics without a line number, or an empty map, pass through.
pub fn map_to_source(
    diagnostics: Vec<Diagnostic>,
    source_map: &[SourceMapEntry],
) -> Vec<Diagnostic> {
    if source_map.is_empty() {
        return diagnostics;
    }

    diagnostics
        .into_iter()
        .map(|mut d| {
            if let Some(location) = d.scad_location {
                let mut closest = &source_map[0];
                for entry in source_map {
                    if entry.emitted_line <= location.line as usize {
                        closest = entry;
                    }
                }
                d.generator_location = Some(GeneratorLocation {
                    file: closest.generator_file.clone(),
                    line: closest.generator_line,
                });
            }
            d
        })
        .collect()
}

/// Attach a remediation hint to diagnostics matching known failure
/// patterns. First matching rule wins; at most one suggestion each.
pub fn add_suggestions(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .map(|mut d| {
            let msg = d.message.to_lowercase();

            let suggestion = if msg.contains("syntax error") {
                Some("Check for missing semicolons or unmatched braces in the generated SCAD")
            } else if msg.contains("unknown module") || msg.contains("undefined module") {
                Some("The referenced module is not defined. Check that all module declarations are included in the SCAD output")
            } else if msg.contains("unknown function") || msg.contains("undefined function") {
                Some("The referenced function is not defined. Ensure all function declarations are present")
            } else if msg.contains("timeout") || msg.contains("timed out") {
                Some("The model is too complex to compile within the time limit. Simplify geometry or reduce $fn values")
            } else if msg.contains("out of memory") || msg.contains("allocation") {
                Some("Memory limit exceeded. Reduce polygon count, lower $fn, or simplify the model")
            } else if msg.contains("parameter") && msg.contains("range") {
                Some("A parameter value is outside its declared min/max range. Check parameter constraints")
            } else {
                None
            };

            if let Some(s) = suggestion {
                d.suggestion = Some(s.to_string());
            }
            d
        })
        .collect()
}

/// Parse, map, and enrich raw compiler output into a full report
pub fn create_report(
    model_id: &str,
    raw_output: &str,
    scad_source: &str,
    success: bool,
    source_map: Option<&[SourceMapEntry]>,
) -> DiagnosticsReport {
    let mut diagnostics = parse_raw_output(raw_output);
    if let Some(map) = source_map {
        diagnostics = map_to_source(diagnostics, map);
    }
    diagnostics = add_suggestions(diagnostics);

    DiagnosticsReport {
        model: model_id.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        diagnostics,
        scad_source: scad_source.to_string(),
        success,
    }
}

fn location_label(d: &Diagnostic) -> Option<String> {
    if let Some(ref gen) = d.generator_location {
        Some(format!("{}:{}", gen.file, gen.line))
    } else {
        d.scad_location.map(|loc| format!("SCAD line {}", loc.line))
    }
}

/// One line per diagnostic, generator location preferred over the raw
/// compiler location, suggestions on a follow-up line
pub fn format_for_console(report: &DiagnosticsReport) -> String {
    let mut lines = Vec::new();
    let status = if report.success {
        "SUCCESS".green().to_string()
    } else {
        "FAILED".red().to_string()
    };
    lines.push(format!("[scadforge] model: {} - {}", report.model, status));

    for d in &report.diagnostics {
        let severity = match d.severity {
            Severity::Error => "ERROR  ".red().to_string(),
            Severity::Warning => "WARNING".yellow().to_string(),
            Severity::Info => "INFO   ".cyan().to_string(),
        };
        let loc = location_label(d)
            .map(|l| format!(" ({})", l))
            .unwrap_or_default();
        lines.push(format!("  {} {}{}", severity, d.message, loc));
        if let Some(ref suggestion) = d.suggestion {
            lines.push(format!("          -> {}", suggestion));
        }
    }

    lines.join("\n")
}

/// UI projection of one diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiDiagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// One-line summary plus structured details for a UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiReport {
    pub summary: String,
    pub details: Vec<UiDiagnostic>,
}

pub fn format_for_ui(report: &DiagnosticsReport) -> UiReport {
    let errors = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    let mut parts = Vec::new();
    if errors > 0 {
        parts.push(format!("{} error{}", errors, if errors > 1 { "s" } else { "" }));
    }
    if warnings > 0 {
        parts.push(format!(
            "{} warning{}",
            warnings,
            if warnings > 1 { "s" } else { "" }
        ));
    }

    let summary = if report.success {
        if parts.is_empty() {
            "Compiled successfully".to_string()
        } else {
            format!("Compiled with {}", parts.join(", "))
        }
    } else if parts.is_empty() {
        "Compilation failed: unknown error".to_string()
    } else {
        format!("Compilation failed: {}", parts.join(", "))
    };

    let details = report
        .diagnostics
        .iter()
        .map(|d| UiDiagnostic {
            severity: d.severity,
            message: d.message.clone(),
            location: location_label(d),
            suggestion: d.suggestion.clone(),
        })
        .collect();

    UiReport { summary, details }
}
