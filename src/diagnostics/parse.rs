// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Line classifier for raw compiler output
//!
//! Recognized formats:
//!   ERROR: /path/file.scad:12: syntax error
//!   WARNING: /path/file.scad:5: Ignoring unknown module 'foo'
//!   ECHO: "debug message"

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// Location in the emitted SCAD document, as reported by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScadLocation {
    pub line: u32,
}

/// Location in generator code, attached by source-map lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorLocation {
    pub file: String,
    pub line: u32,
}

/// One structured message extracted from the raw output stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scad_location: Option<ScadLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_location: Option<GeneratorLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: &str, scad_location: Option<ScadLocation>) -> Self {
        Self {
            severity,
            message: message.to_string(),
            scad_location,
            generator_location: None,
            suggestion: None,
        }
    }
}

/// Parse raw compiler stdout/stderr text into structured diagnostics.
///
/// Lines are classified in priority order: `ERROR:` prefix, `WARNING:`
/// prefix, `ECHO:` prefix, then a catch-all that turns any remaining
/// non-blank line containing "error" or "fail" into an error diagnostic.
/// The catch-all is a deliberate heuristic for unstructured compiler text
/// and can misclassify benign lines containing those substrings; treat it
/// as approximate. Everything else is dropped.
pub fn parse_raw_output(raw: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(rest) = strip_prefix_ci(trimmed, "ERROR:") {
            let (location, message) = split_location(rest.trim_start());
            diagnostics.push(Diagnostic::new(Severity::Error, message, location));
            continue;
        }

        if let Some(rest) = strip_prefix_ci(trimmed, "WARNING:") {
            let (location, message) = split_location(rest.trim_start());
            diagnostics.push(Diagnostic::new(Severity::Warning, message, location));
            continue;
        }

        if let Some(rest) = strip_prefix_ci(trimmed, "ECHO:") {
            diagnostics.push(Diagnostic::new(Severity::Info, rest.trim_start(), None));
            continue;
        }

        let lower = trimmed.to_lowercase();
        if lower.contains("error") || lower.contains("fail") {
            diagnostics.push(Diagnostic::new(Severity::Error, trimmed, None));
        }
    }

    diagnostics
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Split an optional leading `file:line:` from the message remainder
fn split_location(rest: &str) -> (Option<ScadLocation>, &str) {
    if let Some((_file, after_file)) = rest.split_once(':') {
        if let Some((line_str, message)) = after_file.split_once(':') {
            if let Ok(line) = line_str.trim().parse::<u32>() {
                return (Some(ScadLocation { line }), message.trim_start());
            }
        }
    }
    (None, rest)
}
