// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! End-to-end orchestration: parameters -> SCAD -> compile -> mesh/report

use crate::compile::{Bridge, CompileOptions, CompileResult};
use crate::diagnostics::{create_report, parse_raw_output, DiagnosticsReport, Severity};
use crate::manifest::{apply_defaults, clamp_parameters, create_manifest, ModelManifest, ParameterSet};
use crate::mesh::{parse_binary, validate_mesh, DecodeError, ParsedMesh};
use crate::registry::{GenerationError, ModelDescriptor};
use crate::scad::ScadBuilder;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Result of one pipeline run. On compile failure the mesh is absent and
/// the report carries the diagnostics; mesh quality issues are advisory
/// and never block the mesh itself.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub manifest: ModelManifest,
    pub scad_source: String,
    pub report: DiagnosticsReport,
    /// Raw artifact bytes, present on success for export
    pub stl: Option<Vec<u8>>,
    pub mesh: Option<ParsedMesh>,
    pub mesh_issues: Vec<String>,
}

/// Drives a model descriptor through generation, compilation, decoding,
/// and diagnostics. Owns its bridge; no hidden engine state.
pub struct Pipeline {
    bridge: Bridge,
}

impl Pipeline {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    pub fn with_openscad() -> Self {
        Self::new(Bridge::with_openscad())
    }

    pub fn run(
        &self,
        model: &ModelDescriptor,
        params: &ParameterSet,
        options: &CompileOptions,
    ) -> Result<PipelineOutcome, PipelineError> {
        let params = apply_defaults(params, &model.parameter_defs);
        let params = clamp_parameters(&params, &model.parameter_defs);

        let mut builder = ScadBuilder::for_generator(&model.id);
        run_generator(model, &params, &mut builder)?;

        let scad_source = builder.build();
        let source_map = builder.source_map();
        let manifest = create_manifest(
            &model.id,
            &model.parameter_defs,
            Some(&model.generator_version),
        );

        match self.bridge.compile(&scad_source, &model.libraries, options) {
            CompileResult::Success {
                stl, raw_output, ..
            } => {
                let mesh = parse_binary(&stl)?;
                let mesh_issues = validate_mesh(&mesh);
                let report =
                    create_report(&model.id, &raw_output, &scad_source, true, Some(&source_map));
                Ok(PipelineOutcome {
                    manifest,
                    scad_source,
                    report,
                    stl: Some(stl),
                    mesh: Some(mesh),
                    mesh_issues,
                })
            }
            CompileResult::Failure { error, raw_output } => {
                // make sure the failure reason shows up in the report even
                // when the engine printed no ERROR line of its own
                let mut raw = raw_output;
                let has_error = parse_raw_output(&raw)
                    .iter()
                    .any(|d| d.severity == Severity::Error);
                if !has_error {
                    if !raw.is_empty() && !raw.ends_with('\n') {
                        raw.push('\n');
                    }
                    raw.push_str(&format!("ERROR: {error}"));
                }
                let report =
                    create_report(&model.id, &raw, &scad_source, false, Some(&source_map));
                Ok(PipelineOutcome {
                    manifest,
                    scad_source,
                    report,
                    stl: None,
                    mesh: None,
                    mesh_issues: Vec::new(),
                })
            }
        }
    }
}

/// A generator that panics is reported as a GenerationError rather than
/// unwinding through the pipeline
fn run_generator(
    model: &ModelDescriptor,
    params: &ParameterSet,
    builder: &mut ScadBuilder,
) -> Result<(), GenerationError> {
    let generator = &model.generator;
    match panic::catch_unwind(AssertUnwindSafe(|| generator(params, builder))) {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "generator panicked".to_string()
            };
            Err(GenerationError::new(message))
        }
    }
}

/// Latest-wins coalescing for recompile requests.
///
/// The bridge never reorders: callers funnel requests through this
/// single-slot queue instead. `submit` hands back the request when the
/// slot is free; otherwise the request is parked, replacing any older
/// parked one. `complete` re-fires the newest parked request. Tickets are
/// a monotone generation counter; `is_current` tells a caller whether a
/// finished run's result is still worth applying.
#[derive(Debug)]
pub struct RecompileQueue<T> {
    state: Mutex<QueueState<T>>,
}

#[derive(Debug)]
struct QueueState<T> {
    next_ticket: u64,
    newest: u64,
    in_flight: Option<u64>,
    pending: Option<(u64, T)>,
}

impl<T> Default for QueueState<T> {
    fn default() -> Self {
        Self {
            next_ticket: 0,
            newest: 0,
            in_flight: None,
            pending: None,
        }
    }
}

impl<T> Default for RecompileQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecompileQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
        }
    }

    /// Returns `Some((ticket, request))` when the caller should run the
    /// request now; `None` when it was parked behind the in-flight run.
    pub fn submit(&self, request: T) -> Option<(u64, T)> {
        let mut state = self.state.lock().unwrap();
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        state.newest = ticket;

        if state.in_flight.is_some() {
            state.pending = Some((ticket, request));
            None
        } else {
            state.in_flight = Some(ticket);
            Some((ticket, request))
        }
    }

    /// Mark a run finished; returns the newest parked request, which the
    /// caller must now run.
    pub fn complete(&self, ticket: u64) -> Option<(u64, T)> {
        let mut state = self.state.lock().unwrap();
        if state.in_flight == Some(ticket) {
            state.in_flight = None;
        }
        if let Some((next_ticket, request)) = state.pending.take() {
            state.in_flight = Some(next_ticket);
            Some((next_ticket, request))
        } else {
            None
        }
    }

    /// True when no newer request has superseded this ticket
    pub fn is_current(&self, ticket: u64) -> bool {
        self.state.lock().unwrap().newest == ticket
    }
}
