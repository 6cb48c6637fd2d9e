// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Opaque engine interface for the external geometry compiler
//!
//! The engine is a stateful, exclusive resource: one run corrupts
//! internal state, so the bridge requests a fresh instance per compile
//! through an [`EngineFactory`]. File paths form a single flat namespace
//! inside an instance.

use anyhow::Result;

/// Outcome of one engine invocation
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub exit_code: i32,
    /// Combined stdout/stderr text, the raw diagnostic stream
    pub output: String,
}

/// Minimal surface the geometry compiler must expose: a writable virtual
/// filesystem plus a single run entry point
pub trait Engine {
    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<()>;
    fn read_file(&mut self, path: &str) -> Result<Vec<u8>>;
    fn remove_file(&mut self, path: &str) -> Result<()>;
    fn run(&mut self, args: &[String]) -> Result<EngineRun>;
}

/// Creates a fresh engine for every compile. Implementations must be
/// shareable across threads; the engines they create are used from a
/// single worker thread only.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Engine>>;
}
