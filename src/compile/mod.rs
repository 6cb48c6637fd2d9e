// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Compilation bridge to the external geometry compiler

mod bridge;
mod engine;
mod process;

pub use bridge::{
    Bridge, CompileError, CompileOptions, CompileResult, ENTRY_FILE, OUTPUT_FILE,
};
pub use engine::{Engine, EngineFactory, EngineRun};
pub use process::{ProcessEngine, ProcessEngineFactory};
