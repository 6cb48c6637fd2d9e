// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Subprocess engine driving the system OpenSCAD executable

use super::engine::{Engine, EngineFactory, EngineRun};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Engine backed by the `openscad` executable running inside a temporary
/// sandbox directory. The sandbox is removed when the engine is dropped.
pub struct ProcessEngine {
    program: PathBuf,
    sandbox: TempDir,
}

impl ProcessEngine {
    pub fn new(program: PathBuf) -> Result<Self> {
        let sandbox = TempDir::new().context("Failed to create engine sandbox")?;
        Ok(Self { program, sandbox })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        // flat namespace: no separators, no traversal
        if path.contains('/') || path.contains('\\') || path.contains("..") {
            bail!("Engine paths are a flat namespace, got {:?}", path);
        }
        Ok(self.sandbox.path().join(path))
    }
}

impl Engine for ProcessEngine {
    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let resolved = self.resolve(path)?;
        fs::write(&resolved, data)
            .with_context(|| format!("Failed to write {}", resolved.display()))
    }

    fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        let resolved = self.resolve(path)?;
        fs::read(&resolved).with_context(|| format!("Failed to read {}", resolved.display()))
    }

    fn remove_file(&mut self, path: &str) -> Result<()> {
        let resolved = self.resolve(path)?;
        fs::remove_file(&resolved)
            .with_context(|| format!("Failed to remove {}", resolved.display()))
    }

    fn run(&mut self, args: &[String]) -> Result<EngineRun> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(self.sandbox.path())
            .output()
            .with_context(|| format!("Failed to execute {}", self.program.display()))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        Ok(EngineRun {
            exit_code: output.status.code().unwrap_or(-1),
            output: text,
        })
    }
}

/// Factory for [`ProcessEngine`] instances
#[derive(Debug, Clone)]
pub struct ProcessEngineFactory {
    program: PathBuf,
}

impl ProcessEngineFactory {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Check if the compiler executable can be invoked at all
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .is_ok()
    }
}

impl Default for ProcessEngineFactory {
    fn default() -> Self {
        Self::new(PathBuf::from("openscad"))
    }
}

impl EngineFactory for ProcessEngineFactory {
    fn create(&self) -> Result<Box<dyn Engine>> {
        Ok(Box::new(ProcessEngine::new(self.program.clone())?))
    }
}
