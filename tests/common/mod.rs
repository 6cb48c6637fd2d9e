// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Shared test fixtures: scripted stub engine and binary STL encoding

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use scadforge::compile::{Engine, EngineFactory, EngineRun, OUTPUT_FILE};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Encode triangles as `(normal, [v0, v1, v2])` into the fixed binary
/// STL layout used by the compiler
pub fn encode_stl(triangles: &[([f32; 3], [[f32; 3]; 3])]) -> Vec<u8> {
    let mut buffer = vec![0u8; 80];
    buffer.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for (normal, vertices) in triangles {
        for c in normal {
            buffer.extend_from_slice(&c.to_le_bytes());
        }
        for vertex in vertices {
            for c in vertex {
                buffer.extend_from_slice(&c.to_le_bytes());
            }
        }
        buffer.extend_from_slice(&0u16.to_le_bytes());
    }
    buffer
}

/// Binary STL for an axis-aligned cube spanning `[0, size]` on each axis,
/// triangulated into the 12 facets a real compiler export produces
pub fn cube_stl(size: f32) -> Vec<u8> {
    let s = size;
    let v = [
        [0.0, 0.0, 0.0],
        [s, 0.0, 0.0],
        [s, s, 0.0],
        [0.0, s, 0.0],
        [0.0, 0.0, s],
        [s, 0.0, s],
        [s, s, s],
        [0.0, s, s],
    ];
    let faces: [([f32; 3], [usize; 3], [usize; 3]); 6] = [
        ([0.0, 0.0, -1.0], [0, 2, 1], [0, 3, 2]),
        ([0.0, 0.0, 1.0], [4, 5, 6], [4, 6, 7]),
        ([0.0, -1.0, 0.0], [0, 1, 5], [0, 5, 4]),
        ([0.0, 1.0, 0.0], [3, 7, 6], [3, 6, 2]),
        ([-1.0, 0.0, 0.0], [0, 4, 7], [0, 7, 3]),
        ([1.0, 0.0, 0.0], [1, 2, 6], [1, 6, 5]),
    ];

    let mut triangles = Vec::with_capacity(12);
    for (normal, a, b) in &faces {
        triangles.push((*normal, [v[a[0]], v[a[1]], v[a[2]]]));
        triangles.push((*normal, [v[b[0]], v[b[1]], v[b[2]]]));
    }
    encode_stl(&triangles)
}

/// Scripted engine with canned exit code, diagnostic text, artifact, and
/// an optional induced delay for timeout tests
pub struct StubEngine {
    files: HashMap<String, Vec<u8>>,
    script: StubScript,
}

#[derive(Clone)]
pub struct StubScript {
    pub exit_code: i32,
    pub output_text: String,
    pub artifact: Option<Vec<u8>>,
    pub delay: Option<Duration>,
}

impl StubScript {
    pub fn success(artifact: Vec<u8>) -> Self {
        Self {
            exit_code: 0,
            output_text: String::new(),
            artifact: Some(artifact),
            delay: None,
        }
    }

    pub fn failure(exit_code: i32, output_text: &str) -> Self {
        Self {
            exit_code,
            output_text: output_text.to_string(),
            artifact: None,
            delay: None,
        }
    }
}

impl Engine for StubEngine {
    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.files.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such file: {path}"))
    }

    fn remove_file(&mut self, path: &str) -> Result<()> {
        self.files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow!("no such file: {path}"))
    }

    fn run(&mut self, _args: &[String]) -> Result<EngineRun> {
        if let Some(delay) = self.script.delay {
            std::thread::sleep(delay);
        }
        if self.script.exit_code == 0 {
            if let Some(artifact) = &self.script.artifact {
                self.files.insert(OUTPUT_FILE.to_string(), artifact.clone());
            }
        }
        Ok(EngineRun {
            exit_code: self.script.exit_code,
            output: self.script.output_text.clone(),
        })
    }
}

/// Hands a fresh scripted engine to every compile, recording the sources
/// each engine received
pub struct StubFactory {
    script: StubScript,
    pub compiled_sources: Arc<Mutex<Vec<String>>>,
}

impl StubFactory {
    pub fn new(script: StubScript) -> Self {
        Self {
            script,
            compiled_sources: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl EngineFactory for StubFactory {
    fn create(&self) -> Result<Box<dyn Engine>> {
        Ok(Box::new(RecordingEngine {
            inner: StubEngine {
                files: HashMap::new(),
                script: self.script.clone(),
            },
            sources: Arc::clone(&self.compiled_sources),
        }))
    }
}

struct RecordingEngine {
    inner: StubEngine,
    sources: Arc<Mutex<Vec<String>>>,
}

impl Engine for RecordingEngine {
    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
        if path == scadforge::compile::ENTRY_FILE {
            self.sources
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(data).into_owned());
        }
        self.inner.write_file(path, data)
    }

    fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        self.inner.read_file(path)
    }

    fn remove_file(&mut self, path: &str) -> Result<()> {
        self.inner.remove_file(path)
    }

    fn run(&mut self, args: &[String]) -> Result<EngineRun> {
        self.inner.run(args)
    }
}
