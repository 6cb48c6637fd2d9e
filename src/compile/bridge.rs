// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Compile driver: writes sources, runs the engine, reads the artifact

use super::engine::{Engine, EngineFactory};
use super::process::ProcessEngineFactory;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Reserved name for the primary source inside an engine instance
pub const ENTRY_FILE: &str = "input.scad";
/// Reserved name for the output artifact
pub const OUTPUT_FILE: &str = "output.stl";

/// Injected when the caller sets no tessellation override; the compiler
/// default is visibly coarse
const DEFAULT_FRAGMENT_OVERRIDE: &str = "$fn=64";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("engine failure: {0}")]
    Engine(String),
    #[error("compiler exited with code {0}")]
    ExitStatus(i32),
    #[error("compiler produced an empty artifact")]
    EmptyArtifact,
    #[error("compilation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("library filename {0:?} collides with a reserved path")]
    ReservedPath(String),
    #[error("duplicate library filename {0:?}")]
    DuplicateLibrary(String),
}

/// Options for one compile call
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub timeout: Duration,
    /// `name=value` definitions passed to the compiler as `-D` overrides
    pub overrides: Vec<(String, String)>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            overrides: Vec::new(),
        }
    }
}

/// Outcome of one compile: exactly one variant
#[derive(Debug, Clone)]
pub enum CompileResult {
    Success {
        /// Binary STL artifact bytes
        stl: Vec<u8>,
        raw_output: String,
        /// SHA-256 of the artifact, hex-encoded
        digest: String,
    },
    Failure {
        error: CompileError,
        raw_output: String,
    },
}

impl CompileResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileResult::Success { .. })
    }

    pub fn raw_output(&self) -> &str {
        match self {
            CompileResult::Success { raw_output, .. } => raw_output,
            CompileResult::Failure { raw_output, .. } => raw_output,
        }
    }
}

/// Drives the external geometry compiler. Every `compile` call gets a
/// fresh engine from the factory; the bridge itself holds no engine
/// state, so a `Bridge` may be shared freely.
pub struct Bridge {
    factory: Arc<dyn EngineFactory>,
}

impl Bridge {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self { factory }
    }

    /// Bridge backed by the system `openscad` executable
    pub fn with_openscad() -> Self {
        Self::new(Arc::new(ProcessEngineFactory::default()))
    }

    /// Compile a SCAD source document to a binary STL artifact.
    ///
    /// Library sources are written into the engine first, the primary
    /// source last under the reserved entry name. The engine run is raced
    /// against the timeout on a worker thread; on timeout the run is
    /// abandoned, not stopped - the detached thread finishes (or hangs)
    /// on its own and its result is discarded.
    pub fn compile(
        &self,
        source: &str,
        libraries: &[(String, String)],
        options: &CompileOptions,
    ) -> CompileResult {
        let mut seen = HashSet::new();
        for (name, _) in libraries {
            if name == ENTRY_FILE || name == OUTPUT_FILE {
                return CompileResult::Failure {
                    error: CompileError::ReservedPath(name.clone()),
                    raw_output: String::new(),
                };
            }
            if !seen.insert(name.clone()) {
                return CompileResult::Failure {
                    error: CompileError::DuplicateLibrary(name.clone()),
                    raw_output: String::new(),
                };
            }
        }

        let (tx, rx) = mpsc::channel();
        let factory = Arc::clone(&self.factory);
        let source = source.to_string();
        let libraries = libraries.to_vec();
        let overrides = options.overrides.clone();

        thread::spawn(move || {
            let result = match factory.create() {
                Ok(mut engine) => run_compile(engine.as_mut(), &source, &libraries, &overrides),
                Err(e) => CompileResult::Failure {
                    error: CompileError::Engine(format!("failed to create engine: {e:#}")),
                    raw_output: String::new(),
                },
            };
            // receiver may be gone after a timeout
            let _ = tx.send(result);
        });

        match rx.recv_timeout(options.timeout) {
            Ok(result) => result,
            Err(_) => CompileResult::Failure {
                error: CompileError::Timeout(options.timeout),
                raw_output: String::new(),
            },
        }
    }
}

fn run_compile(
    engine: &mut dyn Engine,
    source: &str,
    libraries: &[(String, String)],
    overrides: &[(String, String)],
) -> CompileResult {
    let result = write_and_run(engine, source, libraries, overrides);

    // cleanup is attempted regardless of outcome, failures swallowed
    for (name, _) in libraries {
        let _ = engine.remove_file(name);
    }
    let _ = engine.remove_file(ENTRY_FILE);
    let _ = engine.remove_file(OUTPUT_FILE);

    result
}

fn write_and_run(
    engine: &mut dyn Engine,
    source: &str,
    libraries: &[(String, String)],
    overrides: &[(String, String)],
) -> CompileResult {
    for (name, text) in libraries {
        if let Err(e) = engine.write_file(name, text.as_bytes()) {
            return CompileResult::Failure {
                error: CompileError::Engine(format!("failed to write library {name:?}: {e:#}")),
                raw_output: String::new(),
            };
        }
    }
    if let Err(e) = engine.write_file(ENTRY_FILE, source.as_bytes()) {
        return CompileResult::Failure {
            error: CompileError::Engine(format!("failed to write source: {e:#}")),
            raw_output: String::new(),
        };
    }

    let mut args: Vec<String> = vec![ENTRY_FILE.to_string(), "-o".to_string(), OUTPUT_FILE.to_string()];
    if !overrides.iter().any(|(name, _)| name == "$fn") {
        args.push("-D".to_string());
        args.push(DEFAULT_FRAGMENT_OVERRIDE.to_string());
    }
    for (name, value) in overrides {
        args.push("-D".to_string());
        args.push(format!("{name}={value}"));
    }

    let run = match engine.run(&args) {
        Ok(run) => run,
        Err(e) => {
            return CompileResult::Failure {
                error: CompileError::Engine(format!("engine run failed: {e:#}")),
                raw_output: String::new(),
            }
        }
    };

    if run.exit_code != 0 {
        return CompileResult::Failure {
            error: CompileError::ExitStatus(run.exit_code),
            raw_output: run.output,
        };
    }

    match engine.read_file(OUTPUT_FILE) {
        Ok(stl) if stl.is_empty() => CompileResult::Failure {
            error: CompileError::EmptyArtifact,
            raw_output: run.output,
        },
        Ok(stl) => {
            let digest = format!("{:x}", Sha256::digest(&stl));
            CompileResult::Success {
                stl,
                raw_output: run.output,
                digest,
            }
        }
        Err(e) => CompileResult::Failure {
            error: CompileError::Engine(format!("failed to read artifact: {e:#}")),
            raw_output: run.output,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::super::engine::EngineRun;
    use super::*;
    use anyhow::{anyhow, Result};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Scripted engine: canned exit code, output text, and artifact;
    /// records writes and run arguments for assertions.
    struct StubEngine {
        files: HashMap<String, Vec<u8>>,
        exit_code: i32,
        output_text: String,
        artifact: Option<Vec<u8>>,
        delay: Option<Duration>,
        trace: Arc<Mutex<Vec<String>>>,
    }

    impl Engine for StubEngine {
        fn write_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
            self.trace.lock().unwrap().push(format!("write {path}"));
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

        fn run(&mut self, args: &[String]) -> Result<EngineRun> {
            self.trace
                .lock()
                .unwrap()
                .push(format!("run {}", args.join(" ")));
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            if self.exit_code == 0 {
                if let Some(artifact) = &self.artifact {
                    self.files.insert(OUTPUT_FILE.to_string(), artifact.clone());
                }
            }
            Ok(EngineRun {
                exit_code: self.exit_code,
                output: self.output_text.clone(),
            })
        }
    }

    #[derive(Clone)]
    struct StubFactory {
        exit_code: i32,
        output_text: String,
        artifact: Option<Vec<u8>>,
        delay: Option<Duration>,
        trace: Arc<Mutex<Vec<String>>>,
        created: Arc<Mutex<usize>>,
    }

    impl StubFactory {
        fn succeeding(artifact: Vec<u8>) -> Self {
            Self {
                exit_code: 0,
                output_text: String::new(),
                artifact: Some(artifact),
                delay: None,
                trace: Arc::new(Mutex::new(Vec::new())),
                created: Arc::new(Mutex::new(0)),
            }
        }

        fn failing(exit_code: i32, output_text: &str) -> Self {
            Self {
                exit_code,
                output_text: output_text.to_string(),
                artifact: None,
                delay: None,
                trace: Arc::new(Mutex::new(Vec::new())),
                created: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl EngineFactory for StubFactory {
        fn create(&self) -> Result<Box<dyn Engine>> {
            *self.created.lock().unwrap() += 1;
            Ok(Box::new(StubEngine {
                files: HashMap::new(),
                exit_code: self.exit_code,
                output_text: self.output_text.clone(),
                artifact: self.artifact.clone(),
                delay: self.delay,
                trace: Arc::clone(&self.trace),
            }))
        }
    }

    #[test]
    fn test_success_requires_artifact() {
        let factory = StubFactory::succeeding(vec![1, 2, 3]);
        let bridge = Bridge::new(Arc::new(factory));
        let result = bridge.compile("cube(1);\n", &[], &CompileOptions::default());
        match result {
            CompileResult::Success { stl, digest, .. } => {
                assert_eq!(stl, vec![1, 2, 3]);
                assert_eq!(digest.len(), 64);
            }
            CompileResult::Failure { error, .. } => panic!("unexpected failure: {error}"),
        }
    }

    #[test]
    fn test_nonzero_exit_is_failure_with_raw_text() {
        let factory = StubFactory::failing(1, "ERROR: input.scad:1: syntax error");
        let bridge = Bridge::new(Arc::new(factory));
        let result = bridge.compile("cube(1;\n", &[], &CompileOptions::default());
        match result {
            CompileResult::Failure { error, raw_output } => {
                assert_eq!(error, CompileError::ExitStatus(1));
                assert!(raw_output.contains("syntax error"));
            }
            CompileResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn test_empty_artifact_is_failure() {
        let factory = StubFactory::succeeding(Vec::new());
        let bridge = Bridge::new(Arc::new(factory));
        let result = bridge.compile("cube(1);\n", &[], &CompileOptions::default());
        match result {
            CompileResult::Failure { error, .. } => {
                assert_eq!(error, CompileError::EmptyArtifact)
            }
            CompileResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn test_libraries_written_before_entry_file() {
        let factory = StubFactory::succeeding(vec![0]);
        let trace = Arc::clone(&factory.trace);
        let bridge = Bridge::new(Arc::new(factory));
        let libs = vec![("threads.scad".to_string(), "module t() {}".to_string())];
        bridge.compile("use <threads.scad>;\n", &libs, &CompileOptions::default());

        let trace = trace.lock().unwrap();
        assert_eq!(trace[0], "write threads.scad");
        assert_eq!(trace[1], format!("write {ENTRY_FILE}"));
    }

    #[test]
    fn test_fragment_override_injected_by_default() {
        let factory = StubFactory::succeeding(vec![0]);
        let trace = Arc::clone(&factory.trace);
        let bridge = Bridge::new(Arc::new(factory));
        bridge.compile("sphere(5);\n", &[], &CompileOptions::default());

        let trace = trace.lock().unwrap();
        let run_line = trace.iter().find(|l| l.starts_with("run")).unwrap();
        assert!(run_line.contains("-D $fn=64"));
    }

    #[test]
    fn test_fragment_override_not_injected_when_caller_sets_it() {
        let factory = StubFactory::succeeding(vec![0]);
        let trace = Arc::clone(&factory.trace);
        let bridge = Bridge::new(Arc::new(factory));
        let options = CompileOptions {
            overrides: vec![("$fn".to_string(), "16".to_string())],
            ..Default::default()
        };
        bridge.compile("sphere(5);\n", &[], &options);

        let trace = trace.lock().unwrap();
        let run_line = trace.iter().find(|l| l.starts_with("run")).unwrap();
        assert!(run_line.contains("-D $fn=16"));
        assert!(!run_line.contains("$fn=64"));
    }

    #[test]
    fn test_reserved_and_duplicate_library_names_rejected() {
        let factory = StubFactory::succeeding(vec![0]);
        let bridge = Bridge::new(Arc::new(factory));

        let libs = vec![(ENTRY_FILE.to_string(), String::new())];
        match bridge.compile("", &libs, &CompileOptions::default()) {
            CompileResult::Failure { error, .. } => {
                assert_eq!(error, CompileError::ReservedPath(ENTRY_FILE.to_string()))
            }
            _ => panic!("expected failure"),
        }

        let libs = vec![
            ("a.scad".to_string(), String::new()),
            ("a.scad".to_string(), String::new()),
        ];
        match bridge.compile("", &libs, &CompileOptions::default()) {
            CompileResult::Failure { error, .. } => {
                assert_eq!(error, CompileError::DuplicateLibrary("a.scad".to_string()))
            }
            _ => panic!("expected failure"),
        }
    }

    #[test]
    fn test_fresh_engine_per_compile() {
        let factory = StubFactory::succeeding(vec![0]);
        let created = Arc::clone(&factory.created);
        let bridge = Bridge::new(Arc::new(factory));
        bridge.compile("cube(1);\n", &[], &CompileOptions::default());
        bridge.compile("cube(2);\n", &[], &CompileOptions::default());
        assert_eq!(*created.lock().unwrap(), 2);
    }

    #[test]
    fn test_timeout_fires_within_margin() {
        let mut factory = StubFactory::succeeding(vec![0]);
        factory.delay = Some(Duration::from_millis(500));
        let bridge = Bridge::new(Arc::new(factory));
        let options = CompileOptions {
            timeout: Duration::from_millis(50),
            ..Default::default()
        };

        let start = Instant::now();
        let result = bridge.compile("sphere(100);\n", &[], &options);
        let elapsed = start.elapsed();

        match result {
            CompileResult::Failure { error, .. } => {
                assert_eq!(error, CompileError::Timeout(Duration::from_millis(50)))
            }
            CompileResult::Success { .. } => panic!("expected timeout"),
        }
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(400), "timeout took {elapsed:?}");
    }
}
