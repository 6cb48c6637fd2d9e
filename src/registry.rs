// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Model registry - validated descriptors with versioned revisions
//!
//! A model is either a well-formed descriptor or rejected at registration;
//! nothing is probed at call time. Revisions form an explicit cache keyed
//! by `(model id, revision)` with an `invalidate` operation, replacing
//! any notion of hot-reloading generator code.

use crate::manifest::{ParameterDef, ParameterSet};
use crate::scad::ScadBuilder;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Raised when model generator code fails while building the document
#[derive(Debug, Clone, Error)]
#[error("model generator failed: {message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Generator callback: emits the model into the builder for the resolved
/// parameter set
pub type GeneratorFn =
    dyn Fn(&ParameterSet, &mut ScadBuilder) -> Result<(), GenerationError> + Send + Sync;

/// A complete, validated model definition
#[derive(Clone)]
pub struct ModelDescriptor {
    pub id: String,
    pub revision: u64,
    pub generator_version: String,
    pub parameter_defs: Vec<ParameterDef>,
    /// Auxiliary library sources written into the engine before compiling
    pub libraries: Vec<(String, String)>,
    pub generator: Arc<GeneratorFn>,
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("id", &self.id)
            .field("revision", &self.revision)
            .field("generator_version", &self.generator_version)
            .field("parameter_defs", &self.parameter_defs.len())
            .field("libraries", &self.libraries.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("model id must not be empty")]
    EmptyId,
    #[error("model {id:?} revision {revision} is already registered")]
    DuplicateRevision { id: String, revision: u64 },
    #[error("model {id:?} declares parameter {name:?} more than once")]
    DuplicateParameter { id: String, name: String },
    #[error("model {id:?} parameter {name:?} has min > max")]
    InvalidBounds { id: String, name: String },
}

/// Registry of validated model descriptors, versioned by revision
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, BTreeMap<u64, Arc<ModelDescriptor>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a descriptor. Rejects malformed models outright.
    pub fn register(&mut self, descriptor: ModelDescriptor) -> Result<(), RegistryError> {
        validate_descriptor(&descriptor)?;

        let revisions = self.models.entry(descriptor.id.clone()).or_default();
        if revisions.contains_key(&descriptor.revision) {
            return Err(RegistryError::DuplicateRevision {
                id: descriptor.id,
                revision: descriptor.revision,
            });
        }
        revisions.insert(descriptor.revision, Arc::new(descriptor));
        Ok(())
    }

    pub fn get(&self, id: &str, revision: u64) -> Option<Arc<ModelDescriptor>> {
        self.models.get(id)?.get(&revision).cloned()
    }

    /// Highest registered revision of a model
    pub fn latest(&self, id: &str) -> Option<Arc<ModelDescriptor>> {
        self.models
            .get(id)?
            .values()
            .next_back()
            .cloned()
    }

    /// Drop every cached revision of a model; returns how many were removed
    pub fn invalidate(&mut self, id: &str) -> usize {
        self.models.remove(id).map(|r| r.len()).unwrap_or(0)
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }
}

fn validate_descriptor(descriptor: &ModelDescriptor) -> Result<(), RegistryError> {
    if descriptor.id.is_empty() {
        return Err(RegistryError::EmptyId);
    }

    let mut names = HashSet::new();
    for def in &descriptor.parameter_defs {
        if !names.insert(def.name.as_str()) {
            return Err(RegistryError::DuplicateParameter {
                id: descriptor.id.clone(),
                name: def.name.clone(),
            });
        }
        if let (Some(min), Some(max)) = (def.min, def.max) {
            if min > max {
                return Err(RegistryError::InvalidBounds {
                    id: descriptor.id.clone(),
                    name: def.name.clone(),
                });
            }
        }
    }

    Ok(())
}
