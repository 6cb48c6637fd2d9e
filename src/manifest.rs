// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Parameter metadata - defaults, clamping, and manifest serialization

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A runtime parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Bool(bool),
    Str(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Number(n)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

/// Runtime parameter values keyed by declared name. BTreeMap keeps
/// iteration order deterministic for serialization.
pub type ParameterSet = BTreeMap<String, ParamValue>;

/// One declared model parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    pub default: ParamValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterDef {
    pub fn new(name: &str, default: ParamValue) -> Self {
        Self {
            name: name.to_string(),
            default,
            min: None,
            max: None,
            step: None,
            description: None,
        }
    }

    pub fn number(name: &str, default: f64) -> Self {
        Self::new(name, ParamValue::Number(default))
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Manifest describing a generated model's parameters and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub model: String,
    pub generator_version: String,
    pub generated_at: String,
    pub parameters: Vec<ParameterDef>,
}

/// Merge user-provided values with declared defaults. The result contains
/// exactly the declared names: missing ones are filled from the default,
/// undeclared ones are dropped. Idempotent.
pub fn apply_defaults(params: &ParameterSet, defs: &[ParameterDef]) -> ParameterSet {
    let mut result = ParameterSet::new();
    for def in defs {
        let value = params.get(&def.name).cloned().unwrap_or_else(|| def.default.clone());
        result.insert(def.name.clone(), value);
    }
    result
}

/// Clamp numeric values into their declared `[min, max]` ranges. Values
/// without declared bounds, and non-numeric values, pass through unchanged.
pub fn clamp_parameters(params: &ParameterSet, defs: &[ParameterDef]) -> ParameterSet {
    let mut result = params.clone();
    for def in defs {
        if let Some(ParamValue::Number(n)) = result.get(&def.name) {
            let mut clamped = *n;
            if let Some(min) = def.min {
                clamped = clamped.max(min);
            }
            if let Some(max) = def.max {
                clamped = clamped.min(max);
            }
            result.insert(def.name.clone(), ParamValue::Number(clamped));
        }
    }
    result
}

/// Build a manifest snapshot with a generation timestamp
pub fn create_manifest(
    model_id: &str,
    defs: &[ParameterDef],
    generator_version: Option<&str>,
) -> ModelManifest {
    ModelManifest {
        model: model_id.to_string(),
        generator_version: generator_version.unwrap_or("unknown").to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        parameters: defs.to_vec(),
    }
}

/// Serialize a manifest to pretty JSON for display or export
pub fn serialize_manifest(manifest: &ModelManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("Failed to serialize manifest")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Vec<ParameterDef> {
        vec![
            ParameterDef::number("height", 50.0).with_bounds(10.0, 200.0),
            ParameterDef::number("wall", 2.0),
            ParameterDef::new("label", ParamValue::from("vase")),
        ]
    }

    #[test]
    fn test_apply_defaults_fills_and_drops() {
        let mut params = ParameterSet::new();
        params.insert("height".into(), 80.0.into());
        params.insert("bogus".into(), 1.0.into());

        let resolved = apply_defaults(&params, &defs());
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved["height"], ParamValue::Number(80.0));
        assert_eq!(resolved["wall"], ParamValue::Number(2.0));
        assert!(!resolved.contains_key("bogus"));
    }

    #[test]
    fn test_apply_defaults_idempotent() {
        let mut params = ParameterSet::new();
        params.insert("wall".into(), 3.5.into());

        let once = apply_defaults(&params, &defs());
        let twice = apply_defaults(&once, &defs());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clamp_within_declared_bounds() {
        let mut params = ParameterSet::new();
        params.insert("height".into(), 500.0.into());
        let clamped = clamp_parameters(&params, &defs());
        assert_eq!(clamped["height"], ParamValue::Number(200.0));

        params.insert("height".into(), (-3.0).into());
        let clamped = clamp_parameters(&params, &defs());
        assert_eq!(clamped["height"], ParamValue::Number(10.0));
    }

    #[test]
    fn test_clamp_passes_through_unbounded_and_non_numeric() {
        let mut params = ParameterSet::new();
        params.insert("wall".into(), 9000.0.into());
        params.insert("label".into(), "urn".into());
        let clamped = clamp_parameters(&params, &defs());
        assert_eq!(clamped["wall"], ParamValue::Number(9000.0));
        assert_eq!(clamped["label"], ParamValue::from("urn"));
    }

    #[test]
    fn test_create_manifest_defaults_version() {
        let manifest = create_manifest("vase", &defs(), None);
        assert_eq!(manifest.model, "vase");
        assert_eq!(manifest.generator_version, "unknown");
        assert_eq!(manifest.parameters.len(), 3);
    }

    #[test]
    fn test_serialize_manifest_round_trips() {
        let manifest = create_manifest("vase", &defs(), Some("1.2.0"));
        let json = serialize_manifest(&manifest).unwrap();
        let back: ModelManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
