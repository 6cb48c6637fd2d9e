// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Value formatting for emitted OpenSCAD arguments

use std::fmt;

/// A value renderable as an OpenSCAD literal
#[derive(Debug, Clone, PartialEq)]
pub enum ScadValue {
    Number(f64),
    Bool(bool),
    Str(String),
    List(Vec<ScadValue>),
}

impl ScadValue {
    pub fn vec2(v: [f64; 2]) -> Self {
        ScadValue::List(v.iter().map(|&n| ScadValue::Number(n)).collect())
    }

    pub fn vec3(v: [f64; 3]) -> Self {
        ScadValue::List(v.iter().map(|&n| ScadValue::Number(n)).collect())
    }

    /// A list of 2-D points, as taken by `polygon()`
    pub fn points2(points: &[[f64; 2]]) -> Self {
        ScadValue::List(points.iter().map(|&p| ScadValue::vec2(p)).collect())
    }

    /// A list of 3-D points, as taken by `polyhedron()`
    pub fn points3(points: &[[f64; 3]]) -> Self {
        ScadValue::List(points.iter().map(|&p| ScadValue::vec3(p)).collect())
    }

    /// A list of index lists, as taken by `polyhedron(faces=...)`
    pub fn faces(faces: &[Vec<usize>]) -> Self {
        ScadValue::List(
            faces
                .iter()
                .map(|f| ScadValue::List(f.iter().map(|&i| ScadValue::Number(i as f64)).collect()))
                .collect(),
        )
    }
}

impl From<f64> for ScadValue {
    fn from(n: f64) -> Self {
        ScadValue::Number(n)
    }
}

impl From<u32> for ScadValue {
    fn from(n: u32) -> Self {
        ScadValue::Number(n as f64)
    }
}

impl From<bool> for ScadValue {
    fn from(b: bool) -> Self {
        ScadValue::Bool(b)
    }
}

impl From<&str> for ScadValue {
    fn from(s: &str) -> Self {
        ScadValue::Str(s.to_string())
    }
}

impl fmt::Display for ScadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScadValue::Number(n) => f.write_str(&format_number(*n)),
            ScadValue::Bool(b) => write!(f, "{}", b),
            ScadValue::Str(s) => write!(f, "\"{}\"", s),
            ScadValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Format a number for SCAD output: integers without a decimal point,
/// everything else with at most 6 fractional digits and trailing zeros
/// trimmed, so regenerated sources stay deterministic.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{:.0}", n);
    }
    let s = format!("{:.6}", n);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
