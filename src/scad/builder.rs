// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Builder DSL for composing OpenSCAD source documents
//!
//! ```
//! use scadforge::scad::{CylinderArgs, ScadBuilder};
//!
//! let mut s = ScadBuilder::new();
//! s.cylinder(&CylinderArgs { h: 10.0, r: Some(5.0), fn_: Some(64), ..Default::default() });
//! s.translate([0.0, 0.0, 10.0], |s| {
//!     s.sphere(&scadforge::scad::SphereArgs { r: Some(6.0), ..Default::default() });
//! });
//! let source = s.build();
//! ```

use super::value::ScadValue;
use serde::{Deserialize, Serialize};

/// One point of the mapping from emitted SCAD lines back to generator code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapEntry {
    /// 1-based line number in the emitted SCAD document
    pub emitted_line: usize,
    pub generator_file: String,
    pub generator_line: u32,
}

/// Arguments for `sphere()` / `circle()`
#[derive(Debug, Clone, Default)]
pub struct SphereArgs {
    pub r: Option<f64>,
    pub d: Option<f64>,
    pub fn_: Option<u32>,
}

/// Arguments for `cylinder()`
#[derive(Debug, Clone, Default)]
pub struct CylinderArgs {
    pub h: f64,
    pub r: Option<f64>,
    pub r1: Option<f64>,
    pub r2: Option<f64>,
    pub d: Option<f64>,
    pub d1: Option<f64>,
    pub d2: Option<f64>,
    pub center: Option<bool>,
    pub fn_: Option<u32>,
}

/// Arguments for `linear_extrude()`
#[derive(Debug, Clone, Default)]
pub struct LinearExtrudeArgs {
    pub height: f64,
    pub center: Option<bool>,
    pub twist: Option<f64>,
    pub slices: Option<u32>,
    pub fn_: Option<u32>,
}

/// Arguments for `rotate_extrude()`
#[derive(Debug, Clone, Default)]
pub struct RotateExtrudeArgs {
    pub angle: Option<f64>,
    pub fn_: Option<u32>,
}

/// Incrementally assembles an OpenSCAD source document together with a
/// source map pointing each mapped emitted line back at generator code.
///
/// Block combinators take the body as a closure; the indent cursor is a
/// single mutable field, so bodies must run to completion synchronously.
pub struct ScadBuilder {
    lines: Vec<String>,
    indent: usize,
    map: Vec<SourceMapEntry>,
    generator_file: String,
}

impl ScadBuilder {
    pub fn new() -> Self {
        Self::for_generator("<generator>")
    }

    /// Create a builder whose source-map entries name the given generator
    pub fn for_generator(generator_file: &str) -> Self {
        Self {
            lines: Vec::new(),
            indent: 0,
            map: Vec::new(),
            generator_file: generator_file.to_string(),
        }
    }

    fn emit(&mut self, line: &str) {
        self.emit_at(line, None);
    }

    fn emit_at(&mut self, line: &str, origin_line: Option<u32>) {
        self.lines.push(format!("{}{}", "  ".repeat(self.indent), line));
        if let Some(generator_line) = origin_line {
            // lines.len() is the 1-based position of the line just pushed,
            // so entries are always ascending by emitted_line
            self.map.push(SourceMapEntry {
                emitted_line: self.lines.len(),
                generator_file: self.generator_file.clone(),
                generator_line,
            });
        }
    }

    fn block(&mut self, header: &str, body: impl FnOnce(&mut Self)) {
        self.emit(&format!("{} {{", header));
        self.indent += 1;
        body(self);
        self.indent -= 1;
        self.emit("}");
    }

    fn format_args(pairs: &[(&str, Option<ScadValue>)]) -> String {
        let mut rendered = Vec::new();
        for (key, value) in pairs {
            if let Some(v) = value {
                rendered.push(format_named_arg(key, v));
            }
        }
        rendered.join(", ")
    }

    // ── 3-D primitives ──────────────────────────────────────

    pub fn cube(&mut self, size: [f64; 3], center: bool) {
        self.emit(&format!(
            "cube(size={}, center={});",
            ScadValue::vec3(size),
            center
        ));
    }

    pub fn sphere(&mut self, args: &SphereArgs) {
        let rendered = Self::format_args(&[
            ("r", args.r.map(ScadValue::from)),
            ("d", args.d.map(ScadValue::from)),
            ("fn", args.fn_.map(ScadValue::from)),
        ]);
        self.emit(&format!("sphere({});", rendered));
    }

    pub fn cylinder(&mut self, args: &CylinderArgs) {
        let rendered = Self::format_args(&[
            ("h", Some(ScadValue::from(args.h))),
            ("r", args.r.map(ScadValue::from)),
            ("r1", args.r1.map(ScadValue::from)),
            ("r2", args.r2.map(ScadValue::from)),
            ("d", args.d.map(ScadValue::from)),
            ("d1", args.d1.map(ScadValue::from)),
            ("d2", args.d2.map(ScadValue::from)),
            ("center", args.center.map(ScadValue::from)),
            ("fn", args.fn_.map(ScadValue::from)),
        ]);
        self.emit(&format!("cylinder({});", rendered));
    }

    pub fn polyhedron(&mut self, points: &[[f64; 3]], faces: &[Vec<usize>]) {
        self.emit(&format!(
            "polyhedron(points={}, faces={});",
            ScadValue::points3(points),
            ScadValue::faces(faces)
        ));
    }

    // ── 2-D primitives ──────────────────────────────────────

    pub fn circle(&mut self, args: &SphereArgs) {
        let rendered = Self::format_args(&[
            ("r", args.r.map(ScadValue::from)),
            ("d", args.d.map(ScadValue::from)),
            ("fn", args.fn_.map(ScadValue::from)),
        ]);
        self.emit(&format!("circle({});", rendered));
    }

    pub fn square(&mut self, size: [f64; 2], center: bool) {
        self.emit(&format!(
            "square(size={}, center={});",
            ScadValue::vec2(size),
            center
        ));
    }

    pub fn polygon(&mut self, points: &[[f64; 2]]) {
        self.emit(&format!("polygon(points={});", ScadValue::points2(points)));
    }

    // ── extrusions ──────────────────────────────────────────

    pub fn linear_extrude(&mut self, args: &LinearExtrudeArgs, body: impl FnOnce(&mut Self)) {
        let rendered = Self::format_args(&[
            ("height", Some(ScadValue::from(args.height))),
            ("center", args.center.map(ScadValue::from)),
            ("twist", args.twist.map(ScadValue::from)),
            ("slices", args.slices.map(ScadValue::from)),
            ("fn", args.fn_.map(ScadValue::from)),
        ]);
        self.block(&format!("linear_extrude({})", rendered), body);
    }

    pub fn rotate_extrude(&mut self, args: &RotateExtrudeArgs, body: impl FnOnce(&mut Self)) {
        let rendered = Self::format_args(&[
            ("angle", args.angle.map(ScadValue::from)),
            ("fn", args.fn_.map(ScadValue::from)),
        ]);
        self.block(&format!("rotate_extrude({})", rendered), body);
    }

    // ── boolean ops ─────────────────────────────────────────

    pub fn union(&mut self, body: impl FnOnce(&mut Self)) {
        self.block("union()", body);
    }

    pub fn difference(&mut self, body: impl FnOnce(&mut Self)) {
        self.block("difference()", body);
    }

    pub fn intersection(&mut self, body: impl FnOnce(&mut Self)) {
        self.block("intersection()", body);
    }

    pub fn hull(&mut self, body: impl FnOnce(&mut Self)) {
        self.block("hull()", body);
    }

    pub fn minkowski(&mut self, body: impl FnOnce(&mut Self)) {
        self.block("minkowski()", body);
    }

    // ── transforms ──────────────────────────────────────────

    pub fn translate(&mut self, v: [f64; 3], body: impl FnOnce(&mut Self)) {
        self.block(&format!("translate({})", ScadValue::vec3(v)), body);
    }

    pub fn rotate(&mut self, v: [f64; 3], body: impl FnOnce(&mut Self)) {
        self.block(&format!("rotate({})", ScadValue::vec3(v)), body);
    }

    pub fn scale(&mut self, v: [f64; 3], body: impl FnOnce(&mut Self)) {
        self.block(&format!("scale({})", ScadValue::vec3(v)), body);
    }

    pub fn mirror(&mut self, v: [f64; 3], body: impl FnOnce(&mut Self)) {
        self.block(&format!("mirror({})", ScadValue::vec3(v)), body);
    }

    pub fn color(&mut self, c: &str, body: impl FnOnce(&mut Self)) {
        self.block(&format!("color(\"{}\")", c), body);
    }

    // ── modules ─────────────────────────────────────────────

    pub fn module_decl(&mut self, name: &str, params: &[&str], body: impl FnOnce(&mut Self)) {
        self.block(&format!("module {}({})", name, params.join(", ")), body);
    }

    pub fn module_call(&mut self, name: &str, args: &[(&str, ScadValue)]) {
        if args.is_empty() {
            self.emit(&format!("{}();", name));
        } else {
            let rendered: Vec<String> =
                args.iter().map(|(k, v)| format_named_arg(k, v)).collect();
            self.emit(&format!("{}({});", name, rendered.join(", ")));
        }
    }

    // ── raw SCAD insertion ──────────────────────────────────

    /// Append raw SCAD text, one emitted line per physical line. When an
    /// origin line is given, every emitted line gets a source-map entry
    /// pointing back at it.
    pub fn raw(&mut self, scad: &str, origin_line: Option<u32>) {
        for line in scad.lines() {
            self.emit_at(line, origin_line);
        }
    }

    pub fn comment(&mut self, text: &str) {
        self.emit(&format!("// {}", text));
    }

    // ── output ──────────────────────────────────────────────

    /// The full document, with exactly one trailing newline
    pub fn build(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Immutable snapshot of the source map; later emits never mutate a
    /// previously retrieved map
    pub fn source_map(&self) -> Vec<SourceMapEntry> {
        self.map.clone()
    }

    pub fn reset(&mut self) {
        self.lines.clear();
        self.indent = 0;
        self.map.clear();
    }
}

impl Default for ScadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tessellation keys render with the `$` sigil the compiler expects for
/// its special variables
fn format_named_arg(key: &str, value: &ScadValue) -> String {
    match key {
        "fn" | "fa" | "fs" => format!("${}={}", key, value),
        _ => format!("{}={}", key, value),
    }
}
