// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! OpenSCAD source generation - builder DSL, value formatting, source maps

mod builder;
mod value;

pub use builder::{
    CylinderArgs, LinearExtrudeArgs, RotateExtrudeArgs, ScadBuilder, SourceMapEntry, SphereArgs,
};
pub use value::{format_number, ScadValue};
