// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Binary mesh decoding and validation

mod bbox;
mod stl;
mod validate;

pub use bbox::{compute_bounding_box, BoundingBox};
pub use stl::{parse_binary, DecodeError, ParsedMesh, HEADER_SIZE, TRIANGLE_SIZE};
pub use validate::validate_mesh;
