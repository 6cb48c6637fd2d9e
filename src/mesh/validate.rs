// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Advisory mesh quality checks

use super::{compute_bounding_box, ParsedMesh};

/// Check basic quality properties of a decoded mesh. Returns a list of
/// human-readable issues; an empty list means no problems were found.
/// Advisory only - a mesh with issues is still returned to the caller.
pub fn validate_mesh(mesh: &ParsedMesh) -> Vec<String> {
    let mut issues = Vec::new();

    if mesh.triangle_count == 0 {
        issues.push("Mesh has zero triangles".to_string());
    }

    let expected = mesh.triangle_count as usize * 9;
    if mesh.vertices.len() != expected {
        issues.push(format!(
            "Vertex buffer length mismatch: expected {}, got {}",
            expected,
            mesh.vertices.len()
        ));
    }
    if mesh.normals.len() != expected {
        issues.push(format!(
            "Normal buffer length mismatch: expected {}, got {}",
            expected,
            mesh.normals.len()
        ));
    }

    let non_finite = mesh.vertices.iter().filter(|c| !c.is_finite()).count();
    if non_finite > 0 {
        issues.push(format!(
            "Found {} non-finite values in vertex data",
            non_finite
        ));
    }

    if mesh.triangle_count > 0 {
        let size = compute_bounding_box(mesh).size();
        if size.x == 0.0 && size.y == 0.0 && size.z == 0.0 {
            issues.push("All vertices are at the same point (degenerate mesh)".to_string());
        }
    }

    issues
}
