// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Bounding box utilities

use super::ParsedMesh;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// The conventional empty extremes; callers must treat this as "no data"
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn expand_to_include(&mut self, point: &Point3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn size(&self) -> Vector3<f32> {
        Vector3::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }
}

/// Component-wise min/max over every vertex of a decoded mesh. An empty
/// mesh yields `BoundingBox::empty()`.
pub fn compute_bounding_box(mesh: &ParsedMesh) -> BoundingBox {
    let mut bbox = BoundingBox::empty();
    for triple in mesh.vertices.chunks_exact(3) {
        bbox.expand_to_include(&Point3::new(triple[0], triple[1], triple[2]));
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::super::stl::encode_binary;
    use super::super::parse_binary;
    use super::*;

    #[test]
    fn test_bounding_box_of_single_triangle() {
        let buffer = encode_binary(&[(
            [0.0, 0.0, 1.0],
            [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 5.0, 3.0]],
        )]);
        let mesh = parse_binary(&buffer).unwrap();
        let bbox = compute_bounding_box(&mesh);
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3::new(10.0, 5.0, 3.0));
        assert_eq!(bbox.size(), Vector3::new(10.0, 5.0, 3.0));
    }

    #[test]
    fn test_bounding_box_of_empty_mesh() {
        let mesh = ParsedMesh {
            vertices: Vec::new(),
            normals: Vec::new(),
            triangle_count: 0,
        };
        let bbox = compute_bounding_box(&mesh);
        assert!(bbox.is_empty());
        assert_eq!(bbox.min.x, f32::INFINITY);
        assert_eq!(bbox.max.x, f32::NEG_INFINITY);
    }
}
