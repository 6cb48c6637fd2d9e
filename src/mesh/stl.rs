// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Scadforge Contributors

//! Binary STL decoder
//!
//! Layout produced by the compiler's triangle-soup export:
//!   80 bytes  - header (ignored)
//!   4 bytes   - u32 LE triangle count
//!   per triangle (50 bytes):
//!     12 bytes - face normal (3 x f32 LE)
//!     36 bytes - vertices (3 vertices x 3 x f32 LE)
//!     2 bytes  - attribute byte count (ignored)

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 80-byte header plus the 4-byte triangle count
pub const HEADER_SIZE: usize = 84;
pub const TRIANGLE_SIZE: usize = 50;

/// Decoded triangle soup as flat buffers, ready for a viewer's
/// position/normal attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMesh {
    /// Flat x/y/z triples, `triangle_count * 9` entries
    pub vertices: Vec<f32>,
    /// Flat per-vertex normals, same length as `vertices`
    pub normals: Vec<f32>,
    pub triangle_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("STL buffer too small: need at least {HEADER_SIZE} bytes for header + triangle count, got {actual}")]
    TooSmall { actual: usize },
    #[error("STL buffer truncated: expected {expected} bytes for {triangles} triangles, got {actual}")]
    Truncated {
        expected: u64,
        actual: usize,
        triangles: u32,
    },
}

fn read_f32(buffer: &[u8], offset: usize) -> f32 {
    let bytes: [u8; 4] = buffer[offset..offset + 4].try_into().unwrap();
    f32::from_le_bytes(bytes)
}

/// Decode a binary STL buffer into flat vertex/normal arrays.
///
/// The single face normal is copied into all three vertex slots, giving
/// flat per-facet shading.
pub fn parse_binary(buffer: &[u8]) -> Result<ParsedMesh, DecodeError> {
    if buffer.len() < HEADER_SIZE {
        return Err(DecodeError::TooSmall {
            actual: buffer.len(),
        });
    }

    let count_bytes: [u8; 4] = buffer[80..84].try_into().unwrap();
    let triangle_count = u32::from_le_bytes(count_bytes);

    let expected = HEADER_SIZE as u64 + triangle_count as u64 * TRIANGLE_SIZE as u64;
    if (buffer.len() as u64) < expected {
        return Err(DecodeError::Truncated {
            expected,
            actual: buffer.len(),
            triangles: triangle_count,
        });
    }

    let component_count = triangle_count as usize * 9;
    let mut vertices = Vec::with_capacity(component_count);
    let mut normals = Vec::with_capacity(component_count);

    let mut offset = HEADER_SIZE;
    for _ in 0..triangle_count {
        let nx = read_f32(buffer, offset);
        let ny = read_f32(buffer, offset + 4);
        let nz = read_f32(buffer, offset + 8);
        offset += 12;

        for _ in 0..3 {
            vertices.push(read_f32(buffer, offset));
            vertices.push(read_f32(buffer, offset + 4));
            vertices.push(read_f32(buffer, offset + 8));
            offset += 12;

            normals.push(nx);
            normals.push(ny);
            normals.push(nz);
        }

        // attribute byte count
        offset += 2;
    }

    Ok(ParsedMesh {
        vertices,
        normals,
        triangle_count,
    })
}

#[cfg(test)]
pub(crate) fn encode_binary(triangles: &[([f32; 3], [[f32; 3]; 3])]) -> Vec<u8> {
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
