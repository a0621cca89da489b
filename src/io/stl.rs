// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL codec
//!
//! Kernel output arrives as opaque bytes in either the ASCII or the binary
//! STL encoding. `stl_io` detects the encoding; facets are expanded back into
//! a triangle soup so every facet keeps its own normal.

use crate::geometry::Mesh;
use nalgebra::{Point3, Vector3};
use std::io::Cursor;
use thiserror::Error;

/// Failure to turn kernel bytes into displayable geometry
#[derive(Debug, Error)]
pub enum ParseError {
    /// Bytes are neither valid ASCII nor binary STL
    #[error("malformed STL data: {0}")]
    Malformed(#[from] std::io::Error),

    /// Well-formed STL with no facets
    #[error("STL data contains no facets")]
    Empty,
}

/// Decode STL bytes into a mesh with at least one facet
pub fn decode_stl(bytes: &[u8]) -> Result<Mesh, ParseError> {
    let mut cursor = Cursor::new(bytes);
    let stl = stl_io::read_stl(&mut cursor)?;

    if stl.faces.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut mesh = Mesh::with_capacity(stl.faces.len() * 3, stl.faces.len());
    for face in &stl.faces {
        let corner = |i: usize| {
            let v = &stl.vertices[face.vertices[i]];
            Point3::new(v[0], v[1], v[2])
        };
        let normal = Vector3::new(face.normal[0], face.normal[1], face.normal[2]);
        mesh.push_facet(normal, [corner(0), corner(1), corner(2)]);
    }

    Ok(mesh)
}

/// Encode a mesh as binary STL, recomputing facet normals from geometry
pub fn encode_stl(mesh: &Mesh) -> std::io::Result<Vec<u8>> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let [a, b, c] = tri.indices.map(|i| {
                let p = mesh.vertices[i].position;
                StlVertex::new([p.x, p.y, p.z])
            });
            let normal = tri.face_normal(mesh);

            StlTriangle {
                normal: Normal::new([normal.x, normal.y, normal.z]),
                vertices: [a, b, c],
            }
        })
        .collect();

    let mut buffer = Vec::with_capacity(84 + triangles.len() * 50);
    stl_io::write_stl(&mut buffer, triangles.iter())?;
    Ok(buffer)
}
