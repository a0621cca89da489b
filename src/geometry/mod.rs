// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - triangle-soup meshes decoded from kernel output

mod bbox;
mod mesh;

pub use bbox::BoundingBox;
pub use mesh::{Mesh, Triangle, Vertex};
