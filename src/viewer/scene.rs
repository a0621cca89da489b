// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene seam
//!
//! The stage only needs to add a mesh, release one, and present a frame.
//! Lights, camera and the grid belong to whoever implements [`Scene`].

use crate::geometry::Mesh;
use nalgebra::Matrix4;
use std::collections::BTreeMap;

/// Identifies one inserted mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneHandle(u64);

pub trait Scene {
    /// Upload geometry with a model transform
    fn insert(&mut self, mesh: &Mesh, transform: &Matrix4<f32>) -> SceneHandle;

    /// Release the geometry and material behind a handle
    fn dispose(&mut self, handle: SceneHandle);

    /// Draw one frame
    fn present(&mut self);
}

/// In-memory scene used by the CLI and tests
#[derive(Debug, Default)]
pub struct HeadlessScene {
    /// Live geometry, already placed by its model transform
    objects: BTreeMap<SceneHandle, Mesh>,
    next_handle: u64,
    frames: u64,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects inserted and not yet disposed
    pub fn live_objects(&self) -> usize {
        self.objects.len()
    }

    /// Triangles across every live object
    pub fn live_triangles(&self) -> usize {
        self.objects.values().map(Mesh::triangle_count).sum()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }
}

impl Scene for HeadlessScene {
    fn insert(&mut self, mesh: &Mesh, transform: &Matrix4<f32>) -> SceneHandle {
        let mut placed = mesh.clone();
        placed.transform(transform);

        self.next_handle += 1;
        let handle = SceneHandle(self.next_handle);
        self.objects.insert(handle, placed);
        handle
    }

    fn dispose(&mut self, handle: SceneHandle) {
        self.objects.remove(&handle);
    }

    fn present(&mut self) {
        self.frames += 1;
    }
}
