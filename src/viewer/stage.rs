// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Viewer stage: owns the scene and the displayed mesh
//!
//! `Idle` until the first mesh decodes, then `Displaying` for the rest of its
//! life. Each tick drains the render queue at most once.

use super::queue::RenderQueue;
use super::scene::{HeadlessScene, Scene, SceneHandle};
use crate::diagnostics::DiagnosticsPanel;
use crate::geometry::BoundingBox;
use crate::io::{decode_stl, ParseError};
use crate::kernel::RequestId;
use nalgebra::{Matrix4, Point3, Vector3};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Kernel output is Z-up; the scene is Y-up
pub fn display_transform() -> Matrix4<f32> {
    Matrix4::new_rotation(Vector3::x() * -std::f32::consts::FRAC_PI_2)
}

#[derive(Debug)]
struct DisplayedMesh {
    handle: SceneHandle,
    request: RequestId,
    triangles: usize,
    bounds: BoundingBox,
}

/// Observable stage state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageStatus {
    Idle,
    Displaying {
        request: RequestId,
        triangles: usize,
        bounds: BoundingBox,
    },
}

/// What one tick did before presenting
#[derive(Debug)]
pub enum TickOutcome {
    /// Queue was empty
    Unchanged,
    /// A new mesh replaced the displayed one
    Swapped { request: RequestId, triangles: usize },
    /// Pending bytes failed to decode; the previous mesh stays up
    Rejected { request: RequestId, error: ParseError },
}

pub struct ViewerStage<S = HeadlessScene> {
    queue: Arc<RenderQueue>,
    scene: S,
    transform: Matrix4<f32>,
    displayed: Option<DisplayedMesh>,
    panel: Option<Arc<DiagnosticsPanel>>,
}

impl ViewerStage<HeadlessScene> {
    pub fn headless(queue: Arc<RenderQueue>) -> Self {
        Self::new(queue, HeadlessScene::new())
    }
}

impl<S: Scene> ViewerStage<S> {
    pub fn new(queue: Arc<RenderQueue>, scene: S) -> Self {
        Self {
            queue,
            scene,
            transform: display_transform(),
            displayed: None,
            panel: None,
        }
    }

    /// Raise decode failures as alerts on `panel`
    pub fn with_panel(mut self, panel: Arc<DiagnosticsPanel>) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn status(&self) -> StageStatus {
        match &self.displayed {
            None => StageStatus::Idle,
            Some(mesh) => StageStatus::Displaying {
                request: mesh.request,
                triangles: mesh.triangles,
                bounds: mesh.bounds,
            },
        }
    }

    /// One presentation frame
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = match self.queue.drain() {
            None => TickOutcome::Unchanged,
            Some(pending) => match decode_stl(&pending.bytes) {
                Ok(mesh) => {
                    if let Some(previous) = self.displayed.take() {
                        debug!(request = %previous.request, "disposing displayed mesh");
                        self.scene.dispose(previous.handle);
                    }

                    let handle = self.scene.insert(&mesh, &self.transform);
                    let bounds = transform_bounds(&mesh.bounding_box(), &self.transform);

                    info!(
                        request = %pending.request,
                        triangles = mesh.triangle_count(),
                        "displaying mesh"
                    );
                    self.displayed = Some(DisplayedMesh {
                        handle,
                        request: pending.request,
                        triangles: mesh.triangle_count(),
                        bounds,
                    });
                    TickOutcome::Swapped {
                        request: pending.request,
                        triangles: mesh.triangle_count(),
                    }
                }
                Err(error) => {
                    warn!(request = %pending.request, "keeping previous mesh: {}", error);
                    if let Some(panel) = &self.panel {
                        panel.alert(format!("Preview failed: {}", error));
                    }
                    TickOutcome::Rejected {
                        request: pending.request,
                        error,
                    }
                }
            },
        };

        self.scene.present();
        outcome
    }

    /// Tick every `frame_interval` until `shutdown` resolves. Rejected meshes
    /// only reach the log and the panel, if one is attached.
    pub async fn run<F>(mut self, frame_interval: Duration, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        let mut frames = tokio::time::interval(frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = frames.tick() => {
                    self.tick();
                }
            }
        }

        debug!("presentation loop stopped");
        self
    }
}

fn transform_bounds(bounds: &BoundingBox, transform: &Matrix4<f32>) -> BoundingBox {
    if bounds.is_empty() {
        return *bounds;
    }
    let mut out = BoundingBox::empty();
    for x in [bounds.min.x, bounds.max.x] {
        for y in [bounds.min.y, bounds.max.y] {
            for z in [bounds.min.z, bounds.max.z] {
                out.expand_to_include(&transform.transform_point(&Point3::new(x, y, z)));
            }
        }
    }
    out
}
