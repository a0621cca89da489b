// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Preview side of the pipeline: pending-mesh slot, scene and frame loop

mod queue;
mod scene;
mod stage;

pub use queue::{MeshBytes, RenderQueue};
pub use scene::{HeadlessScene, Scene, SceneHandle};
pub use stage::{display_transform, StageStatus, TickOutcome, ViewerStage};
