// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Forge render/export pipeline
//!
//! Feeds editor text to the OpenSCAD kernel, hands the resulting STL to a
//! preview stage or writes it to disk, and turns kernel diagnostics into
//! messages that point at the user's own lines.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod editor;
pub mod geometry;
pub mod io;
pub mod kernel;
pub mod pipeline;
pub mod viewer;

pub use config::ForgeConfig;
pub use diagnostics::{DiagnosticsPanel, ErrorReporter, NO_ERRORS};
pub use editor::EditorSession;
pub use geometry::{BoundingBox, Mesh};
pub use io::{decode_stl, encode_stl, ParseError};
pub use kernel::{CompileRequest, CompileResult, FailureKind, KernelBackend, KernelSession, RequestId};
pub use pipeline::{Command, CommandOutcome, Pipeline};
pub use viewer::{HeadlessScene, RenderQueue, Scene, TickOutcome, ViewerStage};
