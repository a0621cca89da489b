// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tests against a real OpenSCAD executable. Skipped when none is installed.

use forge::kernel::{CompileRequest, KernelSession, RequestCounter};
use forge::{decode_stl, CompileResult, EditorSession, ForgeConfig, Pipeline, RenderQueue};
use std::sync::Arc;

fn config() -> Option<ForgeConfig> {
    let mut config = ForgeConfig::load().ok()?;
    // older releases reject experimental feature flags
    config.kernel_args.clear();
    Some(config)
}

async fn session() -> Option<KernelSession> {
    let session = KernelSession::from_config(&config()?);
    if session.backend().is_available().await {
        Some(session)
    } else {
        println!("OpenSCAD not found, skipping");
        None
    }
}

#[tokio::test]
async fn test_openscad_cube_compiles() {
    let Some(session) = session().await else {
        return;
    };
    let request = CompileRequest::new(RequestCounter::new().next(), "cube([10, 10, 10]);");

    let result = session.compile(&request).await;

    let bytes = result.mesh_bytes().expect("cube should compile");
    assert!(!bytes.is_empty());
    let mesh = decode_stl(bytes).expect("kernel output should parse");
    assert!(mesh.triangle_count() >= 12);
}

#[tokio::test]
async fn test_openscad_syntax_error_fails() {
    let Some(session) = session().await else {
        return;
    };
    let request = CompileRequest::new(RequestCounter::new().next(), "cube([10, 10, 10]");

    let result = session.compile(&request).await;

    assert!(matches!(result, CompileResult::Failure { .. }));
    assert!(result.mesh_bytes().is_none());
    assert!(!result.diagnostics().is_empty());
}

#[tokio::test]
async fn test_openscad_error_points_at_editor_line() {
    if session().await.is_none() {
        return;
    }
    let Some(config) = config() else {
        return;
    };
    let pipeline = Pipeline::from_config(&config, Arc::new(RenderQueue::new()));
    let editor = EditorSession::new("a = 1;\nb = 2;\ncube(;\nc = 3;");

    pipeline.render(&editor).await;

    let message = pipeline.panel().message();
    assert!(message.contains("line 3"), "unexpected message: {}", message);
    assert!(!message.contains("input.scad"));
    assert!(!message.contains("forge-kernel"));
}
