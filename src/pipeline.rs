// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Command dispatch: editor text in, mesh or diagnostics out
//!
//! Render results are fenced by request id. Only the most recently issued
//! render may touch the render queue or the diagnostics panel; anything older
//! that completes afterwards is dropped.

use crate::config::ForgeConfig;
use crate::diagnostics::{DiagnosticsPanel, ErrorReporter};
use crate::editor::EditorSession;
use crate::kernel::{
    CompileRequest, CompileResult, FailureKind, KernelBackend, KernelSession, OpenScadBackend,
    RequestCounter, RequestId,
};
use crate::viewer::{MeshBytes, RenderQueue};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// User-triggered commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compile and display
    Render,
    /// Compile and write the mesh to a `.stl` file
    Export(PathBuf),
    /// Write the editor text to a script file
    SaveSource(PathBuf),
    /// Load a script file into the editor
    OpenSource(PathBuf),
}

/// How a command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Mesh handed to the viewer
    Queued(RequestId),
    /// A newer render was issued before this one finished
    Superseded(RequestId),
    /// Compile succeeded without publishing (check only)
    Compiled(RequestId),
    Exported {
        request: RequestId,
        path: PathBuf,
        bytes: usize,
    },
    Saved(PathBuf),
    Opened(PathBuf),
    /// Kernel failure; the panel holds the corrected message
    Failed(RequestId),
    /// File I/O failure; an alert was raised
    IoFailed,
}

pub struct Pipeline<B = OpenScadBackend> {
    session: KernelSession<B>,
    queue: Arc<RenderQueue>,
    requests: RequestCounter,
    latest_render: AtomicU64,
    reporter: ErrorReporter,
    panel: Arc<DiagnosticsPanel>,
}

impl Pipeline<OpenScadBackend> {
    pub fn from_config(config: &ForgeConfig, queue: Arc<RenderQueue>) -> Self {
        Self::with_session(KernelSession::from_config(config), config, queue)
    }
}

impl<B: KernelBackend> Pipeline<B> {
    pub fn with_backend(backend: B, config: &ForgeConfig, queue: Arc<RenderQueue>) -> Self {
        Self::with_session(KernelSession::with_backend(backend, config), config, queue)
    }

    fn with_session(session: KernelSession<B>, config: &ForgeConfig, queue: Arc<RenderQueue>) -> Self {
        Self {
            session,
            queue,
            requests: RequestCounter::new(),
            latest_render: AtomicU64::new(0),
            reporter: ErrorReporter::from_config(config),
            panel: Arc::new(DiagnosticsPanel::new()),
        }
    }

    pub fn session(&self) -> &KernelSession<B> {
        &self.session
    }

    pub fn queue(&self) -> &Arc<RenderQueue> {
        &self.queue
    }

    /// Shared with the viewer stage so preview failures surface as alerts
    pub fn panel(&self) -> &Arc<DiagnosticsPanel> {
        &self.panel
    }

    pub async fn dispatch(&self, command: Command, editor: &mut EditorSession) -> CommandOutcome {
        match command {
            Command::Render => self.render(editor).await,
            Command::Export(path) => self.export(editor, path).await,
            Command::SaveSource(path) => self.save_source(editor, path),
            Command::OpenSource(path) => self.open_source(editor, path),
        }
    }

    /// Compile the editor text and queue the mesh for display
    pub async fn render(&self, editor: &EditorSession) -> CommandOutcome {
        let request = self.issue(editor);
        self.latest_render.store(request.id().get(), Ordering::SeqCst);

        let result = self.session.compile(&request).await;

        if self.latest_render.load(Ordering::SeqCst) != request.id().get() {
            debug!(request = %request.id(), "discarding superseded render");
            return CommandOutcome::Superseded(request.id());
        }

        match result {
            CompileResult::Success { mesh_bytes } => {
                self.queue.publish(MeshBytes {
                    request: request.id(),
                    bytes: mesh_bytes,
                });
                self.panel.clear();
                CommandOutcome::Queued(request.id())
            }
            CompileResult::Failure { kind, diagnostics } => {
                self.surface_failure(&request, kind, &diagnostics);
                CommandOutcome::Failed(request.id())
            }
        }
    }

    /// Compile the editor text and report, without touching the viewer
    pub async fn check(&self, editor: &EditorSession) -> CommandOutcome {
        let request = self.issue(editor);
        match self.session.compile(&request).await {
            CompileResult::Success { .. } => {
                self.panel.clear();
                CommandOutcome::Compiled(request.id())
            }
            CompileResult::Failure { kind, diagnostics } => {
                self.surface_failure(&request, kind, &diagnostics);
                CommandOutcome::Failed(request.id())
            }
        }
    }

    /// Compile the editor text and write the mesh to `path`, forcing a
    /// `.stl` extension. Every export runs the kernel again.
    pub async fn export(&self, editor: &EditorSession, path: impl AsRef<Path>) -> CommandOutcome {
        let path = stl_path(path.as_ref());
        let request = self.issue(editor);

        let mesh_bytes = match self.session.compile(&request).await {
            CompileResult::Success { mesh_bytes } => mesh_bytes,
            CompileResult::Failure { kind, diagnostics } => {
                self.surface_failure(&request, kind, &diagnostics);
                return CommandOutcome::Failed(request.id());
            }
        };

        let written = tokio::fs::write(&path, &mesh_bytes)
            .await
            .with_context(|| format!("Failed to write mesh: {:?}", path));

        match written {
            Ok(()) => {
                info!(request = %request.id(), path = %path.display(), "exported mesh");
                self.panel.clear();
                CommandOutcome::Exported {
                    request: request.id(),
                    path,
                    bytes: mesh_bytes.len(),
                }
            }
            Err(err) => self.io_failure("Export failed", err),
        }
    }

    pub fn save_source(&self, editor: &EditorSession, path: impl AsRef<Path>) -> CommandOutcome {
        let path = path.as_ref();
        match editor.save(path) {
            Ok(()) => {
                info!(path = %path.display(), "saved script");
                CommandOutcome::Saved(path.to_path_buf())
            }
            Err(err) => self.io_failure("Save failed", err),
        }
    }

    pub fn open_source(&self, editor: &mut EditorSession, path: impl AsRef<Path>) -> CommandOutcome {
        let path = path.as_ref();
        match editor.open(path) {
            Ok(()) => {
                info!(path = %path.display(), "opened script");
                CommandOutcome::Opened(path.to_path_buf())
            }
            Err(err) => self.io_failure("Open failed", err),
        }
    }

    fn issue(&self, editor: &EditorSession) -> CompileRequest {
        CompileRequest::new(self.requests.next(), editor.get_current_source_text())
    }

    fn surface_failure(&self, request: &CompileRequest, kind: FailureKind, diagnostics: &[String]) {
        match kind {
            FailureKind::Compile => info!(request = %request.id(), "script rejected by kernel"),
            FailureKind::Initialization => error!(request = %request.id(), "kernel failed to start"),
            FailureKind::Timeout => error!(request = %request.id(), "kernel timed out"),
        }
        let message = self.reporter.report(diagnostics, request.source_text());
        self.panel.show(message);
    }

    fn io_failure(&self, prefix: &str, err: anyhow::Error) -> CommandOutcome {
        warn!("{}: {:#}", prefix, err);
        self.panel.alert(format!("{}: {:#}", prefix, err));
        CommandOutcome::IoFailed
    }
}

fn stl_path(path: &Path) -> PathBuf {
    let is_stl = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("stl"))
        .unwrap_or(false);
    if is_stl {
        path.to_path_buf()
    } else {
        path.with_extension("stl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stl_path() {
        assert_eq!(stl_path(Path::new("out/model.stl")), PathBuf::from("out/model.stl"));
        assert_eq!(stl_path(Path::new("out/model.STL")), PathBuf::from("out/model.STL"));
        assert_eq!(stl_path(Path::new("out/model")), PathBuf::from("out/model.stl"));
        assert_eq!(stl_path(Path::new("model.scad")), PathBuf::from("model.stl"));
    }
}
