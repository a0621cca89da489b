// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel backends
//!
//! A backend runs the geometry compiler once against files that already sit
//! in a sandbox directory. It reports the raw diagnostics and whether the run
//! succeeded; reading the artifact back is the session's job.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Errors raised before or around a kernel run, as opposed to the kernel
/// rejecting the source
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("failed to prepare kernel sandbox: {0}")]
    Sandbox(#[source] std::io::Error),

    #[error("failed to start kernel `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("kernel did not finish within {0:?}")]
    Timeout(Duration),

    #[error("failed to collect kernel output: {0}")]
    Io(#[source] std::io::Error),
}

/// One kernel run inside a sandbox
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Sandbox root, also the working directory of the run
    pub sandbox: PathBuf,
    /// Script path inside the sandbox
    pub input: PathBuf,
    /// Where the artifact is expected
    pub output: PathBuf,
    /// Extra kernel arguments
    pub args: Vec<String>,
}

impl Invocation {
    /// `path` relative to the sandbox, or unchanged when it lies outside
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.sandbox).unwrap_or(path)
    }
}

/// What the kernel reported
#[derive(Debug, Clone, Default)]
pub struct KernelRun {
    pub success: bool,
    /// Human-readable exit status
    pub status: String,
    /// Diagnostic lines in emission order
    pub diagnostics: Vec<String>,
}

/// Runs the geometry compiler for one invocation
pub trait KernelBackend: Send + Sync {
    fn invoke(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<KernelRun, KernelError>> + Send;
}

/// Runs the OpenSCAD executable as a child process
#[derive(Debug, Clone)]
pub struct OpenScadBackend {
    program: String,
}

impl OpenScadBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check if the executable can be started
    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok()
    }
}

impl Default for OpenScadBackend {
    fn default() -> Self {
        Self::new("openscad")
    }
}

impl KernelBackend for OpenScadBackend {
    async fn invoke(&self, invocation: &Invocation) -> Result<KernelRun, KernelError> {
        // the child runs inside the sandbox, so it only ever sees bare names
        let mut child = Command::new(&self.program)
            .current_dir(&invocation.sandbox)
            .arg(invocation.relative(&invocation.input))
            .args(&invocation.args)
            .arg("-o")
            .arg(invocation.relative(&invocation.output))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| KernelError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                return Err(KernelError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "kernel output streams were not captured",
                )))
            }
        };

        let diagnostics = collect_lines(stderr, stdout).await?;
        let status = child.wait().await.map_err(KernelError::Io)?;

        Ok(KernelRun {
            success: status.success(),
            status: status.to_string(),
            diagnostics,
        })
    }
}

/// Read both streams to the end, keeping lines in the order they arrive
async fn collect_lines<E, O>(stderr: E, stdout: O) -> Result<Vec<String>, KernelError>
where
    E: AsyncRead + Unpin,
    O: AsyncRead + Unpin,
{
    let mut stderr = BufReader::new(stderr).split(b'\n');
    let mut stdout = BufReader::new(stdout).split(b'\n');
    let (mut stderr_open, mut stdout_open) = (true, true);
    let mut lines = Vec::new();

    while stderr_open || stdout_open {
        tokio::select! {
            segment = stderr.next_segment(), if stderr_open => {
                match segment.map_err(KernelError::Io)? {
                    Some(bytes) => push_line(&mut lines, &bytes),
                    None => stderr_open = false,
                }
            }
            segment = stdout.next_segment(), if stdout_open => {
                match segment.map_err(KernelError::Io)? {
                    Some(bytes) => push_line(&mut lines, &bytes),
                    None => stdout_open = false,
                }
            }
        }
    }

    Ok(lines)
}

fn push_line(lines: &mut Vec<String>, bytes: &[u8]) {
    let line = String::from_utf8_lossy(bytes);
    let line = line.trim_end();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let sandbox = tempfile::TempDir::new().unwrap();
        let backend = OpenScadBackend::new("forge-no-such-kernel");
        let invocation = Invocation {
            sandbox: sandbox.path().to_path_buf(),
            input: sandbox.path().join("input.scad"),
            output: sandbox.path().join("output.stl"),
            args: Vec::new(),
        };

        let result = backend.invoke(&invocation).await;
        assert!(matches!(result, Err(KernelError::Spawn { .. })));
        assert!(!backend.is_available().await);
    }

    #[test]
    fn test_paths_are_sandbox_relative() {
        let invocation = Invocation {
            sandbox: PathBuf::from("/tmp/forge-kernel-abc"),
            input: PathBuf::from("/tmp/forge-kernel-abc/input.scad"),
            output: PathBuf::from("/tmp/forge-kernel-abc/output.stl"),
            args: Vec::new(),
        };
        assert_eq!(invocation.relative(&invocation.input), Path::new("input.scad"));
        assert_eq!(invocation.relative(Path::new("/elsewhere/x.stl")), Path::new("/elsewhere/x.stl"));
    }

    #[tokio::test]
    async fn test_streams_are_merged_in_arrival_order() {
        let (stderr_tx, stderr_rx) = tokio::io::duplex(64);
        let (stdout_tx, stdout_rx) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            let (mut stderr, mut stdout) = (stderr_tx, stdout_tx);
            stderr.write_all(b"WARNING: first\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            stdout.write_all(b"ECHO: second\r\n\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            stderr.write_all(b"ERROR: third").await.unwrap();
        });

        let lines = collect_lines(stderr_rx, stdout_rx).await.unwrap();
        writer.await.unwrap();

        assert_eq!(lines, ["WARNING: first", "ECHO: second", "ERROR: third"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kernel_sees_bare_filename() {
        let sandbox = tempfile::TempDir::new().unwrap();
        let input = sandbox.path().join("input.scad");
        // run the "script" with sh: $0 is the path it was handed
        std::fs::write(&input, "echo \"$0\" >&2\nsleep 0.2\necho \"$2\"\n").unwrap();

        let invocation = Invocation {
            sandbox: sandbox.path().to_path_buf(),
            input,
            output: sandbox.path().join("output.stl"),
            args: Vec::new(),
        };
        let run = OpenScadBackend::new("sh").invoke(&invocation).await.unwrap();

        assert!(run.success);
        assert_eq!(run.diagnostics, ["input.scad", "output.stl"]);
    }
}
