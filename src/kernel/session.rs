// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel session: sandboxed, serialized compiles

use super::backend::{Invocation, KernelBackend, KernelError, OpenScadBackend};
use super::request::{CompileRequest, CompileResult, FailureKind};
use crate::config::ForgeConfig;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Lines written ahead of the editor text in the sandbox script. Kernel line
/// numbers are offset by this much.
pub const SCRIPT_HEADER_LINES: usize = 1;

/// Sandbox copy of the script: one header comment, then the text verbatim
pub fn sandbox_script(request: &CompileRequest) -> String {
    format!("// forge request {}\n{}", request.id(), request.source_text())
}

/// Compiles requests with a fresh sandbox per call.
///
/// Calls through one session never overlap: the gate is held from sandbox
/// creation until the artifact has been read back.
pub struct KernelSession<B = OpenScadBackend> {
    backend: B,
    gate: Mutex<()>,
    timeout: Duration,
    args: Vec<String>,
    input_filename: String,
    output_filename: String,
}

impl KernelSession<OpenScadBackend> {
    /// Session running the OpenSCAD executable named in the config
    pub fn from_config(config: &ForgeConfig) -> Self {
        Self::with_backend(OpenScadBackend::new(config.openscad_path.clone()), config)
    }
}

impl<B: KernelBackend> KernelSession<B> {
    pub fn with_backend(backend: B, config: &ForgeConfig) -> Self {
        Self {
            backend,
            gate: Mutex::new(()),
            timeout: config.compile_timeout(),
            args: config.kernel_args.clone(),
            input_filename: config.input_filename.clone(),
            output_filename: config.output_filename.clone(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Compile one request. Always yields exactly one result.
    pub async fn compile(&self, request: &CompileRequest) -> CompileResult {
        let _guard = self.gate.lock().await;
        let start = Instant::now();

        debug!(
            request = %request.id(),
            source = %request.fingerprint(),
            "starting kernel run"
        );

        let result = match self.run(request).await {
            Ok(result) => result,
            Err(err) => {
                let kind = match err {
                    KernelError::Timeout(_) => FailureKind::Timeout,
                    _ => FailureKind::Initialization,
                };
                error!(request = %request.id(), ?kind, "kernel run aborted: {}", err);
                CompileResult::failure(kind, vec![err.to_string()])
            }
        };

        match &result {
            CompileResult::Success { mesh_bytes } => info!(
                request = %request.id(),
                bytes = mesh_bytes.len(),
                elapsed = ?start.elapsed(),
                "kernel produced mesh"
            ),
            CompileResult::Failure { kind, diagnostics } => warn!(
                request = %request.id(),
                ?kind,
                lines = diagnostics.len(),
                elapsed = ?start.elapsed(),
                "kernel run failed"
            ),
        }

        result
    }

    async fn run(&self, request: &CompileRequest) -> Result<CompileResult, KernelError> {
        let sandbox = TempDir::with_prefix("forge-kernel-").map_err(KernelError::Sandbox)?;
        let invocation = Invocation {
            sandbox: sandbox.path().to_path_buf(),
            input: sandbox.path().join(&self.input_filename),
            output: sandbox.path().join(&self.output_filename),
            args: self.args.clone(),
        };

        tokio::fs::write(&invocation.input, sandbox_script(request))
            .await
            .map_err(KernelError::Sandbox)?;

        let run = tokio::time::timeout(self.timeout, self.backend.invoke(&invocation))
            .await
            .map_err(|_| KernelError::Timeout(self.timeout))??;

        let mut diagnostics = run.diagnostics;
        if !run.success {
            diagnostics.push(format!("ERROR: kernel exited with {}", run.status));
            return Ok(CompileResult::failure(FailureKind::Compile, diagnostics));
        }

        match tokio::fs::read(&invocation.output).await {
            Ok(mesh_bytes) if !mesh_bytes.is_empty() => Ok(CompileResult::Success { mesh_bytes }),
            Ok(_) => {
                diagnostics.push("ERROR: kernel produced an empty mesh".to_string());
                Ok(CompileResult::failure(FailureKind::Compile, diagnostics))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                diagnostics.push("ERROR: kernel produced no mesh".to_string());
                Ok(CompileResult::failure(FailureKind::Compile, diagnostics))
            }
            Err(err) => Err(KernelError::Io(err)),
        }
        // sandbox removed on drop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorReporter;
    use crate::kernel::{KernelRun, RequestCounter};

    /// Writes a fixed artifact, or fails when the script contains `fail`
    struct ScriptedBackend {
        artifact: Vec<u8>,
        delay: Duration,
    }

    impl KernelBackend for ScriptedBackend {
        async fn invoke(&self, invocation: &Invocation) -> Result<KernelRun, KernelError> {
            tokio::time::sleep(self.delay).await;
            let script = std::fs::read_to_string(&invocation.input).map_err(KernelError::Io)?;
            if let Some(index) = script.lines().position(|l| l.contains("fail")) {
                return Ok(KernelRun {
                    success: false,
                    status: "exit status: 1".into(),
                    diagnostics: vec![format!(
                        "ERROR: Parser error in file {}, line {}: syntax error",
                        invocation.input.display(),
                        index + 1
                    )],
                });
            }
            std::fs::write(&invocation.output, &self.artifact).map_err(KernelError::Io)?;
            Ok(KernelRun {
                success: true,
                status: "exit status: 0".into(),
                diagnostics: Vec::new(),
            })
        }
    }

    fn session(artifact: &[u8], delay: Duration, timeout_secs: u64) -> KernelSession<ScriptedBackend> {
        let config = ForgeConfig {
            compile_timeout_secs: timeout_secs,
            ..ForgeConfig::default()
        };
        let backend = ScriptedBackend {
            artifact: artifact.to_vec(),
            delay,
        };
        KernelSession::with_backend(backend, &config)
    }

    fn request(source: &str) -> CompileRequest {
        CompileRequest::new(RequestCounter::new().next(), source)
    }

    #[tokio::test]
    async fn test_success_returns_artifact() {
        let session = session(b"solid x", Duration::ZERO, 5);
        let result = session.compile(&request("cube(1);")).await;
        assert_eq!(result.mesh_bytes(), Some(&b"solid x"[..]));
    }

    #[tokio::test]
    async fn test_kernel_failure_keeps_diagnostics() {
        let session = session(b"solid x", Duration::ZERO, 5);
        let result = session.compile(&request("fail(")).await;

        match result {
            CompileResult::Failure { kind, diagnostics } => {
                assert_eq!(kind, FailureKind::Compile);
                assert_eq!(diagnostics.len(), 2);
                assert!(diagnostics[0].contains("line 2"));
                assert!(diagnostics[1].contains("exit status: 1"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_corrected_line_matches_editor_line() {
        let session = session(b"solid x", Duration::ZERO, 5);
        let source = "a = 1;\nb = 2;\nfail(";
        let result = session.compile(&request(source)).await;

        let diagnostics = result.diagnostics();
        assert!(diagnostics[0].contains("line 4"));
        assert_eq!(
            ErrorReporter::default().rewrite(&diagnostics[0], source),
            "ERROR: Parser error, line 3: syntax error"
        );
    }

    #[test]
    fn test_sandbox_script_has_one_header_line() {
        let source = "\ncube(1);\n\n";
        let script = sandbox_script(&request(source));

        let lines: Vec<&str> = script.split('\n').collect();
        assert_eq!(lines.len(), source.split('\n').count() + SCRIPT_HEADER_LINES);
        assert!(lines[0].starts_with("//"));
        assert_eq!(lines[SCRIPT_HEADER_LINES..].join("\n"), source);
    }

    #[tokio::test]
    async fn test_empty_artifact_is_failure() {
        let session = session(b"", Duration::ZERO, 5);
        let result = session.compile(&request("cube(1);")).await;
        assert!(!result.is_success());
        assert!(!result.diagnostics().is_empty());
    }

    #[tokio::test]
    async fn test_timeout() {
        let session = session(b"solid x", Duration::from_secs(30), 1);
        let result = session.compile(&request("cube(1);")).await;

        assert!(matches!(
            result,
            CompileResult::Failure {
                kind: FailureKind::Timeout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_kernel_is_initialization_failure() {
        let config = ForgeConfig {
            openscad_path: "forge-no-such-kernel".into(),
            ..ForgeConfig::default()
        };
        let session = KernelSession::from_config(&config);
        let result = session.compile(&request("cube(1);")).await;

        assert!(matches!(
            result,
            CompileResult::Failure {
                kind: FailureKind::Initialization,
                ..
            }
        ));
    }
}
