// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Compile requests and results

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic request identifier. Later requests compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues strictly increasing request ids, starting at 1
#[derive(Debug, Default)]
pub struct RequestCounter {
    last: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> RequestId {
        RequestId(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Most recently issued id, if any
    pub fn last(&self) -> Option<RequestId> {
        match self.last.load(Ordering::SeqCst) {
            0 => None,
            n => Some(RequestId(n)),
        }
    }
}

/// Immutable snapshot of editor text submitted for compilation
#[derive(Debug, Clone)]
pub struct CompileRequest {
    id: RequestId,
    source_text: Arc<str>,
}

impl CompileRequest {
    pub fn new(id: RequestId, source_text: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            source_text: source_text.into(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Short SHA-256 prefix of the source, for log correlation
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.source_text.as_bytes());
        format!("{:x}", digest)[..12].to_string()
    }
}

/// Why a compile produced no mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Kernel rejected the source
    Compile,
    /// Sandbox or kernel process could not be started
    Initialization,
    /// Kernel did not finish in time
    Timeout,
}

/// Outcome of exactly one compile request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileResult {
    Success {
        mesh_bytes: Vec<u8>,
    },
    Failure {
        kind: FailureKind,
        /// Raw kernel lines in emission order, never empty
        diagnostics: Vec<String>,
    },
}

impl CompileResult {
    pub fn failure(kind: FailureKind, diagnostics: Vec<String>) -> Self {
        CompileResult::Failure { kind, diagnostics }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CompileResult::Success { .. })
    }

    pub fn mesh_bytes(&self) -> Option<&[u8]> {
        match self {
            CompileResult::Success { mesh_bytes } => Some(mesh_bytes),
            CompileResult::Failure { .. } => None,
        }
    }

    pub fn diagnostics(&self) -> &[String] {
        match self {
            CompileResult::Success { .. } => &[],
            CompileResult::Failure { diagnostics, .. } => diagnostics,
        }
    }
}
