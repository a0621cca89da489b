// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Single-slot, latest-value-wins hand-off between compiles and frames

use crate::kernel::RequestId;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Kernel output waiting to be displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshBytes {
    pub request: RequestId,
    pub bytes: Vec<u8>,
}

/// Holds at most one undisplayed mesh. Publishing overwrites, draining
/// takes. Neither operation waits on the other side.
#[derive(Debug, Default)]
pub struct RenderQueue {
    slot: Mutex<Option<MeshBytes>>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is pending
    pub fn publish(&self, mesh: MeshBytes) {
        let request = mesh.request;
        let previous = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(mesh);

        if let Some(stale) = previous {
            debug!(superseded = %stale.request, by = %request, "dropping undisplayed mesh");
        }
    }

    /// Take and clear the pending mesh
    pub fn drain(&self) -> Option<MeshBytes> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
