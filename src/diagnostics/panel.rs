// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The single text region showing the latest diagnostic

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shown while nothing has gone wrong
pub const NO_ERRORS: &str = "No errors yet!";

#[derive(Debug)]
struct PanelState {
    message: String,
    alert: Option<String>,
}

/// Latest corrected kernel message plus at most one pending transient alert
#[derive(Debug)]
pub struct DiagnosticsPanel {
    state: Mutex<PanelState>,
}

impl DiagnosticsPanel {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PanelState {
                message: NO_ERRORS.to_string(),
                alert: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the visible message
    pub fn show(&self, message: impl Into<String>) {
        self.lock().message = message.into();
    }

    /// Reset to the no-errors sentinel
    pub fn clear(&self) {
        self.show(NO_ERRORS);
    }

    pub fn message(&self) -> String {
        self.lock().message.clone()
    }

    pub fn has_errors(&self) -> bool {
        self.lock().message != NO_ERRORS
    }

    /// Raise a transient alert; the visible message is left alone
    pub fn alert(&self, message: impl Into<String>) {
        self.lock().alert = Some(message.into());
    }

    /// Take the pending alert, if any
    pub fn take_alert(&self) -> Option<String> {
        self.lock().alert.take()
    }
}

impl Default for DiagnosticsPanel {
    fn default() -> Self {
        Self::new()
    }
}
