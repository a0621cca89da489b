// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! User-facing diagnostics

mod panel;
mod reporter;

pub use panel::{DiagnosticsPanel, NO_ERRORS};
pub use reporter::ErrorReporter;
