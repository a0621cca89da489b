// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI support for the `forge` binary

pub mod logging;
pub mod reporter;

pub use logging::init_tracing;
pub use reporter::Reporter;
