// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry kernel invocation
//!
//! A [`KernelSession`] turns one [`CompileRequest`] into one [`CompileResult`]
//! by running a [`KernelBackend`] inside a throwaway sandbox directory.

mod backend;
mod request;
mod session;

pub use backend::{Invocation, KernelBackend, KernelError, KernelRun, OpenScadBackend};
pub use request::{CompileRequest, CompileResult, FailureKind, RequestCounter, RequestId};
pub use session::{sandbox_script, KernelSession, SCRIPT_HEADER_LINES};
