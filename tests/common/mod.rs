// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! In-process kernel used by the integration tests

#![allow(dead_code)]

use forge::geometry::Mesh;
use forge::kernel::{Invocation, KernelBackend, KernelError, KernelRun};
use forge::encode_stl;
use nalgebra::{Point3, Vector3};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Produces one facet per `;` in the script. Any line containing
/// `syntax_error` fails with an OpenSCAD-style parser message naming the
/// line of the sandbox file and its full path.
pub struct FakeKernel {
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
    invocations: AtomicUsize,
}

impl FakeKernel {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Highest number of runs observed in flight at once
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn run(&self, invocation: &Invocation) -> Result<KernelRun, KernelError> {
        let script = std::fs::read_to_string(&invocation.input).map_err(KernelError::Io)?;

        if let Some(index) = script.lines().position(|l| l.contains("syntax_error")) {
            // numbered against the sandbox file, echoing the path it was given
            let path = invocation.input.display();
            return Ok(KernelRun {
                success: false,
                status: "exit status: 1".to_string(),
                diagnostics: vec![format!(
                    "ERROR: Parser error: syntax error in file {}, line {} Can't parse file '{}'!",
                    path,
                    index + 1,
                    path
                )],
            });
        }

        let bytes = encode_stl(&fan(script.matches(';').count().max(1))).map_err(KernelError::Io)?;
        std::fs::write(&invocation.output, bytes).map_err(KernelError::Io)?;

        Ok(KernelRun {
            success: true,
            status: "exit status: 0".to_string(),
            diagnostics: Vec::new(),
        })
    }
}

impl KernelBackend for FakeKernel {
    async fn invoke(&self, invocation: &Invocation) -> Result<KernelRun, KernelError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.invocations.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let result = self.run(invocation);

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// `count` facets fanned over a quarter disc in the XY plane
pub fn fan(count: usize) -> Mesh {
    let mut mesh = Mesh::new();
    let step = std::f32::consts::FRAC_PI_2 / count as f32;
    for i in 0..count {
        let (a, b) = (step * i as f32, step * (i + 1) as f32);
        mesh.push_facet(
            Vector3::z(),
            [
                Point3::origin(),
                Point3::new(a.cos(), a.sin(), 0.0),
                Point3::new(b.cos(), b.sin(), 0.0),
            ],
        );
    }
    mesh
}
