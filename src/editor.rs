// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Editor buffer

use crate::io;
use anyhow::Result;
use std::path::Path;

/// Starter script shown in a fresh editor
pub const STARTER_SOURCE: &str = "cylinder(d1=5,d2=0,h=5,$fn=10);\n";

/// Owned text buffer standing in for the editor widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSession {
    text: String,
}

impl EditorSession {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn get_current_source_text(&self) -> &str {
        &self.text
    }

    /// Replace the whole buffer
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Write the buffer to a script file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        io::write_source(path, &self.text)
    }

    /// Replace the buffer with a script file. On error the buffer is untouched.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.text = io::read_source(path)?;
        Ok(())
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(STARTER_SOURCE)
    }
}
