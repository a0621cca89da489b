// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Script file load/save

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a script file verbatim. Line endings and trailing whitespace are kept.
pub fn read_source(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("Failed to read script file: {:?}", path))?;
    String::from_utf8(bytes).with_context(|| format!("Script file is not valid UTF-8: {:?}", path))
}

/// Write a script file verbatim
pub fn write_source(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, text.as_bytes())
        .with_context(|| format!("Failed to write script file: {:?}", path))
}
