// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel diagnostic rewriting
//!
//! The kernel numbers lines of its sandbox copy of the script, which carries
//! one header line ahead of the editor text. Reported numbers are mapped back
//! onto the editor buffer by stepping back over blank lines, and every path
//! to the sandbox script is removed from the text.

use crate::config::ForgeConfig;
use crate::kernel::SCRIPT_HEADER_LINES;
use regex::{Captures, Regex};
use std::sync::OnceLock;

static LINE_NUMBER: OnceLock<Regex> = OnceLock::new();

fn line_number() -> &'static Regex {
    LINE_NUMBER.get_or_init(|| Regex::new(r"line (\d+)").expect("line pattern is valid"))
}

/// Patterns matching the sandbox script, with or without a directory
#[derive(Debug, Clone)]
struct FilenamePatterns {
    quoted: Regex,
    in_file: Regex,
    bare: Regex,
}

impl FilenamePatterns {
    fn new(filename: &str) -> Self {
        let name = regex::escape(filename);
        let compile = |pattern: String| Regex::new(&pattern).expect("escaped filename pattern is valid");
        Self {
            // " '/tmp/forge-kernel-x/input.scad'"
            quoted: compile(format!(r"\s?'(?:[^'\s]*/)?{}'", name)),
            // " in file /tmp/forge-kernel-x/input.scad,"
            in_file: compile(format!(r" in file (?:[^\s,']*/)?{},", name)),
            bare: compile(format!(r"(?:[^\s,']*/)?{}", name)),
        }
    }

    fn strip(&self, text: &str) -> String {
        let text = self.quoted.replace_all(text, "");
        let text = self.in_file.replace_all(&text, ",");
        self.bare.replace_all(&text, "").into_owned()
    }
}

/// Rewrites raw kernel diagnostics into editor-relative messages
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    filename: Option<FilenamePatterns>,
    context_lines: usize,
}

impl ErrorReporter {
    pub fn new(virtual_filename: impl Into<String>) -> Self {
        let virtual_filename = virtual_filename.into();
        Self {
            filename: (!virtual_filename.is_empty()).then(|| FilenamePatterns::new(&virtual_filename)),
            context_lines: SCRIPT_HEADER_LINES,
        }
    }

    pub fn from_config(config: &ForgeConfig) -> Self {
        Self::new(config.input_filename.clone())
    }

    /// Map a kernel line number to a 1-indexed editor line.
    ///
    /// The result never falls below line 1 or past the last line of `source`.
    pub fn correct_line(&self, reported: usize, source: &str) -> usize {
        let lines: Vec<&str> = source.split('\n').collect();
        let mut line = reported
            .saturating_sub(self.context_lines)
            .clamp(1, lines.len());

        while line > 1 && lines[line - 1].trim().is_empty() {
            line -= 1;
        }
        line
    }

    /// Rewrite one diagnostic against the source it was produced from
    pub fn rewrite(&self, diagnostic: &str, source: &str) -> String {
        let corrected = line_number().replacen(diagnostic, 1, |caps: &Captures| {
            // too many digits for usize: clamp to the last line
            let reported = caps[1].parse().unwrap_or(usize::MAX);
            format!("line {}", self.correct_line(reported, source))
        });
        match &self.filename {
            Some(patterns) => patterns.strip(&corrected),
            None => corrected.into_owned(),
        }
    }

    /// Rewrite every diagnostic and join them in emission order
    pub fn report(&self, diagnostics: &[String], source: &str) -> String {
        diagnostics
            .iter()
            .map(|d| self.rewrite(d, source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new("input.scad")
    }
}
