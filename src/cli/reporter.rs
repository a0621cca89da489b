// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::geometry::BoundingBox;
use colored::*;
use std::path::Path;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report a mesh that reached the viewer
    pub fn report_render(file: &str, triangles: usize, bounds: &BoundingBox, duration: Duration) {
        let size = bounds.size();

        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Rendered:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());
        println!(
            "  {} {}",
            "Triangles:".bright_black(),
            triangles.to_string().cyan()
        );
        println!(
            "  {} {}",
            "Size:".bright_black(),
            format!("{:.3} × {:.3} × {:.3}", size.x, size.y, size.z).cyan()
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report a written STL file
    pub fn report_export(input: &str, output: &Path, bytes: usize, duration: Duration) {
        println!(
            "{} {} -> {} ({}, {})",
            "✅".green(),
            input,
            output.display().to_string().cyan(),
            Self::format_bytes(bytes),
            Self::format_duration(duration).yellow()
        );
    }

    /// Print the diagnostics panel text, one line per diagnostic
    pub fn report_diagnostics(message: &str) {
        for line in message.lines() {
            if line.starts_with("WARNING") {
                eprintln!("  {}", line.yellow());
            } else {
                eprintln!("  {}", line.red());
            }
        }
    }

    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    fn format_bytes(bytes: usize) -> String {
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KiB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
