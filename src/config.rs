// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pipeline configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "forge.toml";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// OpenSCAD executable
    pub openscad_path: String,
    /// Extra arguments passed before `-o`
    pub kernel_args: Vec<String>,
    /// Script name inside the kernel sandbox
    pub input_filename: String,
    /// Artifact name inside the kernel sandbox
    pub output_filename: String,
    /// Default download name for Export
    pub export_filename: String,
    /// Upper bound for a single kernel run
    pub compile_timeout_secs: u64,
    /// Presentation tick period
    pub frame_interval_ms: u64,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            openscad_path: "openscad".to_string(),
            kernel_args: vec!["--enable=manifold".to_string()],
            input_filename: "input.scad".to_string(),
            output_filename: "output.stl".to_string(),
            export_filename: "model.stl".to_string(),
            compile_timeout_secs: 60,
            frame_interval_ms: 16,
        }
    }
}

impl ForgeConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ForgeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `forge.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `FORGE_*` overrides from a variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("FORGE_OPENSCAD_PATH") {
            self.openscad_path = path;
        }

        if let Some(secs) = lookup("FORGE_COMPILE_TIMEOUT_SECS") {
            self.compile_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid FORGE_COMPILE_TIMEOUT_SECS: {}", secs))?;
        }

        if let Some(ms) = lookup("FORGE_FRAME_INTERVAL_MS") {
            self.frame_interval_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("Invalid FORGE_FRAME_INTERVAL_MS: {}", ms))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs.max(1))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ForgeConfig::default();
        assert_eq!(config.input_filename, "input.scad");
        assert_eq!(config.export_filename, "model.stl");
        assert_eq!(config.compile_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let file = NamedTempFile::with_suffix(".toml")?;
        std::fs::write(file.path(), "openscad_path = \"/opt/openscad/bin/openscad\"\n")?;

        let config = ForgeConfig::from_file(file.path())?;
        assert_eq!(config.openscad_path, "/opt/openscad/bin/openscad");
        assert_eq!(config.kernel_args, vec!["--enable=manifold".to_string()]);
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let file = NamedTempFile::with_suffix(".toml")?;
        let mut config = ForgeConfig::default();
        config.frame_interval_ms = 33;

        config.save(file.path())?;
        assert_eq!(ForgeConfig::from_file(file.path())?, config);
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let vars: HashMap<&str, &str> = [
            ("FORGE_OPENSCAD_PATH", "openscad-nightly"),
            ("FORGE_COMPILE_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let mut config = ForgeConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))?;

        assert_eq!(config.openscad_path, "openscad-nightly");
        assert_eq!(config.compile_timeout(), Duration::from_secs(5));
        assert_eq!(config.frame_interval_ms, 16);
        Ok(())
    }

    #[test]
    fn test_frame_interval_override() -> Result<()> {
        let mut config = ForgeConfig::default();
        config.apply_env_overrides(|key| (key == "FORGE_FRAME_INTERVAL_MS").then(|| "40".to_string()))?;
        assert_eq!(config.frame_interval(), Duration::from_millis(40));

        // tokio intervals reject a zero period
        config.frame_interval_ms = 0;
        assert_eq!(config.frame_interval(), Duration::from_millis(1));
        Ok(())
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = ForgeConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "FORGE_FRAME_INTERVAL_MS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }
}
