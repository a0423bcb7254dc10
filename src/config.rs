// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wind tunnel configuration

use crate::geometry::{Dimensions, DEFAULT_DECIMATION_CELLS};
use crate::simulation::sweep::AngleSweep;
use crate::simulation::SimulationSettings;
use crate::tunnel::RectangularBox;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file, looked up in the working directory
pub const CONFIG_FILE: &str = "windtunnel.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindTunnelConfig {
    /// Cell count above which projected areas use a decimated copy
    pub decimation_cells: usize,
    /// Directory receiving prepared case directories
    pub inputs_dir: PathBuf,
    /// Tunnel box
    pub walls: RectangularBox,
    /// Envelope objects are scaled to fit
    pub envelope: Dimensions,
    pub simulation: SimulationSettings,
    pub sweep: AngleSweep,
}

impl Default for WindTunnelConfig {
    fn default() -> Self {
        Self {
            decimation_cells: DEFAULT_DECIMATION_CELLS,
            inputs_dir: PathBuf::from("inputs"),
            walls: RectangularBox::default(),
            envelope: Dimensions::default(),
            simulation: SimulationSettings::default(),
            sweep: AngleSweep::default(),
        }
    }
}

impl WindTunnelConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: WindTunnelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `windtunnel.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `WINDTUNNEL_*` overrides looked up through `var`
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(speed) = var("WINDTUNNEL_WIND_SPEED") {
            self.simulation.wind_speed_ms = speed
                .parse()
                .with_context(|| format!("WINDTUNNEL_WIND_SPEED is not a number: {}", speed))?;
        }

        if let Some(iterations) = var("WINDTUNNEL_ITERATIONS") {
            self.simulation.num_iterations = iterations
                .parse()
                .with_context(|| format!("WINDTUNNEL_ITERATIONS is not an integer: {}", iterations))?;
        }

        if let Some(resolution) = var("WINDTUNNEL_RESOLUTION") {
            self.simulation.resolution = resolution
                .parse()
                .with_context(|| format!("WINDTUNNEL_RESOLUTION is not an integer: {}", resolution))?;
        }

        if let Some(dir) = var("WINDTUNNEL_INPUTS_DIR") {
            self.inputs_dir = PathBuf::from(dir);
        }

        if let Some(cells) = var("WINDTUNNEL_DECIMATION_CELLS") {
            self.decimation_cells = cells
                .parse()
                .with_context(|| format!("WINDTUNNEL_DECIMATION_CELLS is not an integer: {}", cells))?;
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = WindTunnelConfig::default();
        config.simulation.wind_speed_ms = 25.0;
        config.sweep.count = 5;
        config.save(&path).unwrap();

        let loaded = WindTunnelConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "decimation_cells = 2000\n").unwrap();
        let config = WindTunnelConfig::from_file(&path).unwrap();
        assert_eq!(config.decimation_cells, 2000);
        assert_eq!(config.walls, RectangularBox::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("WINDTUNNEL_WIND_SPEED", "30"),
            ("WINDTUNNEL_ITERATIONS", "500"),
            ("WINDTUNNEL_INPUTS_DIR", "/tmp/cases"),
        ]
        .into_iter()
        .collect();

        let mut config = WindTunnelConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.simulation.wind_speed_ms, 30.0);
        assert_eq!(config.simulation.num_iterations, 500);
        assert_eq!(config.inputs_dir, PathBuf::from("/tmp/cases"));
        assert_eq!(config.simulation.resolution, 3);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut config = WindTunnelConfig::default();
        let err = config
            .apply_overrides(|key| (key == "WINDTUNNEL_ITERATIONS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("WINDTUNNEL_ITERATIONS"));
    }
}
