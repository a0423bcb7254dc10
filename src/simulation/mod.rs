// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Contract with the remote simulation service
//!
//! The crate prepares case directories and hands them to a
//! [`SimulationService`]. Provisioning, upload, polling and retries all live
//! behind that trait.

pub mod sweep;

use crate::error::{Result, WindTunnelError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Subdomains used when no machine group is given
pub const DEFAULT_SUBDOMAINS: usize = 4;

/// Wind speeds at or above this are outside the incompressible regime
pub const MAX_WIND_SPEED_MS: f64 = 100.0;

/// A group of identical machines the service can run on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineGroup {
    pub name: String,
    /// Cloud machine type, e.g. `c2d-highcpu-32`; the suffix is the vCPU count
    pub machine_type: String,
    pub num_machines: u32,
    pub spot: bool,
}

impl MachineGroup {
    pub fn new(name: impl Into<String>, machine_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            machine_type: machine_type.into(),
            num_machines: 1,
            spot: false,
        }
    }

    pub fn vcpus(&self) -> Result<usize> {
        self.machine_type
            .rsplit('-')
            .next()
            .and_then(|suffix| suffix.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                WindTunnelError::invalid_parameter(
                    "machine_type",
                    format!("`{}` does not end in a vCPU count", self.machine_type),
                )
            })
    }
}

/// Number of domain partitions for parallel meshing and solving: half the
/// vCPUs of the machine type, at least one
pub fn number_of_subdomains(machine_group: Option<&MachineGroup>) -> Result<usize> {
    match machine_group {
        None => Ok(DEFAULT_SUBDOMAINS),
        Some(group) => Ok((group.vcpus()? / 2).max(1)),
    }
}

/// Solver steps run inside a case directory, in order
pub fn openfoam_commands() -> Vec<String> {
    [
        "runApplication surfaceFeatures",
        "runApplication blockMesh",
        "runApplication decomposePar -copyZero",
        "runParallel snappyHexMesh -overwrite",
        "runParallel potentialFoam",
        "runParallel simpleFoam",
        "runApplication reconstructParMesh -constant",
        "runApplication reconstructPar -latestTime",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// Physical and numerical settings of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub wind_speed_ms: f64,
    pub num_iterations: u32,
    pub resolution: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_group: Option<MachineGroup>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            wind_speed_ms: 10.0,
            num_iterations: 100,
            resolution: 3,
            machine_group: None,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.wind_speed_ms > 0.0 && self.wind_speed_ms < MAX_WIND_SPEED_MS) {
            return Err(WindTunnelError::invalid_parameter(
                "wind_speed_ms",
                format!(
                    "{} m/s is outside (0, {}) where incompressible flow holds",
                    self.wind_speed_ms, MAX_WIND_SPEED_MS
                ),
            ));
        }
        if self.num_iterations == 0 {
            return Err(WindTunnelError::invalid_parameter(
                "num_iterations",
                "must be at least 1",
            ));
        }
        if self.resolution == 0 {
            return Err(WindTunnelError::invalid_parameter(
                "resolution",
                "must be at least 1",
            ));
        }
        if let Some(group) = &self.machine_group {
            group.vcpus()?;
        }
        Ok(())
    }
}

/// A prepared case, ready for submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub case_dir: PathBuf,
    pub object_path: PathBuf,
    pub settings: SimulationSettings,
    pub num_subdomains: usize,
    pub commands: Vec<String>,
}

/// Final state of a submitted task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Failed { reason: String },
    Killed,
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success)
    }
}

/// Handle to a task running on the service
pub trait TaskHandle {
    fn id(&self) -> &str;

    /// Block until the task reaches a final state
    fn wait(&self) -> Result<TaskStatus>;

    /// Local directory holding the downloaded outputs
    fn output_dir(&self) -> Result<PathBuf>;
}

/// Remote service that runs prepared cases
pub trait SimulationService {
    type Task: TaskHandle;

    fn submit(&self, request: &SimulationRequest) -> Result<Self::Task>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomains_from_machine_type() {
        assert_eq!(number_of_subdomains(None).unwrap(), 4);
        let group = MachineGroup::new("gpu-pool", "c2d-highcpu-32");
        assert_eq!(number_of_subdomains(Some(&group)).unwrap(), 16);
        let tiny = MachineGroup::new("tiny", "e2-micro-1");
        assert_eq!(number_of_subdomains(Some(&tiny)).unwrap(), 1);
    }

    #[test]
    fn test_machine_type_without_count() {
        let group = MachineGroup::new("bad", "c2d-highcpu");
        assert!(number_of_subdomains(Some(&group)).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_command_list() {
        let commands = openfoam_commands();
        assert_eq!(commands.len(), 8);
        assert_eq!(commands[0], "runApplication surfaceFeatures");
        assert_eq!(commands[7], "runApplication reconstructPar -latestTime");
    }

    #[test]
    fn test_wind_speed_limits() {
        let mut settings = SimulationSettings::default();
        assert!(settings.validate().is_ok());
        settings.wind_speed_ms = 100.0;
        assert!(settings.validate().unwrap_err().is_invalid_parameter());
        settings.wind_speed_ms = 0.0;
        assert!(settings.validate().is_err());
        settings.wind_speed_ms = 99.9;
        settings.num_iterations = 0;
        assert!(settings.validate().is_err());
    }
}
