// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Angle-of-attack sweeps for dataset generation
//!
//! One case per angle: the same object is placed with a different rotation
//! about Y, prepared, submitted and its final coefficients gathered.
//! Preparing cases is independent per angle and runs on the rayon pool.

use super::{SimulationRequest, SimulationService, SimulationSettings, TaskHandle, TaskStatus};
use crate::error::{Result, WindTunnelError};
use crate::geometry::{Mesh, PlacementOptions};
use crate::io::ForceCoefficients;
use crate::tunnel::{WindTunnel, WindTunnelOutputs};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Manifest written next to the prepared cases
pub const SWEEP_MANIFEST: &str = "sweep.json";

/// Collected results file
pub const DATASET_FILE: &str = "dataset.json";

/// Evenly spaced angles of attack, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleSweep {
    pub start_degrees: f64,
    pub step_degrees: f64,
    pub count: usize,
}

impl Default for AngleSweep {
    fn default() -> Self {
        Self {
            start_degrees: -20.0,
            step_degrees: 1.0,
            count: 41,
        }
    }
}

impl AngleSweep {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(WindTunnelError::invalid_parameter("count", "must be at least 1"));
        }
        if !self.start_degrees.is_finite() || !self.step_degrees.is_finite() {
            return Err(WindTunnelError::invalid_parameter(
                "step_degrees",
                "start and step must be finite",
            ));
        }
        Ok(())
    }

    pub fn angles(&self) -> Vec<f64> {
        (0..self.count)
            .map(|i| self.start_degrees + i as f64 * self.step_degrees)
            .collect()
    }
}

/// A prepared case for one angle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepCase {
    pub angle_of_attack: f64,
    pub request: SimulationRequest,
}

/// Contents of `sweep.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepManifest {
    pub created_at: DateTime<Utc>,
    pub sweep: AngleSweep,
    pub cases: Vec<SweepCase>,
}

impl SweepManifest {
    /// Read the manifest of a sweep prepared under `root`
    pub fn read(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join(SWEEP_MANIFEST);
        let content = fs::read_to_string(&path).map_err(|e| WindTunnelError::io(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A submitted case awaiting completion
#[derive(Debug)]
pub struct SubmittedSweepCase<T> {
    pub angle_of_attack: f64,
    pub task: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSample {
    pub angle_of_attack: f64,
    pub coefficients: ForceCoefficients,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub angle_of_attack: f64,
    pub task_id: String,
    pub reason: String,
}

/// Coefficients per angle, with failed angles kept apart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepDataset {
    pub samples: Vec<SweepSample>,
    pub failures: Vec<SweepFailure>,
}

impl SweepDataset {
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| WindTunnelError::io(path, e))?;
        info!(
            path = %path.display(),
            samples = self.samples.len(),
            failures = self.failures.len(),
            "dataset written"
        );
        Ok(())
    }
}

/// Directory of the `index`-th case; the index keeps names unique however
/// finely the angles are spaced
fn case_dir_name(index: usize, angle: f64) -> String {
    format!("aoa_{:03}_{:+}", index, angle)
}

/// Prepare one case per angle under `root`, in parallel.
///
/// `placement` supplies everything except the angle of attack, which each
/// case overrides. A `sweep.json` manifest lists the prepared cases.
pub fn prepare_sweep(
    tunnel: &WindTunnel,
    mesh: &Mesh,
    placement: &PlacementOptions,
    sweep: &AngleSweep,
    settings: &SimulationSettings,
    root: impl AsRef<Path>,
) -> Result<Vec<SweepCase>> {
    let root = root.as_ref();
    sweep.validate()?;
    settings.validate()?;
    fs::create_dir_all(root).map_err(|e| WindTunnelError::io(root, e))?;

    let angles = sweep.angles();
    info!(cases = angles.len(), root = %root.display(), "preparing sweep");

    let cases = angles
        .par_iter()
        .enumerate()
        .map(|(index, &angle)| {
            let mut case_tunnel = tunnel.clone();
            let options = placement.clone().with_angle_of_attack(angle);
            case_tunnel.set_object_mesh(mesh.clone(), &options)?;
            let dir: PathBuf = root.join(case_dir_name(index, angle));
            let request = case_tunnel.prepare_case(&dir, settings)?;
            debug!(angle, case = %dir.display(), "sweep case prepared");
            Ok(SweepCase {
                angle_of_attack: angle,
                request,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let manifest = SweepManifest {
        created_at: Utc::now(),
        sweep: *sweep,
        cases: cases.clone(),
    };
    let manifest_path = root.join(SWEEP_MANIFEST);
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&manifest_path, json).map_err(|e| WindTunnelError::io(&manifest_path, e))?;

    Ok(cases)
}

/// Submit every prepared case; stops at the first rejected submission
pub fn submit_sweep<S: SimulationService>(
    service: &S,
    cases: &[SweepCase],
) -> Result<Vec<SubmittedSweepCase<S::Task>>> {
    cases
        .iter()
        .map(|case| {
            let task = service.submit(&case.request)?;
            debug!(angle = case.angle_of_attack, task = task.id(), "sweep case submitted");
            Ok(SubmittedSweepCase {
                angle_of_attack: case.angle_of_attack,
                task,
            })
        })
        .collect()
}

fn collect_one<T: TaskHandle>(case: &SubmittedSweepCase<T>) -> Result<ForceCoefficients> {
    match case.task.wait()? {
        TaskStatus::Success => WindTunnelOutputs::open(case.task.output_dir()?)?.force_coefficients(),
        TaskStatus::Failed { reason } => Err(WindTunnelError::Task {
            id: case.task.id().to_string(),
            details: reason,
        }),
        TaskStatus::Killed => Err(WindTunnelError::Task {
            id: case.task.id().to_string(),
            details: "killed".to_string(),
        }),
    }
}

/// Wait on every task and gather final coefficients.
///
/// A failed task, or one whose outputs cannot be read, is recorded as a
/// failure and does not stop the collection.
pub fn collect_sweep<T: TaskHandle>(submitted: &[SubmittedSweepCase<T>]) -> SweepDataset {
    let mut dataset = SweepDataset::default();
    for case in submitted {
        match collect_one(case) {
            Ok(coefficients) => dataset.samples.push(SweepSample {
                angle_of_attack: case.angle_of_attack,
                coefficients,
            }),
            Err(e) => {
                warn!(angle = case.angle_of_attack, task = case.task.id(), error = %e, "sweep case failed");
                dataset.failures.push(SweepFailure {
                    angle_of_attack: case.angle_of_attack,
                    task_id: case.task.id().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    info!(
        samples = dataset.samples.len(),
        failures = dataset.failures.len(),
        "sweep collected"
    );
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_angles() {
        let angles = AngleSweep::default().angles();
        assert_eq!(angles.len(), 41);
        assert_eq!(angles[0], -20.0);
        assert_eq!(angles[20], 0.0);
        assert_eq!(angles[40], 20.0);
    }

    #[test]
    fn test_empty_sweep_rejected() {
        let sweep = AngleSweep {
            count: 0,
            ..AngleSweep::default()
        };
        assert!(sweep.validate().unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_case_dir_names_are_distinct() {
        assert_eq!(case_dir_name(0, -20.0), "aoa_000_-20");
        assert_eq!(case_dir_name(20, 0.0), "aoa_020_+0");
        assert_eq!(case_dir_name(3, 0.25), "aoa_003_+0.25");

        let fine = AngleSweep {
            start_degrees: 0.0,
            step_degrees: 0.001,
            count: 3,
        };
        let names: Vec<String> = fine
            .angles()
            .iter()
            .enumerate()
            .map(|(i, &a)| case_dir_name(i, a))
            .collect();
        assert_ne!(names[0], names[1]);
        assert_ne!(names[1], names[2]);
    }
}
