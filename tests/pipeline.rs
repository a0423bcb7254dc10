// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Prepare, submit and collect against an in-memory simulation service

use anyhow::Result;
use approx::assert_relative_eq;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use windtunnel::geometry::{PlacementOptions, Primitive};
use windtunnel::io::coefficients_path;
use windtunnel::simulation::sweep::{
    collect_sweep, prepare_sweep, submit_sweep, AngleSweep, SweepManifest, DATASET_FILE,
};
use windtunnel::simulation::{
    SimulationRequest, SimulationService, SimulationSettings, TaskHandle, TaskStatus,
};
use windtunnel::tunnel::{WindTunnel, WindTunnelOutputs, INPUT_FILE};

/// Runs nothing; writes a coefficient table whose drag grows with |angle|
/// and fails every case at `fail_angle`
struct FakeService {
    outputs_root: PathBuf,
    counter: Cell<usize>,
    fail_angle: Option<f64>,
}

struct FakeTask {
    id: String,
    output_dir: PathBuf,
    status: TaskStatus,
}

impl TaskHandle for FakeTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn wait(&self) -> windtunnel::Result<TaskStatus> {
        Ok(self.status.clone())
    }

    fn output_dir(&self) -> windtunnel::Result<PathBuf> {
        Ok(self.output_dir.clone())
    }
}

fn case_angle(case_dir: &Path) -> f64 {
    let input = fs::read_to_string(case_dir.join(INPUT_FILE)).unwrap();
    let descriptor: serde_json::Value = serde_json::from_str(&input).unwrap();
    descriptor["transform"]["rotate_y_degrees"].as_f64().unwrap()
}

impl SimulationService for FakeService {
    type Task = FakeTask;

    fn submit(&self, request: &SimulationRequest) -> windtunnel::Result<FakeTask> {
        assert!(request.object_path.exists());
        let n = self.counter.get();
        self.counter.set(n + 1);
        let id = format!("task-{:03}", n);
        let angle = case_angle(&request.case_dir);

        let output_dir = self.outputs_root.join(&id);
        let table_path = coefficients_path(&output_dir);
        fs::create_dir_all(table_path.parent().unwrap()).unwrap();
        let drag = 0.3 + 0.01 * angle.abs();
        let lift = 0.05 * angle;
        let table = "#\n".repeat(9)
            + &format!(
                "{} 0.01 {} {} {} {}\n",
                request.settings.num_iterations,
                drag,
                lift,
                lift / 2.0,
                lift / 2.0
            );
        fs::write(&table_path, table).unwrap();

        let status = match self.fail_angle {
            Some(fail) if (fail - angle).abs() < 1e-9 => TaskStatus::Failed {
                reason: "solver diverged".to_string(),
            },
            _ => TaskStatus::Success,
        };
        Ok(FakeTask {
            id,
            output_dir,
            status,
        })
    }
}

fn service(root: &Path, fail_angle: Option<f64>) -> FakeService {
    FakeService {
        outputs_root: root.join("outputs"),
        counter: Cell::new(0),
        fail_angle,
    }
}

#[test]
fn test_simulate_renames_case_to_task_id() -> Result<()> {
    let dir = TempDir::new()?;
    let inputs = dir.path().join("inputs");
    let mut tunnel = WindTunnel::default().with_inputs_dir(&inputs);
    tunnel.set_object_mesh(
        Primitive::cuboid(4.0, 1.0, 1.0).to_mesh(),
        &PlacementOptions::default().with_angle_of_attack(5.0),
    )?;

    let service = service(dir.path(), None);
    let submitted = tunnel.simulate(&service, &SimulationSettings::default())?;

    assert_eq!(submitted.case_dir, inputs.join("task-000"));
    assert!(submitted.case_dir.join("constant/triSurface/object.obj").exists());
    assert_relative_eq!(case_angle(&submitted.case_dir), 5.0);

    // Only the renamed case remains
    let entries: Vec<_> = fs::read_dir(&inputs)?.collect();
    assert_eq!(entries.len(), 1);

    assert!(submitted.task.wait()?.is_success());
    let outputs = WindTunnelOutputs::open(submitted.task.output_dir()?)?;
    assert_eq!(outputs.num_time_steps()?, 100);
    assert_relative_eq!(outputs.force_coefficients()?.drag, 0.35, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_sweep_collects_samples_and_failures() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path().join("sweep");
    let tunnel = WindTunnel::default();
    let mesh = Primitive::cuboid(4.0, 1.0, 1.0).to_mesh();
    let sweep = AngleSweep {
        start_degrees: -2.0,
        step_degrees: 1.0,
        count: 5,
    };

    let cases = prepare_sweep(
        &tunnel,
        &mesh,
        &PlacementOptions::default(),
        &sweep,
        &SimulationSettings::default(),
        &root,
    )?;
    assert_eq!(cases.len(), 5);
    let manifest = SweepManifest::read(&root)?;
    assert_eq!(manifest.cases, cases);
    for case in &cases {
        assert_relative_eq!(case_angle(&case.request.case_dir), case.angle_of_attack);
    }

    let service = service(dir.path(), Some(0.0));
    let submitted = submit_sweep(&service, &cases)?;
    let dataset = collect_sweep(&submitted);

    assert_eq!(dataset.samples.len(), 4);
    assert_eq!(dataset.failures.len(), 1);
    assert_relative_eq!(dataset.failures[0].angle_of_attack, 0.0);
    assert!(dataset.failures[0].reason.contains("solver diverged"));

    let at_two = dataset
        .samples
        .iter()
        .find(|s| (s.angle_of_attack - 2.0).abs() < 1e-9)
        .unwrap();
    assert_relative_eq!(at_two.coefficients.drag, 0.32, epsilon = 1e-12);
    assert_relative_eq!(at_two.coefficients.lift, 0.1, epsilon = 1e-12);

    let path = root.join(DATASET_FILE);
    dataset.write(&path)?;
    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(written["samples"].as_array().unwrap().len(), 4);
    assert_eq!(written["samples"][0]["coefficients"]["Front Lift"], -0.05);
    Ok(())
}

#[test]
fn test_fine_sweep_keeps_one_directory_per_angle() -> Result<()> {
    let dir = TempDir::new()?;
    let root = dir.path().join("fine");
    let sweep = AngleSweep {
        start_degrees: 0.0,
        step_degrees: 0.001,
        count: 3,
    };
    let cases = prepare_sweep(
        &WindTunnel::default(),
        &Primitive::cuboid(4.0, 1.0, 1.0).to_mesh(),
        &PlacementOptions::default(),
        &sweep,
        &SimulationSettings::default(),
        &root,
    )?;

    let mut dirs: Vec<&PathBuf> = cases.iter().map(|c| &c.request.case_dir).collect();
    dirs.sort();
    dirs.dedup();
    assert_eq!(dirs.len(), 3);
    for case in &cases {
        assert!(case.request.object_path.exists());
        assert_relative_eq!(
            case_angle(&case.request.case_dir),
            case.angle_of_attack,
            epsilon = 1e-12
        );
    }
    Ok(())
}

/// Rejects every submission
struct RejectingService;

impl SimulationService for RejectingService {
    type Task = FakeTask;

    fn submit(&self, _request: &SimulationRequest) -> windtunnel::Result<FakeTask> {
        Err(windtunnel::WindTunnelError::Task {
            id: "none".to_string(),
            details: "quota exceeded".to_string(),
        })
    }
}

#[test]
fn test_rejected_submission_leaves_no_pending_case() -> Result<()> {
    let dir = TempDir::new()?;
    let inputs = dir.path().join("inputs");
    let mut tunnel = WindTunnel::default().with_inputs_dir(&inputs);
    tunnel.set_object_mesh(
        Primitive::cuboid(4.0, 1.0, 1.0).to_mesh(),
        &PlacementOptions::default(),
    )?;

    let err = match tunnel.simulate(&RejectingService, &SimulationSettings::default()) {
        Ok(_) => panic!("submission should have been rejected"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(fs::read_dir(&inputs)?.count(), 0);
    Ok(())
}

#[test]
fn test_invalid_settings_prepare_nothing() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("sweep");
    let settings = SimulationSettings {
        wind_speed_ms: 120.0,
        ..SimulationSettings::default()
    };
    let err = prepare_sweep(
        &WindTunnel::default(),
        &Primitive::cuboid(1.0, 1.0, 1.0).to_mesh(),
        &PlacementOptions::default(),
        &AngleSweep::default(),
        &settings,
        &root,
    )
    .unwrap_err();
    assert!(err.is_invalid_parameter());
    assert!(!root.exists());
}
