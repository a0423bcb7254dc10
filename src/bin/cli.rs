// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Windtunnel CLI
//!
//! Set `RUST_LOG` to control log output, e.g. `RUST_LOG=windtunnel=debug`.
//! Without it, `-v` enables info and `-vv` debug events.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::Vector3;
use std::path::{Path, PathBuf};
use std::time::Instant;
use windtunnel::cli::{init_tracing, Reporter};
use windtunnel::geometry::{
    compute_cutting_plane_area, compute_projected_area_with, cross_section, naive_projected_area,
    normalize_mesh, object_properties, Axis, DecimationParams, Dimensions, PlacementOptions,
};
use windtunnel::io::{find_meshes, load_mesh, save_mesh_obj, Coefficient};
use windtunnel::render::{LogLevel, MeshStyle, RenderOptions, TextStyle, Visualizer};
use windtunnel::simulation::sweep::{
    prepare_sweep, AngleSweep, SweepDataset, SweepFailure, SweepManifest, SweepSample,
    DATASET_FILE,
};
use windtunnel::simulation::{MachineGroup, SimulationSettings};
use windtunnel::tunnel::{WindTunnel, WindTunnelOutputs};
use windtunnel::WindTunnelConfig;

#[derive(Parser)]
#[command(name = "windtunnel")]
#[command(author, version, about = "Virtual wind tunnel mesh preprocessing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./windtunnel.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show mesh statistics and reference quantities
    Info {
        /// Input mesh file (.obj or .stl)
        input: PathBuf,

        /// Print properties as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scale a mesh to fit the envelope and write it as OBJ
    Normalize {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "10")]
        length: f64,

        #[arg(long, default_value = "2")]
        width: f64,

        #[arg(long, default_value = "1")]
        height: f64,
    },

    /// Area of the silhouette seen along an axis
    Area {
        input: PathBuf,

        /// Projection axis (X, Y or Z)
        #[arg(long, default_value = "X")]
        axis: Axis,

        /// Sum projected triangles without merging overlaps
        #[arg(long)]
        naive: bool,
    },

    /// Cross-section area through the bounding-box centre
    Section {
        input: PathBuf,

        /// Plane normal as `x,y,z`
        #[arg(long, value_delimiter = ',', default_values_t = vec![1.0, 0.0, 0.0], allow_hyphen_values = true)]
        normal: Vec<f64>,
    },

    /// Place an object and write a case directory
    Prepare {
        input: PathBuf,

        /// Case directory
        #[arg(short, long)]
        output: PathBuf,

        /// Angle of attack in degrees (rotation about Y)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        aoa: f64,

        #[arg(long)]
        wind_speed: Option<f64>,

        #[arg(long)]
        iterations: Option<u32>,

        /// Machine type such as `c2d-highcpu-32`; sets the subdomain count
        #[arg(long)]
        machine_type: Option<String>,
    },

    /// Prepare one case per angle of attack
    Sweep {
        input: PathBuf,

        /// Root directory for the sweep cases
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        start: Option<f64>,

        #[arg(long)]
        step: Option<f64>,

        #[arg(long)]
        count: Option<usize>,
    },

    /// Prepare one case per mesh file found under a folder
    Batch {
        /// Folder searched recursively for .obj and .stl files
        folder: PathBuf,

        /// Root directory for the cases
        #[arg(short, long)]
        output: PathBuf,

        /// Rotation about Z applied to every object, degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotate_z: f64,
    },

    /// Gather final coefficients from the cases of a finished sweep
    Collect {
        /// Sweep root holding `sweep.json`
        root: PathBuf,
    },

    /// Read force coefficients from a simulation output directory
    Coefficients {
        output_dir: PathBuf,

        /// Also report the history length of one coefficient
        #[arg(long)]
        history: Option<Coefficient>,

        /// Write force_coefficients.json next to the outputs
        #[arg(long)]
        json: bool,
    },

    /// Export the tunnel with an object as glTF/GLB
    Scene {
        /// Object to place in the tunnel
        input: Option<PathBuf>,

        #[arg(short, long, default_value = "scene.glb")]
        output: PathBuf,

        /// Simulation output directory whose coefficients are overlaid
        #[arg(long)]
        outputs: Option<PathBuf>,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        aoa: f64,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<WindTunnelConfig> {
    match path {
        Some(path) => {
            let mut config = WindTunnelConfig::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => WindTunnelConfig::load(),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Info { input, json } => info_command(input, *json, &config),
        Commands::Normalize {
            input,
            output,
            length,
            width,
            height,
        } => normalize_command(input, output, Dimensions::new(*length, *width, *height)?),
        Commands::Area { input, axis, naive } => area_command(input, *axis, *naive, &config),
        Commands::Section { input, normal } => section_command(input, normal),
        Commands::Prepare {
            input,
            output,
            aoa,
            wind_speed,
            iterations,
            machine_type,
        } => {
            let mut settings = config.simulation.clone();
            if let Some(speed) = wind_speed {
                settings.wind_speed_ms = *speed;
            }
            if let Some(iterations) = iterations {
                settings.num_iterations = *iterations;
            }
            if let Some(machine_type) = machine_type {
                settings.machine_group = Some(MachineGroup::new("default", machine_type.clone()));
            }
            prepare_command(input, output, *aoa, &settings, &config)
        }
        Commands::Sweep {
            input,
            output,
            start,
            step,
            count,
        } => {
            let mut sweep = config.sweep;
            if let Some(start) = start {
                sweep.start_degrees = *start;
            }
            if let Some(step) = step {
                sweep.step_degrees = *step;
            }
            if let Some(count) = count {
                sweep.count = *count;
            }
            sweep_command(input, output, &sweep, &config, cli.quiet)
        }
        Commands::Batch {
            folder,
            output,
            rotate_z,
        } => batch_command(folder, output, *rotate_z, &config, cli.quiet),
        Commands::Collect { root } => collect_command(root, cli.quiet),
        Commands::Coefficients {
            output_dir,
            history,
            json,
        } => coefficients_command(output_dir, *history, *json),
        Commands::Scene {
            input,
            output,
            outputs,
            aoa,
        } => scene_command(input.as_deref(), output, outputs.as_deref(), *aoa, &config, cli.verbose),
    }
}

fn decimation(config: &WindTunnelConfig) -> DecimationParams {
    DecimationParams {
        target_cells: config.decimation_cells,
    }
}

fn info_command(input: &Path, json: bool, config: &WindTunnelConfig) -> Result<()> {
    let start = Instant::now();
    let mesh = load_mesh(input)?;
    let properties = object_properties(&mesh, &decimation(config))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&properties)?);
    } else {
        Reporter::report_mesh(&input.display().to_string(), &mesh, start.elapsed());
        properties.print();
    }
    Ok(())
}

fn normalize_command(input: &Path, output: &Path, envelope: Dimensions) -> Result<()> {
    let mesh = load_mesh(input)?;
    let (normalized, factor) = normalize_mesh(&mesh, &envelope)?;
    let normalized = if normalized.is_triangulated() {
        normalized
    } else {
        Reporter::report_warning("input has quad or polygon cells, writing triangles");
        normalized.triangulate()?
    };
    save_mesh_obj(&normalized, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Reporter::success(&format!(
        "Scaled by {:.6} and wrote {}",
        factor,
        output.display()
    ));
    Ok(())
}

fn area_command(input: &Path, axis: Axis, naive: bool, config: &WindTunnelConfig) -> Result<()> {
    let mesh = load_mesh(input)?;
    let start = Instant::now();
    let area = if naive {
        naive_projected_area(&mesh, axis)?
    } else {
        compute_projected_area_with(&mesh, axis, &decimation(config))?
    };
    Reporter::report_area(&input.display().to_string(), &area, start.elapsed());
    Ok(())
}

fn section_command(input: &Path, normal: &[f64]) -> Result<()> {
    if normal.len() != 3 {
        bail!("--normal takes three components, got {}", normal.len());
    }
    let normal = Vector3::new(normal[0], normal[1], normal[2]);
    let mesh = load_mesh(input)?;
    let start = Instant::now();
    let area = compute_cutting_plane_area(&mesh, &normal)?;
    let section = cross_section(&mesh, &mesh.center(), &normal)?;
    Reporter::report_area(&input.display().to_string(), &area, start.elapsed());
    Reporter::report_info(&format!(
        "{} section points, {} segments",
        section.points.len(),
        section.segments.len()
    ));
    Ok(())
}

fn prepare_command(
    input: &Path,
    output: &Path,
    aoa: f64,
    settings: &SimulationSettings,
    config: &WindTunnelConfig,
) -> Result<()> {
    let mut tunnel = WindTunnel::from_config(config)?;
    tunnel.set_object(input, &PlacementOptions::default().with_angle_of_attack(aoa))?;
    let request = tunnel.prepare_case(output, settings)?;
    Reporter::report_case(&request);
    Ok(())
}

fn sweep_command(
    input: &Path,
    output: &Path,
    sweep: &AngleSweep,
    config: &WindTunnelConfig,
    quiet: bool,
) -> Result<()> {
    let tunnel = WindTunnel::from_config(config)?;
    let mesh = load_mesh(input)?;

    let spinner = (!quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_message(format!("Preparing {} cases", sweep.count));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    });

    let cases = prepare_sweep(
        &tunnel,
        &mesh,
        &PlacementOptions::default(),
        sweep,
        &config.simulation,
        output,
    )?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    Reporter::success(&format!(
        "Prepared {} cases under {}",
        cases.len(),
        output.display()
    ));
    Ok(())
}

fn progress_bar(len: usize, quiet: bool) -> Option<ProgressBar> {
    (!quiet).then(|| {
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    })
}

fn batch_command(
    folder: &Path,
    output: &Path,
    rotate_z: f64,
    config: &WindTunnelConfig,
    quiet: bool,
) -> Result<()> {
    let meshes = find_meshes(folder);
    if meshes.is_empty() {
        bail!("no .obj or .stl files found under {}", folder.display());
    }

    let placement = PlacementOptions {
        rotate_z_degrees: rotate_z,
        ..PlacementOptions::default()
    };
    let progress = progress_bar(meshes.len(), quiet);
    let mut prepared = 0;
    for path in &meshes {
        if let Some(pb) = &progress {
            pb.set_message(path.display().to_string());
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "object".to_string());

        let mut tunnel = WindTunnel::from_config(config)?;
        let result = tunnel
            .set_object(path, &placement)
            .and_then(|_| tunnel.prepare_case(output.join(&stem), &config.simulation));
        match result {
            Ok(_) => prepared += 1,
            Err(e) => Reporter::report_warning(&format!("{}: {}", path.display(), e)),
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_with_message("Batch prepared");
    }

    Reporter::success(&format!(
        "Prepared {} of {} cases under {}",
        prepared,
        meshes.len(),
        output.display()
    ));
    Ok(())
}

fn collect_command(root: &Path, quiet: bool) -> Result<()> {
    let manifest = SweepManifest::read(root)?;
    let progress = progress_bar(manifest.cases.len(), quiet);

    let mut dataset = SweepDataset::default();
    for case in &manifest.cases {
        let result = WindTunnelOutputs::open(&case.request.case_dir)
            .and_then(|outputs| outputs.force_coefficients());
        match result {
            Ok(coefficients) => dataset.samples.push(SweepSample {
                angle_of_attack: case.angle_of_attack,
                coefficients,
            }),
            Err(e) => dataset.failures.push(SweepFailure {
                angle_of_attack: case.angle_of_attack,
                task_id: case.request.case_dir.display().to_string(),
                reason: e.to_string(),
            }),
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_with_message("Collection complete");
    }

    let path = root.join(DATASET_FILE);
    dataset.write(&path)?;
    Reporter::report_sweep(&dataset);
    if !dataset.failures.is_empty() {
        Reporter::report_warning(&format!("{} cases had no usable output", dataset.failures.len()));
    }
    println!("{} {}", "Dataset:".bold(), path.display());
    Ok(())
}

fn coefficients_command(output_dir: &Path, history: Option<Coefficient>, json: bool) -> Result<()> {
    let outputs = WindTunnelOutputs::open(output_dir)?;
    let coefficients = outputs.force_coefficients()?;
    Reporter::report_coefficients(&outputs.coefficients_file().display().to_string(), &coefficients);
    Reporter::report_info(&format!("{} time steps", outputs.num_time_steps()?));

    if let Some(coefficient) = history {
        let series = outputs.coefficient_history(coefficient)?;
        Reporter::report_info(&format!("{} history: {} rows", coefficient, series.len()));
    }
    if json {
        let path = outputs.write_force_coefficients_json()?;
        Reporter::success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}

fn scene_command(
    input: Option<&Path>,
    output: &Path,
    outputs: Option<&Path>,
    aoa: f64,
    config: &WindTunnelConfig,
    verbose: u8,
) -> Result<()> {
    let mut tunnel = WindTunnel::from_config(config)?;
    let log_level = match verbose {
        0 => LogLevel::Off,
        1 => LogLevel::Info,
        _ => LogLevel::Debug,
    };
    let mut visualizer = Visualizer::new(*tunnel.walls(), RenderOptions { log_level });

    if let Some(input) = input {
        tunnel.set_object(input, &PlacementOptions::default().with_angle_of_attack(aoa))?;
        if let Some(object) = tunnel.object() {
            visualizer.add_mesh(&object.mesh, MeshStyle::default());
        }
    }
    if let Some(dir) = outputs {
        let coefficients = WindTunnelOutputs::open(dir)?.force_coefficients()?;
        visualizer.add_force_coefficients(&coefficients, TextStyle::default());
    }

    visualizer.export(output)?;
    Reporter::success(&format!("Wrote {}", output.display()));
    Ok(())
}
